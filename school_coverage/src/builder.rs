pub use crate::config::*;

/// A builder for record collections.
///
/// Useful when the records do not come from a spreadsheet. The `has_date`
/// flag is derived the same way as when reading a sheet.
///
/// ```
/// use school_coverage::builder::Builder;
/// use school_coverage::summarize_by_region;
/// # use school_coverage::CoverageErrors;
///
/// let mut builder = Builder::new();
/// builder.add_school("GRE-1", "Alpha", "School 1", "25000001", "2024-05-10");
/// builder.add_school("GRE-1", "Alpha", "School 2", "25000002", "#N/D");
///
/// let regions = summarize_by_region(&builder.build())?;
/// assert_eq!(regions[0].with_date_count, 1);
///
/// # Ok::<(), CoverageErrors>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    pub(crate) _sentinels: SentinelSet,
    pub(crate) _records: Vec<Record>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Replaces the sentinel tokens. Only affects the schools added afterwards.
    pub fn sentinels(self, sentinels: SentinelSet) -> Builder {
        Builder {
            _sentinels: sentinels,
            _records: self._records,
        }
    }

    /// Adds one school. The fields are trimmed.
    pub fn add_school(
        &mut self,
        region: &str,
        municipality: &str,
        school_name: &str,
        school_code: &str,
        date_field: &str,
    ) {
        let r = Record::new(
            region,
            municipality,
            school_name,
            school_code,
            date_field,
            &self._sentinels,
        );
        self._records.push(r);
    }

    pub fn records(&self) -> &[Record] {
        &self._records
    }

    pub fn build(self) -> Vec<Record> {
        self._records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_apply_to_later_schools() {
        let mut b = Builder::new();
        b.add_school("GRE-1", "Alpha", "S1", "E1", "pendente");
        let mut b = b.sentinels(SentinelSet::default().extend(&["PENDENTE"]));
        b.add_school("GRE-1", "Alpha", "S2", "E2", "pendente");
        let flags: Vec<bool> = b.records().iter().map(|r| r.has_date()).collect();
        assert_eq!(flags, vec![true, false]);
    }

    #[test]
    fn fields_are_trimmed() {
        let mut b = Builder::new();
        b.add_school(" GRE-1", "Alpha ", " S1 ", "E1\t", "  ");
        let r = &b.build()[0];
        assert_eq!(r.region, "GRE-1");
        assert_eq!(r.municipality, "Alpha");
        assert_eq!(r.school_name, "S1");
        assert_eq!(r.school_code, "E1");
        assert_eq!(r.date_field, "");
        assert!(!r.has_date());
    }
}
