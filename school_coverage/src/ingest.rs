use log::{debug, info};

use std::collections::HashSet;

use crate::config::*;

/// Converts a raw sheet into records.
///
/// The header row only matters for its width and for spotting duplicated
/// labels: the fields are read by position, following `mapping`.
/// Rows with empty fields are kept as they are, so that they show up in the
/// aggregates instead of disappearing.
pub fn normalize(
    sheet: &RawSheet,
    mapping: &ColumnMapping,
    sentinels: &SentinelSet,
) -> Result<Vec<Record>, CoverageErrors> {
    let required = mapping.validate()?;

    let mut rows = sheet.rows.iter();
    let header = rows.next().ok_or(FormatError::MissingHeader)?;
    debug!("normalize: header: {:?}", header);

    let kept_columns = distinct_columns(header);
    if kept_columns.len() < header.len() {
        info!(
            "normalize: dropped {} duplicated column(s) from the header",
            header.len() - kept_columns.len()
        );
    }
    if kept_columns.len() < required {
        return Err(FormatError::TooFewColumns {
            found: kept_columns.len(),
            required,
        }
        .into());
    }

    let mut res: Vec<Record> = Vec::with_capacity(sheet.rows.len().saturating_sub(1));
    for (idx, row) in rows.enumerate() {
        let cell = |field: Field| {
            kept_columns
                .get(mapping.position(field))
                .and_then(|src_idx| row.get(*src_idx))
                .map(|s| s.as_str())
                .unwrap_or("")
        };
        let record = Record::new(
            cell(Field::Region),
            cell(Field::Municipality),
            cell(Field::SchoolName),
            cell(Field::SchoolCode),
            cell(Field::DateField),
            sentinels,
        );
        if record.region.is_empty() || record.municipality.is_empty() {
            // Kept on purpose: it will be visible as its own bucket.
            debug!(
                "normalize: row {}: missing region or municipality: {:?}",
                idx + 2,
                record
            );
        }
        res.push(record);
    }
    info!("normalize: {} records read", res.len());
    Ok(res)
}

/// The source positions of the columns that survive after removing the
/// repeated labels. Only the first occurrence of a label is kept; empty
/// labels are never considered duplicates.
fn distinct_columns(header: &[String]) -> Vec<usize> {
    let mut seen: HashSet<String> = HashSet::new();
    header
        .iter()
        .enumerate()
        .filter_map(|(idx, label)| {
            let label = label.trim().to_uppercase();
            if label.is_empty() || seen.insert(label) {
                Some(idx)
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn header() -> Vec<String> {
        row(&["REGIONAL", "MUNICÍPIO", "REDE", "INEP", "ESCOLA", "DATAS"])
    }

    #[test]
    fn maps_columns_by_position() {
        init();
        let sheet = RawSheet::new(vec![
            header(),
            row(&[" GRE-1 ", "Alpha", "ESTADUAL", "E001", "S1 ", "2024-01-01"]),
        ]);
        let records =
            normalize(&sheet, &ColumnMapping::default(), &SentinelSet::default()).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.region, "GRE-1");
        assert_eq!(r.municipality, "Alpha");
        assert_eq!(r.school_code, "E001");
        assert_eq!(r.school_name, "S1");
        assert_eq!(r.date_field, "2024-01-01");
        assert!(r.has_date());
    }

    #[test]
    fn header_labels_are_not_used_for_mapping() {
        init();
        let sheet = RawSheet::new(vec![
            row(&["DATAS", "ESCOLA", "INEP", "X", "MUNICÍPIO", "REGIONAL"]),
            row(&["GRE-1", "Alpha", "", "E001", "S1", "2024-01-01"]),
        ]);
        let records =
            normalize(&sheet, &ColumnMapping::default(), &SentinelSet::default()).unwrap();
        assert_eq!(records[0].region, "GRE-1");
        assert_eq!(records[0].date_field, "2024-01-01");
    }

    #[test]
    fn too_few_columns() {
        init();
        let sheet = RawSheet::new(vec![
            row(&["REGIONAL", "MUNICÍPIO", "REDE", "INEP", "ESCOLA"]),
            row(&["GRE-1", "Alpha", "", "E001", "S1"]),
        ]);
        let res = normalize(&sheet, &ColumnMapping::default(), &SentinelSet::default());
        assert_eq!(
            res,
            Err(CoverageErrors::Format(FormatError::TooFewColumns {
                found: 5,
                required: 6
            }))
        );
    }

    #[test]
    fn empty_sheet_has_no_header() {
        init();
        let res = normalize(
            &RawSheet::default(),
            &ColumnMapping::default(),
            &SentinelSet::default(),
        );
        assert_eq!(res, Err(CoverageErrors::Format(FormatError::MissingHeader)));
    }

    #[test]
    fn header_only_gives_no_records() {
        init();
        let sheet = RawSheet::new(vec![header()]);
        let records =
            normalize(&sheet, &ColumnMapping::default(), &SentinelSet::default()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn duplicated_labels_are_collapsed_before_mapping() {
        init();
        // The second "MUNICÍPIO" column would shift everything by one.
        let sheet = RawSheet::new(vec![
            row(&[
                "REGIONAL",
                "MUNICÍPIO",
                " município ",
                "REDE",
                "INEP",
                "ESCOLA",
                "DATAS",
            ]),
            row(&["GRE-1", "Alpha", "Zeta", "", "E001", "S1", "#N/D"]),
        ]);
        let records =
            normalize(&sheet, &ColumnMapping::default(), &SentinelSet::default()).unwrap();
        let r = &records[0];
        assert_eq!(r.municipality, "Alpha");
        assert_eq!(r.school_code, "E001");
        assert_eq!(r.school_name, "S1");
        assert_eq!(r.date_field, "#N/D");
        assert!(!r.has_date());
    }

    #[test]
    fn duplicates_count_against_the_column_requirement() {
        init();
        let sheet = RawSheet::new(vec![row(&["A", "B", "C", "D", "E", "a"])]);
        let res = normalize(&sheet, &ColumnMapping::default(), &SentinelSet::default());
        assert_eq!(
            res,
            Err(CoverageErrors::Format(FormatError::TooFewColumns {
                found: 5,
                required: 6
            }))
        );
    }

    #[test]
    fn blank_labels_are_not_duplicates() {
        init();
        let sheet = RawSheet::new(vec![
            row(&["REGIONAL", "", "", "", "", ""]),
            row(&["GRE-1", "Alpha", "", "E001", "S1", "x"]),
        ]);
        let records =
            normalize(&sheet, &ColumnMapping::default(), &SentinelSet::default()).unwrap();
        assert_eq!(records[0].school_code, "E001");
    }

    #[test]
    fn short_and_garbled_rows_are_kept() {
        init();
        let sheet = RawSheet::new(vec![
            header(),
            row(&["", "Alpha", "", "E001"]),
            row(&[]),
        ]);
        let records =
            normalize(&sheet, &ColumnMapping::default(), &SentinelSet::default()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].region, "");
        assert_eq!(records[0].school_code, "E001");
        assert_eq!(records[0].school_name, "");
        assert!(!records[0].has_date());
        assert_eq!(
            records[1],
            Record::new("", "", "", "", "", &SentinelSet::default())
        );
    }

    #[test]
    fn same_sheet_gives_same_records() {
        init();
        let sheet = RawSheet::new(vec![
            header(),
            row(&["GRE-2", "Beta", "", "E010", "S10", "None"]),
            row(&["GRE-1", "Alpha", "", "E001", "S1", "2024-01-01"]),
            row(&["GRE-1", "Alpha", "", "E002", "S2", ""]),
        ]);
        let mapping = ColumnMapping::default();
        let sentinels = SentinelSet::default();
        let first = normalize(&sheet, &mapping, &sentinels).unwrap();
        let second = normalize(&sheet, &mapping, &sentinels).unwrap();
        assert_eq!(first, second);
        let codes: Vec<&str> = first.iter().map(|r| r.school_code.as_str()).collect();
        assert_eq!(codes, vec!["E010", "E001", "E002"]);
    }

    #[test]
    fn custom_mapping() {
        init();
        let mapping = ColumnMapping {
            region: 4,
            municipality: 3,
            school_code: 2,
            school_name: 1,
            date_field: 0,
        };
        let sheet = RawSheet::new(vec![
            row(&["d", "n", "c", "m", "r"]),
            row(&["2024-02-02", "S1", "E001", "Alpha", "GRE-1"]),
        ]);
        let records = normalize(&sheet, &mapping, &SentinelSet::default()).unwrap();
        assert_eq!(
            records,
            vec![Record::new(
                "GRE-1",
                "Alpha",
                "S1",
                "E001",
                "2024-02-02",
                &SentinelSet::default()
            )]
        );
    }

    #[test]
    fn overlapping_mapping_is_rejected() {
        init();
        let mapping = ColumnMapping {
            date_field: 0,
            ..ColumnMapping::default()
        };
        let sheet = RawSheet::new(vec![header()]);
        let res = normalize(&sheet, &mapping, &SentinelSet::default());
        assert_eq!(
            res,
            Err(CoverageErrors::Format(FormatError::InvalidMapping {
                field: Field::DateField,
                position: 0
            }))
        );
    }
}
