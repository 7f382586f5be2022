// ********* Input data structures ***********

use std::collections::HashSet;
use std::error::Error;
use std::fmt::Display;

/// The tokens that mean "no data" when found in the date column.
///
/// The comparison is done after trimming and upper-casing the cell, so the
/// tokens are stored in that normalized form.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SentinelSet {
    tokens: HashSet<String>,
}

impl SentinelSet {
    pub const DEFAULT_TOKENS: [&'static str; 3] = ["#N/D", "NAN", "NONE"];

    /// Adds more tokens on top of the current ones.
    pub fn extend<S: AsRef<str>>(mut self, extra: &[S]) -> SentinelSet {
        for t in extra {
            let token = normalize_date_cell(t.as_ref());
            if !token.is_empty() {
                self.tokens.insert(token);
            }
        }
        self
    }

    pub fn contains(&self, normalized: &str) -> bool {
        self.tokens.contains(normalized)
    }

    /// Presence detection only: no attempt is made to parse the date.
    pub fn has_date(&self, date_field: &str) -> bool {
        let v = normalize_date_cell(date_field);
        !(v.is_empty() || self.contains(&v))
    }
}

impl Default for SentinelSet {
    fn default() -> Self {
        SentinelSet {
            tokens: SentinelSet::DEFAULT_TOKENS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

pub(crate) fn normalize_date_cell(s: &str) -> String {
    s.trim().to_uppercase()
}

/// The canonical fields of a school row, in the order of the source layout.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Field {
    Region,
    Municipality,
    SchoolCode,
    SchoolName,
    DateField,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Region,
        Field::Municipality,
        Field::SchoolCode,
        Field::SchoolName,
        Field::DateField,
    ];
}

impl Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Field::Region => "region",
            Field::Municipality => "municipality",
            Field::SchoolCode => "school_code",
            Field::SchoolName => "school_name",
            Field::DateField => "date_field",
        };
        write!(f, "{}", s)
    }
}

/// Maps each canonical field to a column position (0-based) in the source sheet.
///
/// The mapping is positional: the labels of the header row are not looked at.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct ColumnMapping {
    pub region: usize,
    pub municipality: usize,
    pub school_code: usize,
    pub school_name: usize,
    pub date_field: usize,
}

impl ColumnMapping {
    /// Layout of the `Consolidação` worksheet: A region, B municipality,
    /// D school code (INEP), E school name, F dates. Column C is ignored.
    pub const CONSOLIDATION: ColumnMapping = ColumnMapping {
        region: 0,
        municipality: 1,
        school_code: 3,
        school_name: 4,
        date_field: 5,
    };

    pub fn position(&self, field: Field) -> usize {
        match field {
            Field::Region => self.region,
            Field::Municipality => self.municipality,
            Field::SchoolCode => self.school_code,
            Field::SchoolName => self.school_name,
            Field::DateField => self.date_field,
        }
    }

    /// Checks that no two fields share a column, and returns the number of
    /// columns a sheet needs to satisfy this mapping.
    pub fn validate(&self) -> Result<usize, FormatError> {
        let mut seen: HashSet<usize> = HashSet::new();
        for field in Field::ALL {
            let position = self.position(field);
            if !seen.insert(position) {
                return Err(FormatError::InvalidMapping { field, position });
            }
        }
        Ok(seen.into_iter().max().unwrap_or(0) + 1)
    }
}

impl Default for ColumnMapping {
    fn default() -> Self {
        ColumnMapping::CONSOLIDATION
    }
}

/// A worksheet whose cells have already been converted to text.
///
/// The first row is the header. Rows may be shorter than the header.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RawSheet {
    pub rows: Vec<Vec<String>>,
}

impl RawSheet {
    pub fn new(rows: Vec<Vec<String>>) -> RawSheet {
        RawSheet { rows }
    }
}

/// One school.
///
/// `has_date` is derived from `date_field` when the record is built and
/// cannot be set on its own.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Record {
    pub region: String,
    pub municipality: String,
    pub school_name: String,
    pub school_code: String,
    pub date_field: String,
    has_date: bool,
}

impl Record {
    pub fn new(
        region: &str,
        municipality: &str,
        school_name: &str,
        school_code: &str,
        date_field: &str,
        sentinels: &SentinelSet,
    ) -> Record {
        Record {
            region: region.trim().to_string(),
            municipality: municipality.trim().to_string(),
            school_name: school_name.trim().to_string(),
            school_code: school_code.trim().to_string(),
            date_field: date_field.trim().to_string(),
            has_date: sentinels.has_date(date_field),
        }
    }

    pub fn has_date(&self) -> bool {
        self.has_date
    }
}

// ******** Output data structures *********

#[derive(PartialEq, Debug, Clone)]
pub struct RegionSummary {
    pub region: String,
    pub total_count: u64,
    pub with_date_count: u64,
    pub without_date_count: u64,
    pub pct_with_date: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct RegionMunicipalitySummary {
    pub region: String,
    pub municipality: String,
    pub total_count: u64,
    pub with_date_count: u64,
    pub without_date_count: u64,
    pub pct_with_date: f64,
    /// The total of the parent region, computed over the same input.
    pub region_total_count: u64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct OverallCoverage {
    pub total_count: u64,
    pub with_date_count: u64,
    pub without_date_count: u64,
    pub pct_with_date: f64,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Situation {
    WithDate,
    WithoutDate,
}

impl Situation {
    pub fn label(&self) -> &'static str {
        match self {
            Situation::WithDate => "WITH DATE",
            Situation::WithoutDate => "WITHOUT DATE",
        }
    }
}

impl Display for Situation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A record as displayed in the drill-down table.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SchoolRow {
    pub region: String,
    pub municipality: String,
    pub school_name: String,
    pub school_code: String,
    pub date_field: String,
    pub has_date: bool,
    pub situation: Situation,
}

/// Completeness bands used to colour a coverage percentage.
///
/// - Low: up to 50%
/// - Medium: up to 80%
/// - High: below 100%
/// - Complete: every school has a date
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum CoverageBand {
    Low,
    Medium,
    High,
    Complete,
}

impl CoverageBand {
    pub fn from_pct(pct: f64) -> CoverageBand {
        if pct <= 50.0 {
            CoverageBand::Low
        } else if pct <= 80.0 {
            CoverageBand::Medium
        } else if pct < 100.0 {
            CoverageBand::High
        } else {
            CoverageBand::Complete
        }
    }
}

impl Display for CoverageBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CoverageBand::Low => "low",
            CoverageBand::Medium => "medium",
            CoverageBand::High => "high",
            CoverageBand::Complete => "complete",
        };
        write!(f, "{}", s)
    }
}

// ********* Errors **********

/// The source sheet does not have the expected layout.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum FormatError {
    /// The sheet has no header row.
    MissingHeader,
    /// Not enough columns (after collapsing duplicated labels) for the mapping.
    TooFewColumns { found: usize, required: usize },
    /// Two fields point at the same column.
    InvalidMapping { field: Field, position: usize },
}

impl Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatError::MissingHeader => write!(f, "the sheet has no header row"),
            FormatError::TooFewColumns { found, required } => write!(
                f,
                "the sheet has {} columns, at least {} are required",
                found, required
            ),
            FormatError::InvalidMapping { field, position } => write!(
                f,
                "column {} is mapped to more than one field (second use: {})",
                position + 1,
                field
            ),
        }
    }
}

impl Error for FormatError {}

/// Errors that prevent a computation from completing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum CoverageErrors {
    Format(FormatError),
    /// No records to aggregate. Callers should treat it as "nothing to display".
    EmptyInput,
}

impl Error for CoverageErrors {}

impl Display for CoverageErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoverageErrors::Format(fe) => write!(f, "format error: {}", fe),
            CoverageErrors::EmptyInput => write!(f, "no records to aggregate"),
        }
    }
}

impl From<FormatError> for CoverageErrors {
    fn from(e: FormatError) -> Self {
        CoverageErrors::Format(e)
    }
}
