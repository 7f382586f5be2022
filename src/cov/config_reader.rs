use crate::cov::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use std::fs;

/// The position of each field in the source sheet.
/// Each one is either a 1-based column number or an Excel column name ("A", "F", "AB").
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct ColumnsConfig {
    pub region: Option<JSValue>,
    pub municipality: Option<JSValue>,
    #[serde(rename = "schoolCode")]
    pub school_code: Option<JSValue>,
    #[serde(rename = "schoolName")]
    pub school_name: Option<JSValue>,
    #[serde(rename = "dateField")]
    pub date_field: Option<JSValue>,
}

impl ColumnsConfig {
    /// The missing entries keep the layout of the `Consolidação` worksheet.
    pub fn mapping(&self) -> CovResult<ColumnMapping> {
        let d = ColumnMapping::CONSOLIDATION;
        Ok(ColumnMapping {
            region: read_column(Field::Region, &self.region, d.region)?,
            municipality: read_column(Field::Municipality, &self.municipality, d.municipality)?,
            school_code: read_column(Field::SchoolCode, &self.school_code, d.school_code)?,
            school_name: read_column(Field::SchoolName, &self.school_name, d.school_name)?,
            date_field: read_column(Field::DateField, &self.date_field, d.date_field)?,
        })
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct CovConfig {
    #[serde(rename = "inputFile")]
    pub input_file: Option<String>,
    #[serde(rename = "inputType")]
    pub input_type: Option<String>,
    #[serde(rename = "worksheetName")]
    pub worksheet_name: Option<String>,
    pub columns: Option<ColumnsConfig>,
    #[serde(rename = "extraSentinels")]
    pub extra_sentinels: Option<Vec<String>>,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "snapshotFile")]
    pub snapshot_file: Option<String>,
    pub region: Option<String>,
}

pub fn read_config(path: &str) -> BCovResult<CovConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: CovConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

/// Returns the 0-based position of a column.
fn read_column(field: Field, x: &Option<JSValue>, default: usize) -> CovResult<usize> {
    let res = match x {
        None => Some(default),
        Some(JSValue::Number(n)) => n
            .as_u64()
            .filter(|n| *n >= 1)
            .map(|n| (n - 1) as usize),
        // Parsing the Excel-style columns
        Some(JSValue::String(s)) if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()) => {
            excel_column_index(s)
        }
        Some(JSValue::String(s)) => s
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|n| *n >= 1)
            .map(|n| n - 1),
        _ => None,
    };
    res.context(ParsingColumnSnafu {
        field: field.to_string(),
        value: format!("{:?}", x),
    })
}

// "A" -> 0, "Z" -> 25, "AA" -> 26
fn excel_column_index(s: &str) -> Option<usize> {
    let mut acc: usize = 0;
    for c in s.to_ascii_uppercase().chars() {
        let digit = (c as usize) - ('A' as usize) + 1;
        acc = acc.checked_mul(26)?.checked_add(digit)?;
    }
    acc.checked_sub(1)
}
