// Flat CSV copy of the normalized records, so that a later run does not
// need the original workbook.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::cov::*;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
struct SnapshotRow {
    region: String,
    municipality: String,
    school_code: String,
    school_name: String,
    date_field: String,
    has_date: bool,
}

impl From<&Record> for SnapshotRow {
    fn from(r: &Record) -> Self {
        SnapshotRow {
            region: r.region.clone(),
            municipality: r.municipality.clone(),
            school_code: r.school_code.clone(),
            school_name: r.school_name.clone(),
            date_field: r.date_field.clone(),
            has_date: r.has_date(),
        }
    }
}

pub fn save_snapshot(path: &str, records: &[Record]) -> BCovResult<()> {
    let mut wtr = csv::Writer::from_path(path).context(WritingCsvSnafu { path })?;
    for r in records {
        wtr.serialize(SnapshotRow::from(r))
            .context(WritingCsvSnafu { path })?;
    }
    wtr.flush().context(WritingFileSnafu { path })?;
    debug!("save_snapshot: {} records written to {:?}", records.len(), path);
    Ok(())
}

/// Reads the records back. The `has_date` column is only informative: the
/// flag is derived again from the date with the current sentinels.
pub fn load_snapshot(path: &str, sentinels: &SentinelSet) -> BCovResult<Vec<Record>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .context(ReadingSnapshotSnafu { path })?;

    let mut res: Vec<Record> = Vec::new();
    for (idx, row_r) in rdr.deserialize::<SnapshotRow>().enumerate() {
        let row = row_r.context(ReadingSnapshotSnafu { path })?;
        let r = Record::new(
            &row.region,
            &row.municipality,
            &row.school_name,
            &row.school_code,
            &row.date_field,
            sentinels,
        );
        if r.has_date() != row.has_date {
            warn!(
                "load_snapshot: line {}: stored has_date={} but {:?} gives {}",
                idx + 2,
                row.has_date,
                row.date_field,
                r.has_date()
            );
        }
        res.push(r);
    }
    info!("load_snapshot: {} records read from {:?}", res.len(), path);
    Ok(res)
}
