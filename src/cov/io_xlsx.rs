// Primitives for reading the Excel workbook.

use calamine::{open_workbook, CellErrorType, DataType, Range, Reader, Xlsx};
use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use log::{debug, info};
use snafu::prelude::*;

use crate::cov::{io_common::simplify_file_name, *};

pub const DEFAULT_WORKSHEET: &str = "Consolidação";

/// Reads one worksheet of the workbook, with all the cells converted to text.
pub fn read_consolidation(path: &str, worksheet_name: &str) -> BCovResult<RawSheet> {
    debug!(
        "read_consolidation: path: {:?} worksheet: {:?}",
        path, worksheet_name
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    let available: Vec<String> = workbook.sheet_names().to_vec();
    let wrange = workbook
        .worksheet_range(worksheet_name)
        .context(MissingWorksheetSnafu {
            worksheet: worksheet_name,
            path,
            available,
        })?
        .context(OpeningExcelSnafu { path })?;

    let sheet = range_to_sheet(&wrange);
    info!(
        "read_consolidation: {} rows in worksheet {:?} of {:?}",
        sheet.rows.len(),
        worksheet_name,
        simplify_file_name(path)
    );
    Ok(sheet)
}

/// calamine starts the range at the first used cell. The leading empty
/// columns are added back so that the positions match the sheet.
fn range_to_sheet(wrange: &Range<DataType>) -> RawSheet {
    let col_offset = wrange.start().map(|(_, c)| c as usize).unwrap_or(0);
    let rows = wrange
        .rows()
        .map(|row| {
            let mut cells: Vec<String> = vec![String::new(); col_offset];
            cells.extend(row.iter().map(cell_to_text));
            cells
        })
        .collect();
    RawSheet::new(rows)
}

/// The text of a cell, as the analysts see it in the spreadsheet.
fn cell_to_text(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Empty => String::new(),
        // School codes are stored as numbers.
        DataType::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        DataType::Float(f) => f.to_string(),
        DataType::Int(i) => i.to_string(),
        DataType::Bool(b) => b.to_string().to_uppercase(),
        DataType::DateTime(serial) => match excel_serial_to_datetime(*serial) {
            Some(dt) if dt.num_seconds_from_midnight() == 0 => dt.format("%Y-%m-%d").to_string(),
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => serial.to_string(),
        },
        DataType::Error(e) => localized_error(e).to_string(),
        #[allow(unreachable_patterns)]
        other => format!("{:?}", other),
    }
}

/// Serial numbers in the 1900 date system.
///
/// Excel counts a 1900-02-29 that never existed (serial 60): the serials
/// before it are shifted by one day, and the serial 60 itself has no date.
/// Workbooks in the 1904 date system are read as if they were in the 1900
/// system, since calamine does not report which one is used.
fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(0.0..3_000_000.0).contains(&serial) {
        return None;
    }
    let epoch = if serial < 60.0 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else if serial < 61.0 {
        return None;
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::milliseconds(millis))
}

/// Error cells, as displayed by a spreadsheet in Portuguese.
/// An `#N/A` cell therefore reads as the "#N/D" sentinel.
fn localized_error(e: &CellErrorType) -> &'static str {
    match e {
        CellErrorType::Div0 => "#DIV/0!",
        CellErrorType::NA => "#N/D",
        CellErrorType::Name => "#NOME?",
        CellErrorType::Null => "#NULO!",
        CellErrorType::Num => "#NÚM!",
        CellErrorType::Ref => "#REF!",
        CellErrorType::Value => "#VALOR!",
        CellErrorType::GettingData => "#GETTING_DATA",
    }
}
