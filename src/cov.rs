use log::{debug, info, warn};

use school_coverage::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::cov::config_reader::*;
use crate::cov::io_common::resolve_path;
use crate::cov::report::*;

pub mod config_reader;
mod io_common;
mod io_snapshot;
mod io_xlsx;
mod report;

#[derive(Debug, Snafu)]
pub enum CovError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Worksheet {worksheet:?} not found in {path} (available: {available:?})"))]
    MissingWorksheet {
        worksheet: String,
        path: String,
        available: Vec<String>,
    },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Cannot understand column {value} for field {field}"))]
    ParsingColumn { field: String, value: String },
    #[snafu(display("Error reading snapshot {path}"))]
    ReadingSnapshot { source: csv::Error, path: String },
    #[snafu(display("Error writing {path}"))]
    WritingCsv { source: csv::Error, path: String },
    #[snafu(display("Error writing {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("The sheet cannot be used: {source}"))]
    Coverage { source: CoverageErrors },
    #[snafu(display("Difference detected between computed summary and reference summary"))]
    ReferenceMismatch {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type CovResult<T> = Result<T, CovError>;
pub type BCovResult<T> = Result<T, Box<CovError>>;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum InputType {
    Xlsx,
    Snapshot,
}

fn input_type(declared: Option<&str>, path: &str) -> CovResult<InputType> {
    match declared {
        Some("xlsx") | Some("excel") => Ok(InputType::Xlsx),
        Some("snapshot") | Some("csv") => Ok(InputType::Snapshot),
        Some(x) => whatever!("Input type not implemented {:?}", x),
        None => {
            let ext = Path::new(path)
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase());
            match ext.as_deref() {
                Some("csv") => Ok(InputType::Snapshot),
                _ => Ok(InputType::Xlsx),
            }
        }
    }
}

// Paths given on the command line are taken as they are.
fn input_path(args: &Args, config: &CovConfig, root: Option<&Path>) -> CovResult<String> {
    match (args.input.clone(), config.input_file.as_ref()) {
        (Some(p), _) => Ok(p),
        (None, Some(p)) => Ok(resolve_path(root, p)),
        (None, None) => {
            whatever!("No input file: use --input or the inputFile option of the configuration")
        }
    }
}

/// Everything needed for one run, after merging the command line and the
/// configuration file.
#[derive(Debug, Clone)]
struct RunSettings {
    input: String,
    input_type: InputType,
    worksheet_name: String,
    mapping: ColumnMapping,
    sentinels: SentinelSet,
    region: Option<String>,
    out: Option<String>,
    save_snapshot: Option<String>,
    reference: Option<String>,
    preview_rows: usize,
}

const DEFAULT_PREVIEW_ROWS: usize = 20;

fn settings(args: &Args) -> BCovResult<RunSettings> {
    let (config, root): (CovConfig, Option<PathBuf>) = match args.config.clone() {
        Some(config_path) => {
            let config = read_config(&config_path)?;
            info!("config: {:?}", config);
            let root = Path::new(config_path.as_str())
                .parent()
                .map(|p| p.to_path_buf());
            (config, root)
        }
        None => (CovConfig::default(), None),
    };
    let root_p = root.as_deref();

    let input = input_path(args, &config, root_p)?;
    let declared_type = args.input_type.clone().or(config.input_type.clone());
    let input_type = input_type(declared_type.as_deref(), &input)?;

    let mapping = config.columns.clone().unwrap_or_default().mapping()?;
    let sentinels =
        SentinelSet::default().extend(&config.extra_sentinels.clone().unwrap_or_default());

    Ok(RunSettings {
        input,
        input_type,
        worksheet_name: args
            .excel_worksheet_name
            .clone()
            .or(config.worksheet_name.clone())
            .unwrap_or_else(|| io_xlsx::DEFAULT_WORKSHEET.to_string()),
        mapping,
        sentinels,
        region: args.region.clone().or(config.region.clone()),
        out: args.out.clone().or(config
            .output_directory
            .as_ref()
            .map(|p| resolve_path(root_p, p))),
        save_snapshot: args.save_snapshot.clone().or(config
            .snapshot_file
            .as_ref()
            .map(|p| resolve_path(root_p, p))),
        reference: args.reference.clone(),
        preview_rows: args.preview_rows.unwrap_or(DEFAULT_PREVIEW_ROWS),
    })
}

/// Reads the records, either from the workbook or from a snapshot.
fn read_records(s: &RunSettings) -> BCovResult<Vec<Record>> {
    info!("Attempting to read {:?} ({:?})", s.input, s.input_type);
    match s.input_type {
        InputType::Xlsx => {
            let sheet = io_xlsx::read_consolidation(&s.input, &s.worksheet_name)?;
            let records =
                normalize(&sheet, &s.mapping, &s.sentinels).context(CoverageSnafu {})?;
            Ok(records)
        }
        InputType::Snapshot => io_snapshot::load_snapshot(&s.input, &s.sentinels),
    }
}

pub fn run_report(args: &Args) -> BCovResult<()> {
    let s = settings(args)?;
    debug!("run_report: settings: {:?}", s);

    let records = read_records(&s)?;
    info!("run_report: {} records", records.len());

    if let Some(snapshot_p) = s.save_snapshot.as_ref() {
        // The records are still usable if the snapshot cannot be written.
        match io_snapshot::save_snapshot(snapshot_p, &records) {
            Ok(()) => info!("Snapshot saved to {:?}", snapshot_p),
            Err(e) => warn!("Could not save the snapshot to {:?}: {}", snapshot_p, e),
        }
    }

    let report = match build_report(&records, s.region.as_deref()) {
        Ok(r) => r,
        Err(CoverageErrors::EmptyInput) => {
            match s.region.as_ref() {
                Some(region) => info!("No schools found for region {:?}", region),
                None => info!("No schools found in {:?}", s.input),
            }
            return Ok(());
        }
        Err(e) => return Err(Box::new(CovError::Coverage { source: e })),
    };

    let summary_js = build_summary_js(&s.input, &report);
    let pretty_js_summary =
        serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;

    match s.out.as_deref() {
        Some("stdout") => println!("{}", pretty_js_summary),
        Some(dir) => {
            preview_report(&report, s.preview_rows);
            // Writing the reports is best effort: the counts were computed anyway.
            match write_reports(Path::new(dir), &report, &pretty_js_summary) {
                Ok(paths) => info!("Reports written: {:?}", paths),
                Err(e) => warn!("Could not write the reports to {:?}: {}", dir, e),
            }
        }
        None => preview_report(&report, s.preview_rows),
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = s.reference.as_ref() {
        check_reference(summary_p, &pretty_js_summary)?;
    }

    Ok(())
}

fn read_summary(path: &str) -> BCovResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

fn check_reference(summary_p: &str, pretty_js_summary: &str) -> BCovResult<()> {
    let summary_ref = read_summary(summary_p)?;
    debug!("reference summary: {:?}", summary_ref);
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    // Both sides go through the same parser so that floats compare equal.
    let computed: JSValue =
        serde_json::from_str(pretty_js_summary).context(ParsingJsonSnafu {})?;
    let pretty_js_summary =
        serde_json::to_string_pretty(&computed).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_summary {
        warn!("Found differences with the reference string");
        print_diff(
            pretty_js_summary_ref.as_str(),
            pretty_js_summary.as_str(),
            "\n",
        );
        return ReferenceMismatchSnafu {}.fail().map_err(Box::new);
    }
    info!("The summary matches the reference {:?}", summary_p);
    Ok(())
}
