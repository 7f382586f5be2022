// Rendering of the coverage tables: CSV files, JSON summary and terminal previews.

use log::{debug, info};
use serde::Serialize;
use serde_json::{json, Value as JSValue};
use snafu::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

use crate::cov::{io_common::simplify_file_name, *};

/// Everything computed for one run, already in the shape of the output rows.
#[derive(PartialEq, Debug, Clone)]
pub struct CoverageReport {
    pub overall: OverallCoverage,
    pub regions: Vec<RegionRow>,
    pub municipalities: Vec<MunicipalityRow>,
    pub schools: Vec<SchoolTableRow>,
    /// The region the report is restricted to, if any.
    pub region: Option<String>,
}

/// Computes all the tables.
///
/// With a region, the summaries are computed over all the records and then
/// restricted to that region, so that the region totals stay the totals of
/// the full sheet. The overall figures and the schools only cover the region.
pub fn build_report(
    records: &[Record],
    region: Option<&str>,
) -> Result<CoverageReport, CoverageErrors> {
    let filtered: Vec<Record>;
    let selected: &[Record] = match region {
        Some(r) => {
            filtered = filter_region(records, r);
            debug!(
                "build_report: {} of {} records in region {:?}",
                filtered.len(),
                records.len(),
                r
            );
            &filtered
        }
        None => records,
    };

    let overall = overall_coverage(selected)?;
    let schools = project_schools_table(selected)?;
    let regions = summarize_by_region(records)?;
    let municipalities = summarize_by_region_municipality(records)?;
    let region = region.map(|r| r.trim().to_string());
    let in_region = |r: &str| region.as_deref().map_or(true, |x| x == r);

    let regions: Vec<RegionRow> = regions
        .iter()
        .filter(|s| in_region(&s.region))
        .map(RegionRow::from)
        .collect();
    let municipalities: Vec<MunicipalityRow> = municipalities
        .iter()
        .filter(|s| in_region(&s.region))
        .map(MunicipalityRow::from)
        .collect();
    let schools: Vec<SchoolTableRow> = schools.iter().map(SchoolTableRow::from).collect();

    Ok(CoverageReport {
        overall,
        regions,
        municipalities,
        schools,
        region,
    })
}

fn fmt_pct(pct: &f64) -> String {
    format!("{:.1}%", pct)
}

#[derive(PartialEq, Debug, Serialize, Tabled, Clone)]
pub struct RegionRow {
    #[tabled(rename = "Region")]
    pub region: String,
    #[tabled(rename = "Schools")]
    pub total_count: u64,
    #[tabled(rename = "With date")]
    pub with_date_count: u64,
    #[tabled(rename = "Without date")]
    pub without_date_count: u64,
    #[tabled(rename = "% with date", display_with = "fmt_pct")]
    pub pct_with_date: f64,
    #[tabled(rename = "Band")]
    pub band: String,
}

impl From<&RegionSummary> for RegionRow {
    fn from(s: &RegionSummary) -> Self {
        RegionRow {
            region: s.region.clone(),
            total_count: s.total_count,
            with_date_count: s.with_date_count,
            without_date_count: s.without_date_count,
            pct_with_date: s.pct_with_date,
            band: CoverageBand::from_pct(s.pct_with_date).to_string(),
        }
    }
}

#[derive(PartialEq, Debug, Serialize, Tabled, Clone)]
pub struct MunicipalityRow {
    #[tabled(rename = "Region")]
    pub region: String,
    #[tabled(rename = "Municipality")]
    pub municipality: String,
    #[tabled(rename = "Schools")]
    pub total_count: u64,
    #[tabled(rename = "With date")]
    pub with_date_count: u64,
    #[tabled(rename = "Without date")]
    pub without_date_count: u64,
    #[tabled(rename = "% with date", display_with = "fmt_pct")]
    pub pct_with_date: f64,
    #[tabled(rename = "Region schools")]
    pub region_total_count: u64,
    #[tabled(rename = "Band")]
    pub band: String,
}

impl From<&RegionMunicipalitySummary> for MunicipalityRow {
    fn from(s: &RegionMunicipalitySummary) -> Self {
        MunicipalityRow {
            region: s.region.clone(),
            municipality: s.municipality.clone(),
            total_count: s.total_count,
            with_date_count: s.with_date_count,
            without_date_count: s.without_date_count,
            pct_with_date: s.pct_with_date,
            region_total_count: s.region_total_count,
            band: CoverageBand::from_pct(s.pct_with_date).to_string(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Serialize, Tabled, Clone)]
pub struct SchoolTableRow {
    #[tabled(rename = "Region")]
    pub region: String,
    #[tabled(rename = "Municipality")]
    pub municipality: String,
    #[tabled(rename = "School")]
    pub school_name: String,
    #[tabled(rename = "INEP")]
    pub school_code: String,
    #[tabled(rename = "Dates")]
    pub date_field: String,
    #[tabled(skip)]
    pub has_date: bool,
    #[tabled(rename = "Situation")]
    pub situation: String,
}

impl From<&SchoolRow> for SchoolTableRow {
    fn from(s: &SchoolRow) -> Self {
        SchoolTableRow {
            region: s.region.clone(),
            municipality: s.municipality.clone(),
            school_name: s.school_name.clone(),
            school_code: s.school_code.clone(),
            date_field: s.date_field.clone(),
            has_date: s.has_date,
            situation: s.situation.to_string(),
        }
    }
}

fn overall_to_json(o: &OverallCoverage) -> JSValue {
    json!({
        "total_count": o.total_count,
        "with_date_count": o.with_date_count,
        "without_date_count": o.without_date_count,
        "pct_with_date": o.pct_with_date,
        "band": CoverageBand::from_pct(o.pct_with_date).to_string(),
    })
}

/// The JSON summary: the overall figures and the two summaries. The list of
/// schools only goes to the CSV file.
pub fn build_summary_js(input: &str, report: &CoverageReport) -> JSValue {
    json!({
        "source": simplify_file_name(input),
        "region": report.region,
        "overall": overall_to_json(&report.overall),
        "regions": report.regions,
        "municipalities": report.municipalities,
    })
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> BCovResult<()> {
    let path_s = path.display().to_string();
    let mut wtr = csv::Writer::from_path(path).context(WritingCsvSnafu { path: &path_s })?;
    for r in rows {
        wtr.serialize(r).context(WritingCsvSnafu { path: &path_s })?;
    }
    wtr.flush().context(WritingFileSnafu { path: &path_s })?;
    Ok(())
}

pub const REGION_SUMMARY_FILE: &str = "region_summary.csv";
pub const MUNICIPALITY_SUMMARY_FILE: &str = "municipality_summary.csv";
pub const SCHOOLS_FILE: &str = "schools.csv";
pub const SUMMARY_FILE: &str = "summary.json";

/// Writes all the report files to `dir`, which is created if needed.
/// Returns the paths of the files written.
pub fn write_reports(
    dir: &Path,
    report: &CoverageReport,
    pretty_js_summary: &str,
) -> BCovResult<Vec<PathBuf>> {
    fs::create_dir_all(dir).context(WritingFileSnafu {
        path: dir.display().to_string(),
    })?;

    let region_p = dir.join(REGION_SUMMARY_FILE);
    write_csv(&region_p, &report.regions)?;
    let municipality_p = dir.join(MUNICIPALITY_SUMMARY_FILE);
    write_csv(&municipality_p, &report.municipalities)?;
    let schools_p = dir.join(SCHOOLS_FILE);
    write_csv(&schools_p, &report.schools)?;

    let summary_p = dir.join(SUMMARY_FILE);
    fs::write(&summary_p, pretty_js_summary).context(WritingFileSnafu {
        path: summary_p.display().to_string(),
    })?;

    let paths = vec![region_p, municipality_p, schools_p, summary_p];
    debug!("write_reports: {} files in {:?}", paths.len(), dir);
    Ok(paths)
}

/// Shortens the region labels for display: "12ª REGIÃO DE ENSINO" -> "12ª GRE".
/// The files keep the labels of the sheet.
pub fn short_region_label(region: &str) -> String {
    region.replace("REGIÃO DE ENSINO", "GRE")
}

/// The text printed for a table: a note when it is truncated, then the
/// markdown table itself.
fn render_table<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    if rows.is_empty() {
        return "(no rows)".to_string();
    }
    if max_rows == 0 {
        return format!("({} rows not shown)", rows.len());
    }
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    if rows.len() > max_rows {
        format!("({} of {} rows)\n\n{}", max_rows, rows.len(), table_str)
    } else {
        table_str
    }
}

fn preview_table<T>(title: &str, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("\n{}\n", title);
    println!("{}\n", render_table(rows, max_rows));
}

/// Prints the tables to the terminal, at most `max_rows` rows each.
pub fn preview_report(report: &CoverageReport, max_rows: usize) {
    let o = &report.overall;
    info!(
        "{} schools, {} with a date, {} without ({} coverage)",
        o.total_count,
        o.with_date_count,
        o.without_date_count,
        fmt_pct(&o.pct_with_date)
    );
    if let Some(r) = report.region.as_ref() {
        println!("\nRegion: {}", short_region_label(r));
    }
    println!(
        "Coverage: {} of {} schools have a date ({}, {})",
        o.with_date_count,
        o.total_count,
        fmt_pct(&o.pct_with_date),
        CoverageBand::from_pct(o.pct_with_date)
    );

    let regions: Vec<RegionRow> = report
        .regions
        .iter()
        .map(|r| RegionRow {
            region: short_region_label(&r.region),
            ..r.clone()
        })
        .collect();
    preview_table("Coverage by region", &regions, max_rows);
    let municipalities: Vec<MunicipalityRow> = report
        .municipalities
        .iter()
        .map(|m| MunicipalityRow {
            region: short_region_label(&m.region),
            ..m.clone()
        })
        .collect();
    preview_table("Coverage by municipality", &municipalities, max_rows);
    let schools: Vec<SchoolTableRow> = report
        .schools
        .iter()
        .map(|s| SchoolTableRow {
            region: short_region_label(&s.region),
            ..s.clone()
        })
        .collect();
    preview_table("Schools", &schools, max_rows);
}

#[cfg(test)]
mod tests {
    use super::*;
    use school_coverage::builder::Builder;

    fn records() -> Vec<Record> {
        let mut b = Builder::new();
        b.add_school("GRE-1", "Alpha", "S1", "E001", "2024-01-01");
        b.add_school("GRE-1", "Alpha", "S2", "E002", "");
        b.add_school("GRE-1", "Beta", "S3", "E003", "#N/D");
        b.add_school("GRE-2", "Gamma", "S4", "E004", "2024-02-01");
        b.build()
    }

    #[test]
    fn full_report() {
        let report = build_report(&records(), None).unwrap();
        assert_eq!(report.overall.total_count, 4);
        assert_eq!(report.overall.with_date_count, 2);
        assert_eq!(report.regions.len(), 2);
        assert_eq!(report.regions[0].region, "GRE-2");
        assert_eq!(report.municipalities.len(), 3);
        assert_eq!(report.schools.len(), 4);
        assert_eq!(report.region, None);
    }

    #[test]
    fn region_report_keeps_region_totals() {
        let report = build_report(&records(), Some(" GRE-1 ")).unwrap();
        assert_eq!(report.region.as_deref(), Some("GRE-1"));
        assert_eq!(report.overall.total_count, 3);
        assert_eq!(report.regions.len(), 1);
        assert_eq!(report.regions[0].total_count, 3);
        let names: Vec<&str> = report
            .municipalities
            .iter()
            .map(|m| m.municipality.as_str())
            .collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);
        assert!(report.municipalities.iter().all(|m| m.region_total_count == 3));
        assert!(report.schools.iter().all(|s| s.region == "GRE-1"));
    }

    #[test]
    fn unknown_region_is_empty() {
        let res = build_report(&records(), Some("GRE-9"));
        assert_eq!(res, Err(CoverageErrors::EmptyInput));
        assert_eq!(build_report(&[], None), Err(CoverageErrors::EmptyInput));
    }

    #[test]
    fn summary_json() {
        let report = build_report(&records(), None).unwrap();
        let js = build_summary_js("data/avaliacao.xlsx", &report);
        assert_eq!(js["source"], "avaliacao.xlsx");
        assert_eq!(js["region"], JSValue::Null);
        assert_eq!(js["overall"]["total_count"], 4);
        assert_eq!(js["overall"]["pct_with_date"], 50.0);
        assert_eq!(js["overall"]["band"], "low");
        assert_eq!(js["regions"][0]["region"], "GRE-2");
        assert_eq!(js["regions"][0]["band"], "complete");
        assert_eq!(js["municipalities"][0]["municipality"], "Gamma");
        assert_eq!(js["municipalities"][1]["municipality"], "Alpha");
        assert_eq!(js["municipalities"][1]["region_total_count"], 3);
        assert!(js.get("schools").is_none());
    }

    #[test]
    fn school_rows() {
        let report = build_report(&records(), None).unwrap();
        let rows = &report.schools;
        assert_eq!(rows[0].school_name, "S1");
        assert_eq!(rows[0].situation, "WITH DATE");
        assert_eq!(rows[1].situation, "WITHOUT DATE");
    }

    #[test]
    fn percentages() {
        assert_eq!(fmt_pct(&(100.0 / 3.0)), "33.3%");
        assert_eq!(fmt_pct(&100.0), "100.0%");
    }

    #[test]
    fn report_files() {
        let dir = std::env::temp_dir().join(format!("covreport-{}-report", std::process::id()));
        let report = build_report(&records(), None).unwrap();
        let pretty = serde_json::to_string_pretty(&build_summary_js("x.xlsx", &report)).unwrap();
        let paths = write_reports(&dir, &report, &pretty).unwrap();
        assert_eq!(paths.len(), 4);
        assert!(paths.iter().all(|p| p.exists()));

        let regions = fs::read_to_string(dir.join(REGION_SUMMARY_FILE)).unwrap();
        assert_eq!(
            regions.lines().next(),
            Some("region,total_count,with_date_count,without_date_count,pct_with_date,band")
        );
        assert_eq!(regions.lines().count(), 3);
        let schools = fs::read_to_string(dir.join(SCHOOLS_FILE)).unwrap();
        assert_eq!(schools.lines().count(), 5);
        assert_eq!(
            fs::read_to_string(dir.join(SUMMARY_FILE)).unwrap(),
            pretty
        );
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn truncated_and_empty_tables() {
        let report = build_report(&records(), None).unwrap();
        let empty: Vec<RegionRow> = Vec::new();
        assert_eq!(render_table(&empty, 5), "(no rows)");
        assert_eq!(render_table(&empty, 0), "(no rows)");

        let hidden = render_table(&report.schools, 0);
        assert_eq!(hidden, "(4 rows not shown)");
        assert!(!hidden.contains("no rows"));

        let partial = render_table(&report.schools, 1);
        assert!(partial.starts_with("(1 of 4 rows)"));
        assert!(partial.contains("S1"));
        assert!(!partial.contains("S2"));

        let full = render_table(&report.schools, 10);
        assert!(!full.contains(" of 4 rows"));
        assert!(full.contains("S4"));
    }

    #[test]
    fn short_region_labels() {
        assert_eq!(short_region_label("12ª REGIÃO DE ENSINO"), "12ª GRE");
        assert_eq!(short_region_label("GRE-1"), "GRE-1");
        assert_eq!(short_region_label(""), "");
    }

    #[test]
    fn files_keep_the_full_region_label() {
        let mut b = Builder::new();
        b.add_school("1ª REGIÃO DE ENSINO", "Alpha", "S1", "E001", "2024-01-01");
        let report = build_report(&b.build(), None).unwrap();
        let js = build_summary_js("x.xlsx", &report);
        assert_eq!(js["regions"][0]["region"], "1ª REGIÃO DE ENSINO");
        assert_eq!(report.schools[0].region, "1ª REGIÃO DE ENSINO");
    }

    #[test]
    fn previews_do_not_panic() {
        let report = build_report(&records(), Some("GRE-2")).unwrap();
        preview_report(&report, 1);
        preview_report(&report, 0);
    }
}
