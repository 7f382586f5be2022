use clap::Parser;

/// Reports how many schools have a recorded testing date, by region and municipality.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON configuration file. Command line options take precedence
    /// over its content. See the manual of the school_coverage crate for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) The workbook to read (.xlsx), or a snapshot (.csv) saved by a previous run.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (xlsx or snapshot, default inferred from the file extension) The type of the input.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default Consolidação) The name of the worksheet to read in the workbook.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (region name, optional) Only report on this region.
    #[clap(long, value_parser)]
    pub region: Option<String>,

    /// (directory path, 'stdout' or empty) If specified, the reports are written to this directory
    /// (CSV tables and a JSON summary). With 'stdout', the JSON summary is printed instead.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path, optional) Saves the normalized records as a flat CSV file, which can be read
    /// back later with --input.
    #[clap(long, value_parser)]
    pub save_snapshot: Option<String>,

    /// (file path) A reference file containing a JSON summary. If provided, covreport will
    /// check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (default 20) Number of rows shown for each table in the terminal.
    #[clap(long, value_parser)]
    pub preview_rows: Option<usize>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
