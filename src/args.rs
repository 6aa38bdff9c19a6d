use clap::Parser;

/// This program turns a campaign attendance roster into one record per participant.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the campaign and the roster.
    /// For more information about the file format, read the documentation of the manual module.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A reference CSV export. If provided, rosterstats will check that the
    /// produced export matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the CSV export will be written to the given
    /// location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the JSON summary of the campaign will be
    /// written to the given location.
    #[clap(short, long, value_parser)]
    pub summary: Option<String>,

    /// (file path or empty) The roster to read. Setting this option overrides the file
    /// that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default xlsx, or csv for .csv files) The type of the input: xlsx, csv or export.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default: the first worksheet) When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (file path, optional) A JSON file with the schedule of each day, keyed by YYYY-MM-DD.
    /// The entries are copied into the calendar of the summary.
    #[clap(long, value_parser)]
    pub schedule: Option<String>,

    /// (default 2025) The year used to compute the ages from the birth years.
    #[clap(long, value_parser)]
    pub reference_year: Option<i32>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
