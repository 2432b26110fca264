use clap::Parser;

/// This is a survey program: one respondent ranks the suture images, rates the parameters,
/// and the answers are appended to the response sheet.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the survey: texts, items to rank, parameters to rate
    /// and response sheet. If not provided, the built-in suture survey is used.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) The response sheet to append to. Setting this option overrides the path that may be
    /// specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (default csv) The type of the response sheet: csv or jsonl.
    #[clap(long, value_parser)]
    pub out_type: Option<String>,

    /// (file path, optional) A JSON file with the answers of one respondent. If provided, the survey runs
    /// without asking anything on the terminal.
    #[clap(short, long, value_parser)]
    pub answers: Option<String>,

    /// (file path, optional) Checks the rows of an existing response sheet (csv, jsonl or xlsx) instead of
    /// running a session.
    #[clap(long, value_parser)]
    pub audit: Option<String>,

    /// When auditing an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
