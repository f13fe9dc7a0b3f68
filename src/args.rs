use clap::Parser;

/// This program ranks the participants of a rewards leaderboard by reward efficiency.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file with the settings of the run (thresholds, column names, paths).
    /// Relative paths in this file are resolved against the directory of the file.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path or empty) The leaderboard workbook (.xlsx), one worksheet per period. Setting this option
    /// overrides the path that may be specified with the --config option.
    /// Defaults to Pendle_leaderboard.xlsx next to the executable.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (directory path or empty) The directory in which the CSV reports are written. It is created if missing.
    /// Defaults to 'output' next to the executable.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
