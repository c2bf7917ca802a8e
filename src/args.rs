use clap::Parser;

/// Tabulates instant-runoff elections from a ranked-choice survey export.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The CSV export produced by the survey tool. Each question is a group of
    /// ranked columns named `<question>: <rank>`; each row is one submission.
    #[clap(value_parser)]
    pub export: String,

    /// (directory) Where the per-question result reports are written.
    #[clap(short, long, value_parser, default_value = "./elections")]
    pub output_dir: String,

    /// If specified, the normalized ballots and the spoiled submission ids of each question are
    /// saved next to the reports.
    #[clap(long, takes_value = false)]
    pub save_ballots: bool,

    /// If specified, a candidate left standing at the end always wins. The default requires the
    /// survivor to hold more than half of all ballots cast; exhausted ballots count as votes of
    /// no confidence.
    #[clap(long, takes_value = false)]
    pub remove_exhausted_ballots: bool,

    /// If specified, a machine-readable JSON summary is written next to each report.
    #[clap(long, takes_value = false)]
    pub json: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
