use std::path::PathBuf;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "trimode")]
pub struct Options {
    /// The path to the input text. Reads stdin when omitted.
    #[structopt(name = "INPUT-FILE", parse(from_os_str))]
    pub input_file: Option<PathBuf>,

    /// What to do with the input: `parse` prints the match trace,
    /// `roundtrip` parses and regenerates the text from the trace, `check`
    /// parses and then re-validates the trace against the grammar.
    #[structopt(
        short,
        long,
        default_value = "parse",
        possible_values = &["parse", "roundtrip", "check"]
    )]
    pub mode: String,

    /// Print work counters (rule calls, cache hits implied by the
    /// difference, decompositions) after the run.
    #[structopt(short, long)]
    pub stats: bool,
}
