//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "statscope",
    version,
    about = "Watch live profiling statistics of a program in your browser",
    after_help = "\
EXAMPLES:
    statscope ./my-workload --input data.bin    Run and profile my-workload
    statscope -p 8000 ./my-workload             Serve the report on port 8000
    statscope -f run.ndjson                     View a finished run's sink file"
)]
pub struct Args {
    /// Target program to run under profiling, followed by its arguments
    #[arg(value_name = "PROGRAM", trailing_var_arg = true, allow_hyphen_values = true)]
    pub target: Vec<String>,

    /// The address to listen on
    #[arg(short, long, default_value = "127.0.0.1")]
    pub address: String,

    /// The port to listen on
    #[arg(short, long, default_value_t = 4000)]
    pub port: u16,

    /// Profile sink file to view; when given, no target is launched
    #[arg(short, long, value_name = "FILE", conflicts_with = "target")]
    pub file: Option<PathBuf>,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_arguments_pass_through_verbatim() {
        let args = Args::parse_from(["statscope", "./bin", "--flag", "-x", "value"]);
        assert_eq!(args.target, vec!["./bin", "--flag", "-x", "value"]);
        assert_eq!(args.port, 4000);
        assert_eq!(args.address, "127.0.0.1");
    }

    #[test]
    fn options_before_the_target_are_ours() {
        let args = Args::parse_from(["statscope", "-p", "8000", "./bin"]);
        assert_eq!(args.port, 8000);
        assert_eq!(args.target, vec!["./bin"]);
    }

    #[test]
    fn file_mode_conflicts_with_a_target() {
        assert!(Args::try_parse_from(["statscope", "-f", "run.ndjson", "./bin"]).is_err());
        let args = Args::parse_from(["statscope", "-f", "run.ndjson"]);
        assert_eq!(args.file, Some(PathBuf::from("run.ndjson")));
        assert!(args.target.is_empty());
    }
}
