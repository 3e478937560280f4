//! # statscope - Main Entry Point
//!
//! Two operational modes:
//! - **Run mode** (`statscope ./program args...`): launch the target under
//!   profiling and serve its live statistics
//! - **File mode** (`--file run.ndjson`): serve a finished run's sink file
//!
//! Configuration problems (bad target, bad dump, unusable address) are fatal
//! and reported before anything serves; once the server is up, failures stay
//! contained in the background run or in their request.

use anyhow::Result;
use clap::{CommandFactory, Parser};
use log::debug;
use std::sync::Arc;

use statscope::cli::Args;
use statscope::domain::ConfigError;
use statscope::preflight::resolve_target;
use statscope::runner::{load_dump, ProfileRunner};
use statscope::server::{self, AppState};
use statscope::source::ProfilingDataSource;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            exit_code_for(&e)
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<ConfigError>() {
        Some(
            ConfigError::TargetNotFound(_)
            | ConfigError::NotAFile(_)
            | ConfigError::NotExecutable(_)
            | ConfigError::DumpUnreadable { .. },
        ) => EXIT_USAGE,
        _ => EXIT_ERROR,
    }
}

#[tokio::main]
async fn run() -> Result<()> {
    let args = Args::parse();

    if args.file.is_none() && args.target.is_empty() {
        Args::command().print_help().ok();
        println!();
        std::process::exit(EXIT_USAGE);
    }

    let source = Arc::new(ProfilingDataSource::default());

    let title = if let Some(dump) = &args.file {
        // File mode: everything is merged up front, reports are static.
        load_dump(dump, &source)?;
        dump.display().to_string()
    } else {
        let target = resolve_target(&args.target[0])?;
        let runner = ProfileRunner::launch(&target, &args.target[1..], Arc::clone(&source))?;
        debug!("profile sink at {}", runner.sink_path.display());
        target.display_name
    };

    // Stderr keeps the target's own stdout clean.
    if !args.quiet {
        eprintln!(
            "[statscope]: profile output available at http://{}:{}",
            args.address, args.port
        );
    }

    server::serve(&args.address, args.port, AppState { source, title }).await
}
