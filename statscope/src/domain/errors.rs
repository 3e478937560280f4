//! Structured error types for statscope
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! The split mirrors the propagation policy: `ConfigError` is fatal before
//! serving starts, everything else stays contained in its request or in the
//! background ingest path.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal, pre-start configuration problems. Abort startup with a usage or
/// generic error exit code; never raised once the server is up.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("target program not found: {}", .0.display())]
    TargetNotFound(PathBuf),

    #[error("target is not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("target is not executable: {}", .0.display())]
    NotExecutable(PathBuf),

    #[error("failed to launch {}: {source}", .target.display())]
    SpawnFailed { target: PathBuf, source: std::io::Error },

    #[error("cannot create profile sink {}: {source}", .path.display())]
    SinkUnavailable { path: PathBuf, source: std::io::Error },

    #[error("cannot read profile dump {}: {source}", .path.display())]
    DumpUnreadable { path: PathBuf, source: std::io::Error },
}

/// Per-request rendering problems. These fall back to defaults and never
/// turn into an HTTP failure.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ReportError {
    #[error("unrecognized sort key {0:?}")]
    UnknownSortKey(String),
}

/// Background ingest problems. Logged and skipped; the viewer keeps serving
/// whatever was merged before.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed record line: {0}")]
    MalformedLine(#[from] serde_json::Error),
}
