//! Domain model for statscope
//!
//! Core vocabulary types (sort keys, restrictions) and the structured error
//! enums used across the crate.

pub mod errors;
pub mod types;

pub use errors::{ConfigError, IngestError, ReportError};
pub use types::{Restriction, SortKey};

// The function identity travels on the wire and is shared with the runtime.
pub use statscope_common::{CallCounts, FunctionKey};
