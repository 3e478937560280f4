//! # Shared Wire Types (collector ↔ viewer)
//!
//! Defines the record format shared between `statscope-runtime` (linked into
//! the profiled target, the producer) and `statscope` (the viewer, the
//! consumer), plus the constants both sides must agree on.
//!
//! ## Transport
//!
//! The runtime appends one JSON object per line (NDJSON) to the sink file
//! named by the [`SINK_ENV`] environment variable. Each line is one
//! [`RecordBatch`] holding the *deltas* accumulated since the previous
//! flush; the viewer merges batches additively, so a batch stream and a
//! finished dump file are read identically.
//!
//! ## Key Types
//!
//! - [`FunctionKey`] - identity of a profiled callable (file, line, name)
//! - [`CallCounts`] - additive call/time counters (pstats-style cc/nc/tt/ct)
//! - [`FunctionRecord`] - one function's delta plus its caller edges
//! - [`RecordBatch`] - one flush worth of records

use serde::{Deserialize, Serialize};
use std::fmt;

/// Environment variable naming the sink file the runtime appends to.
///
/// Set by the viewer before spawning the target. When absent, the runtime
/// collects in memory but never performs I/O.
pub const SINK_ENV: &str = "STATSCOPE_SINK";

/// Default interval between runtime flushes, in milliseconds.
///
/// Chosen well below a human page-reload cadence so a refresh observes
/// fresh data, while keeping sink writes negligible next to the workload.
pub const FLUSH_INTERVAL_MS: u64 = 250;

// ============================================================================
// Identity
// ============================================================================

/// Identity of a profiled callable: source file, line, function name.
///
/// Rendered in reports as `file:line(name)`. Equality over all three fields;
/// two functions with the same name at different locations stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FunctionKey {
    pub file: String,
    pub line: u32,
    pub name: String,
}

impl FunctionKey {
    pub fn new(file: impl Into<String>, line: u32, name: impl Into<String>) -> Self {
        Self { file: file.into(), line, name: name.into() }
    }

    /// The `file:line(name)` signature restrictions are matched against.
    #[must_use]
    pub fn signature(&self) -> String {
        self.to_string()
    }

    /// The location portion of the signature (`file:line`), the payload of
    /// a location drill-down link.
    #[must_use]
    pub fn location(&self) -> String {
        format!("{}:{}", self.file, self.line)
    }
}

impl fmt::Display for FunctionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}({})", self.file, self.line, self.name)
    }
}

// ============================================================================
// Counters
// ============================================================================

/// Additive call/time counters for one function (or one caller edge).
///
/// Field meanings follow the classic stats-table convention:
/// - `prim_calls` (cc): primitive calls, i.e. activations that were not
///   nested inside another activation of the same function
/// - `calls` (nc): all calls, recursive included
/// - `own_time` (tt): seconds spent in the function itself, children excluded
/// - `cum_time` (ct): seconds from outermost entry to outermost exit,
///   credited only to primitive activations so recursion is not double-counted
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CallCounts {
    #[serde(rename = "pc")]
    pub prim_calls: u64,
    #[serde(rename = "nc")]
    pub calls: u64,
    #[serde(rename = "tt")]
    pub own_time: f64,
    #[serde(rename = "ct")]
    pub cum_time: f64,
}

impl CallCounts {
    /// Fold another delta into this one. Merging is commutative and
    /// associative, so batch order never matters.
    pub fn absorb(&mut self, other: &CallCounts) {
        self.prim_calls += other.prim_calls;
        self.calls += other.calls;
        self.own_time += other.own_time;
        self.cum_time += other.cum_time;
    }

    /// `nc` or `nc/cc` as printed in the ncalls column.
    #[must_use]
    pub fn ncalls_label(&self) -> String {
        if self.calls == self.prim_calls {
            self.calls.to_string()
        } else {
            format!("{}/{}", self.calls, self.prim_calls)
        }
    }
}

// ============================================================================
// Wire records
// ============================================================================

/// One function's accumulated delta plus its inbound call edges.
///
/// `callers` attributes a share of this function's counts to each direct
/// caller; keys absent from a batch simply contributed nothing during that
/// flush window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionRecord {
    #[serde(flatten)]
    pub key: FunctionKey,
    #[serde(flatten)]
    pub counts: CallCounts,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub callers: Vec<(FunctionKey, CallCounts)>,
}

/// One flush worth of records: a single NDJSON line on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordBatch {
    pub records: Vec<FunctionRecord>,
}

impl RecordBatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
