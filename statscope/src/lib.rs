//! # statscope - Live Profiling Statistics over HTTP
//!
//! statscope runs a target program under in-process profiling
//! instrumentation and serves a textual, hyperlink-navigable report of its
//! call statistics — re-derived from the live data on every page load, so a
//! long-running program's hot paths can be watched while it still executes.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌────────────────────────────┐
//! │   Target Program (child)   │  linked against statscope-runtime
//! │   profile_span! guards     │
//! └─────────────┬──────────────┘
//!               │ RecordBatch NDJSON (sink file)
//!               ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                 statscope (this crate)                  │
//! │                                                         │
//! │  ┌────────┐    ┌────────────────────┐                   │
//! │  │ runner │───▶│ ProfilingDataSource│  sole writer      │
//! │  └────────┘    └─────────┬──────────┘                   │
//! │                          │ snapshot per render          │
//! │                          ▼                              │
//! │  ┌────────────┐   ┌─────────┐   ┌────────┐   ┌───────┐ │
//! │  │ controller │──▶│ session │──▶│ stats  │──▶│format │ │
//! │  └─────┬──────┘   └─────────┘   └────────┘   └───────┘ │
//! │        │ RenderedReport                                 │
//! │        ▼                                                │
//! │  ┌────────────┐                                         │
//! │  │   server   │  axum, GET /?sort&func_name&func_loc    │
//! │  └────────────┘                                         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`runner`]: spawn the target, tail its sink, merge batches (the data
//!   source's only writer)
//! - [`source`]: the shared statistics, read via snapshots
//! - [`stats`]: sorted/restricted fixed-column report text
//! - [`format`]: rewrite report text into hyperlinked HTML-safe fragments
//! - [`query`]: the three-parameter view-request model and link targets
//! - [`session`]: per-request sort/restrict/render pipeline
//! - [`controller`]: view request → RenderedReport
//! - [`server`]: axum route and the result page template
//! - [`preflight`]: target validation before anything starts
//! - [`cli`] / [`domain`]: arguments, core types, error taxonomy
//!
//! ## Operational Modes
//!
//! 1. **Run mode** (default): `statscope ./program args...` — run and watch
//! 2. **File mode** (`-f run.ndjson`): serve a finished run's sink file

// Expose modules for testing
pub mod cli;
pub mod controller;
pub mod domain;
pub mod format;
pub mod preflight;
pub mod query;
pub mod runner;
pub mod server;
pub mod session;
pub mod source;
pub mod stats;
