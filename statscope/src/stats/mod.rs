//! The aggregation engine: sorted, restricted, fixed-column text reports
//! over a profile snapshot.

pub mod table;

pub use table::StatsTable;
