//! The shared profiling data source.
//!
//! One instance lives for the whole process. The ingest path (see
//! [`crate::runner`]) is its only writer; every report request is a reader.
//! Readers never see the live structure: they take a [`snapshot`] — a clone
//! made under the read lock — and render from that private copy, so a render
//! can never observe a half-merged batch and never blocks the ingest path
//! for longer than the clone.
//!
//! [`snapshot`]: ProfilingDataSource::snapshot

use statscope_common::{CallCounts, FunctionKey, RecordBatch};
use std::collections::HashMap;
use std::sync::RwLock;

/// Accumulated statistics for one function: its own counters plus the
/// counters attributed to each direct caller.
#[derive(Debug, Clone, Default)]
pub struct FunctionStats {
    pub counts: CallCounts,
    pub callers: HashMap<FunctionKey, CallCounts>,
}

/// A coherent point-in-time view of everything collected so far.
#[derive(Debug, Clone, Default)]
pub struct ProfileData {
    pub functions: HashMap<FunctionKey, FunctionStats>,
}

impl ProfileData {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// The one shared mutable resource: an evolving source of truth readable
/// concurrently with writes.
#[derive(Debug, Default)]
pub struct ProfilingDataSource {
    inner: RwLock<ProfileData>,
}

impl ProfilingDataSource {
    /// Fold a batch of deltas in. Sole caller is the ingest path.
    pub fn merge(&self, batch: RecordBatch) {
        let mut data = self.inner.write().unwrap_or_else(|e| e.into_inner());
        for record in batch.records {
            let stats = data.functions.entry(record.key).or_default();
            stats.counts.absorb(&record.counts);
            for (caller, counts) in record.callers {
                stats.callers.entry(caller).or_default().absorb(&counts);
            }
        }
    }

    /// Clone the current state. Stale relative to "now" the moment it
    /// returns, but internally consistent.
    #[must_use]
    pub fn snapshot(&self) -> ProfileData {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of distinct functions seen so far.
    #[must_use]
    pub fn function_count(&self) -> usize {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).functions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statscope_common::FunctionRecord;

    fn key(name: &str) -> FunctionKey {
        FunctionKey::new("mod.rs", 10, name)
    }

    fn batch(name: &str, calls: u64) -> RecordBatch {
        RecordBatch {
            records: vec![FunctionRecord {
                key: key(name),
                counts: CallCounts { prim_calls: calls, calls, own_time: 0.001, cum_time: 0.002 },
                callers: vec![(
                    key("main"),
                    CallCounts { prim_calls: calls, calls, own_time: 0.001, cum_time: 0.002 },
                )],
            }],
        }
    }

    #[test]
    fn merge_accumulates_across_batches() {
        let source = ProfilingDataSource::default();
        source.merge(batch("foo", 1));
        source.merge(batch("foo", 2));

        let data = source.snapshot();
        let foo = &data.functions[&key("foo")];
        assert_eq!(foo.counts.calls, 3);
        assert_eq!(foo.callers[&key("main")].calls, 3);
    }

    #[test]
    fn snapshot_is_isolated_from_later_merges() {
        let source = ProfilingDataSource::default();
        source.merge(batch("foo", 1));
        let before = source.snapshot();
        source.merge(batch("foo", 5));

        assert_eq!(before.functions[&key("foo")].counts.calls, 1);
        assert_eq!(source.snapshot().functions[&key("foo")].counts.calls, 6);
    }

    #[test]
    fn distinct_locations_stay_distinct() {
        let source = ProfilingDataSource::default();
        source.merge(RecordBatch {
            records: vec![
                FunctionRecord {
                    key: FunctionKey::new("a.rs", 1, "f"),
                    counts: CallCounts { calls: 1, prim_calls: 1, ..Default::default() },
                    callers: Vec::new(),
                },
                FunctionRecord {
                    key: FunctionKey::new("b.rs", 1, "f"),
                    counts: CallCounts { calls: 1, prim_calls: 1, ..Default::default() },
                    callers: Vec::new(),
                },
            ],
        });
        assert_eq!(source.function_count(), 2);
    }
}
