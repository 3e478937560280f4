//! Fixed-column statistics tables.
//!
//! [`StatsTable`] turns a [`ProfileData`] snapshot into the three textual
//! blocks the viewer serves: the main stats listing plus the caller/callee
//! edge listings. The output grammar is the classic profiler-report shape —
//! a summary line, an `Ordered by:` line, one `List reduced ...` line per
//! narrowing restriction, then a fixed-column table whose data lines end in
//! `file:line(name)` — which is exactly the grammar the formatter's line
//! parser consumes.
//!
//! Tables are deterministic given the same snapshot and restrictions: entry
//! order is fixed by the sort key with the signature as tie-breaker, and
//! edge lists are ordered by function identity.

// Counter ratios are displayed, not computed on
#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use crate::domain::{Restriction, SortKey};
use crate::source::ProfileData;
use log::warn;
use regex::Regex;
use statscope_common::{CallCounts, FunctionKey};
use std::fmt::Write as _;

/// The recognized function-signature column header.
pub const FUNCTION_SIG_HEADER: &str = "filename:lineno(function)";

struct Entry {
    key: FunctionKey,
    signature: String,
    counts: CallCounts,
    callers: Vec<(FunctionKey, CallCounts)>,
    callees: Vec<(FunctionKey, CallCounts)>,
}

/// One report-building view over a snapshot.
pub struct StatsTable {
    entries: Vec<Entry>,
    total_calls: u64,
    prim_calls: u64,
    total_time: f64,
    sort: SortKey,
}

impl StatsTable {
    #[must_use]
    pub fn from_snapshot(data: &ProfileData) -> Self {
        let mut entries: Vec<Entry> = data
            .functions
            .iter()
            .map(|(key, stats)| {
                let mut callers: Vec<_> =
                    stats.callers.iter().map(|(k, c)| (k.clone(), *c)).collect();
                callers.sort_by(|a, b| a.0.cmp(&b.0));
                Entry {
                    signature: key.signature(),
                    key: key.clone(),
                    counts: stats.counts,
                    callers,
                    callees: Vec::new(),
                }
            })
            .collect();

        // Callee edges are the caller edges seen from the other side.
        let mut callees: std::collections::HashMap<FunctionKey, Vec<(FunctionKey, CallCounts)>> =
            std::collections::HashMap::new();
        for (key, stats) in &data.functions {
            for (caller, counts) in &stats.callers {
                callees.entry(caller.clone()).or_default().push((key.clone(), *counts));
            }
        }
        for entry in &mut entries {
            if let Some(mut list) = callees.remove(&entry.key) {
                list.sort_by(|a, b| a.0.cmp(&b.0));
                entry.callees = list;
            }
        }

        let total_calls = entries.iter().map(|e| e.counts.calls).sum();
        let prim_calls = entries.iter().map(|e| e.counts.prim_calls).sum();
        let total_time = entries.iter().map(|e| e.counts.own_time).sum();

        let mut table =
            Self { entries, total_calls, prim_calls, total_time, sort: SortKey::default() };
        table.sort_by(SortKey::default());
        table
    }

    /// Reorder entries by `key`. Numeric keys sort descending, location
    /// keys ascending; the signature breaks ties so the order is total.
    pub fn sort_by(&mut self, key: SortKey) {
        self.sort = key;
        self.entries.sort_by(|a, b| {
            let primary = match key {
                SortKey::Calls => b.counts.calls.cmp(&a.counts.calls),
                SortKey::Time => b.counts.own_time.total_cmp(&a.counts.own_time),
                SortKey::Cumulative => b.counts.cum_time.total_cmp(&a.counts.cum_time),
                SortKey::Module => a.key.file.cmp(&b.key.file).then(a.key.line.cmp(&b.key.line)),
                SortKey::Nfl => a
                    .key
                    .name
                    .cmp(&b.key.name)
                    .then(a.key.file.cmp(&b.key.file))
                    .then(a.key.line.cmp(&b.key.line)),
            };
            primary.then_with(|| a.signature.cmp(&b.signature))
        });
    }

    /// Apply restrictions in order; returns the surviving entries plus one
    /// `List reduced ...` note per pass that actually narrowed the list.
    fn select(&self, restrictions: &[Restriction]) -> (Vec<&Entry>, Vec<String>) {
        let mut kept: Vec<&Entry> = self.entries.iter().collect();
        let mut notes = Vec::new();
        for restriction in restrictions {
            let before = kept.len();
            match restriction {
                Restriction::Count(n) => kept.truncate(*n),
                Restriction::Fraction(frac) => {
                    let n = (before as f64 * frac + 0.5) as usize;
                    kept.truncate(n.min(before));
                }
                Restriction::Pattern(pat) => match Regex::new(pat) {
                    Ok(re) => kept.retain(|e| re.is_match(&e.signature)),
                    Err(e) => {
                        warn!("unusable restriction pattern {pat:?}: {e}");
                        kept.clear();
                    }
                },
            }
            if kept.len() < before {
                notes.push(format!(
                    "List reduced from {} to {} due to restriction <{}>",
                    before,
                    kept.len(),
                    restriction.repr()
                ));
            }
        }
        (kept, notes)
    }

    fn ordering_block(&self, notes: &[String]) -> String {
        let mut out = format!("   Ordered by: {}\n", self.sort.description());
        for note in notes {
            let _ = writeln!(out, "   {note}");
        }
        out.push('\n');
        out
    }

    /// The main stats listing.
    #[must_use]
    pub fn print_stats(&self, restrictions: &[Restriction]) -> String {
        let (kept, notes) = self.select(restrictions);

        let mut out = format!("         {} function calls ", self.total_calls);
        if self.total_calls != self.prim_calls {
            let _ = write!(out, "({} primitive calls) ", self.prim_calls);
        }
        let _ = writeln!(out, "in {:.3} seconds", self.total_time);
        out.push('\n');
        out.push_str(&self.ordering_block(&notes));

        if !kept.is_empty() {
            let _ = writeln!(
                out,
                "   ncalls  tottime  percall  cumtime  percall {FUNCTION_SIG_HEADER}"
            );
            for entry in kept {
                let c = &entry.counts;
                let _ = writeln!(
                    out,
                    "{:>9} {} {} {} {} {}",
                    c.ncalls_label(),
                    f8(c.own_time),
                    per_call(c.own_time, c.calls),
                    f8(c.cum_time),
                    per_call(c.cum_time, c.prim_calls),
                    entry.signature
                );
            }
            out.push('\n');
        }
        out
    }

    /// The inbound-edge listing: who called each selected function.
    #[must_use]
    pub fn print_callers(&self, restrictions: &[Restriction]) -> String {
        fn callers(e: &Entry) -> &[(FunctionKey, CallCounts)] {
            &e.callers
        }
        self.print_edges(restrictions, "was called by...", "<-", callers)
    }

    /// The outbound-edge listing: what each selected function called.
    #[must_use]
    pub fn print_callees(&self, restrictions: &[Restriction]) -> String {
        fn callees(e: &Entry) -> &[(FunctionKey, CallCounts)] {
            &e.callees
        }
        self.print_edges(restrictions, "called...", "->", callees)
    }

    fn print_edges(
        &self,
        restrictions: &[Restriction],
        column_title: &str,
        arrow: &str,
        edges: fn(&Entry) -> &[(FunctionKey, CallCounts)],
    ) -> String {
        let (kept, notes) = self.select(restrictions);
        let mut out = self.ordering_block(&notes);
        if kept.is_empty() {
            return out;
        }

        let width = kept
            .iter()
            .map(|e| e.signature.len())
            .chain(std::iter::once("Function ".len()))
            .max()
            .unwrap_or(0);

        let _ = writeln!(out, "{:<width$}{column_title}", "Function ");
        let _ = writeln!(out, "{:width$}    ncalls  tottime  cumtime", "");

        for entry in kept {
            let _ = write!(out, "{:<width$}{arrow} ", entry.signature);
            let list = edges(entry);
            if list.is_empty() {
                out.push('\n');
                continue;
            }
            for (i, (key, counts)) in list.iter().enumerate() {
                if i == 0 {
                    let _ = writeln!(
                        out,
                        "{:>7} {} {}  {}",
                        counts.ncalls_label(),
                        f8(counts.own_time),
                        f8(counts.cum_time),
                        key.signature()
                    );
                } else {
                    let _ = writeln!(
                        out,
                        "{:pad$}{:>9} {} {}  {}",
                        "",
                        counts.ncalls_label(),
                        f8(counts.own_time),
                        f8(counts.cum_time),
                        key.signature(),
                        pad = width + 1
                    );
                }
            }
        }
        out.push('\n');
        out
    }
}

fn f8(seconds: f64) -> String {
    format!("{seconds:8.3}")
}

fn per_call(total: f64, divisor: u64) -> String {
    if divisor == 0 {
        " ".repeat(8)
    } else {
        f8(total / divisor as f64)
    }
}

impl Restriction {
    /// How a restriction reads inside a `List reduced ...` note: patterns
    /// quoted, numbers bare.
    #[must_use]
    pub fn repr(&self) -> String {
        match self {
            Restriction::Pattern(pat) => format!("'{pat}'"),
            other => other.to_string(),
        }
    }
}
