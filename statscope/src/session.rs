//! Per-request report sessions.
//!
//! A [`ProfileSession`] binds one view request to the live data source for
//! the duration of a single request. Every render call takes a fresh
//! snapshot, so two renders within the same session can observe different
//! data if the profiled program advanced in between — that is how "still
//! running" visibility works. Nothing is cached across calls.

use crate::domain::{ReportError, Restriction, SortKey};
use crate::format;
use crate::query::ViewRequest;
use crate::source::ProfilingDataSource;
use crate::stats::StatsTable;

pub struct ProfileSession<'a> {
    source: &'a ProfilingDataSource,
    request: &'a ViewRequest,
    sort: SortKey,
}

impl<'a> ProfileSession<'a> {
    #[must_use]
    pub fn new(source: &'a ProfilingDataSource, request: &'a ViewRequest) -> Self {
        Self { source, request, sort: SortKey::default() }
    }

    /// Set the sort key from an external token. An absent or empty token
    /// selects the default; an unknown token leaves the default in place
    /// *and* reports the error, so callers can choose to fall back.
    pub fn sort(&mut self, token: Option<&str>) -> Result<(), ReportError> {
        self.sort = SortKey::default();
        match token {
            None | Some("") => Ok(()),
            Some(token) => {
                self.sort = SortKey::from_token(token)?;
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn sort_key(&self) -> SortKey {
        self.sort
    }

    fn table(&self) -> StatsTable {
        let snapshot = self.source.snapshot();
        let mut table = StatsTable::from_snapshot(&snapshot);
        table.sort_by(self.sort);
        table
    }

    /// The annotated main stats block.
    #[must_use]
    pub fn render(&self, restrictions: &[Restriction]) -> String {
        format::annotate(&self.table().print_stats(restrictions), self.request)
    }

    /// The annotated inbound-edge block.
    #[must_use]
    pub fn render_callers(&self, restrictions: &[Restriction]) -> String {
        format::annotate(&self.table().print_callers(restrictions), self.request)
    }

    /// The annotated outbound-edge block.
    #[must_use]
    pub fn render_callees(&self, restrictions: &[Restriction]) -> String {
        format::annotate(&self.table().print_callees(restrictions), self.request)
    }
}
