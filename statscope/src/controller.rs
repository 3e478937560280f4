//! The report controller: one view request in, one rendered report out.
//!
//! Translates the request's selections into restriction expressions, drives
//! a fresh [`ProfileSession`] and assembles the blocks. Per-request errors
//! are demoted to defaults here — a request never fails outright.

use crate::domain::Restriction;
use crate::query::ViewRequest;
use crate::session::ProfileSession;
use crate::source::ProfilingDataSource;
use log::warn;

/// The composed output for one view request.
#[derive(Debug)]
pub struct RenderedReport {
    /// The annotated main stats block.
    pub stats: String,
    /// Inbound edges of the selected function; present only when a
    /// function name is selected.
    pub callers: Option<String>,
    /// Outbound edges; same presence rule as `callers`.
    pub callees: Option<String>,
    /// The literal restriction expressions that were applied, for display.
    pub restrictions: Vec<String>,
}

/// Build the report for `request` against the current state of `source`.
#[must_use]
pub fn handle(source: &ProfilingDataSource, request: &ViewRequest) -> RenderedReport {
    let mut session = ProfileSession::new(source, request);
    if let Err(e) = session.sort(request.sort.as_deref()) {
        warn!("{e}; using the default sort");
    }

    let restrictions = derive_restrictions(request);

    // Edge blocks only make sense for a selected function.
    let (callers, callees) = if request.func_name.is_some() {
        (
            Some(session.render_callers(&restrictions)),
            Some(session.render_callees(&restrictions)),
        )
    } else {
        (None, None)
    };
    let stats = session.render(&restrictions);

    RenderedReport {
        stats,
        callers,
        callees,
        restrictions: restrictions.iter().map(ToString::to_string).collect(),
    }
}

/// Selections become regex restrictions with all pattern metacharacters in
/// the selected text escaped: the name must match exactly inside the
/// signature's parens, the location literally from the start.
fn derive_restrictions(request: &ViewRequest) -> Vec<Restriction> {
    let mut restrictions = Vec::new();
    if let Some(name) = request.func_name.as_deref() {
        restrictions.push(Restriction::Pattern(format!(r"\({}\)", regex::escape(name))));
    }
    if let Some(loc) = request.func_loc.as_deref() {
        restrictions.push(Restriction::Pattern(format!("^{}", regex::escape(loc))));
    }
    restrictions
}
