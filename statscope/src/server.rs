//! HTTP transport and page template.
//!
//! One route: `GET /` with the three optional view parameters. The handler
//! parses the query leniently, asks the controller for a report and wraps
//! it in [`StatsPage`]. Handlers run concurrently; each one works on its own
//! snapshot-backed session, so requests never serialize behind each other
//! or behind the ingest path.

use crate::controller::{self, RenderedReport};
use crate::format;
use crate::query::ViewRequest;
use crate::source::ProfilingDataSource;
use anyhow::Context as _;
use axum::extract::{RawQuery, State};
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use std::fmt::Write as _;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<ProfilingDataSource>,
    /// Shown in the page title: the target program or the dump path.
    pub title: String,
}

#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new().route("/", get(view)).with_state(state)
}

async fn view(State(state): State<AppState>, RawQuery(raw): RawQuery) -> Html<String> {
    let request = ViewRequest::from_query(raw.as_deref().unwrap_or(""));
    let report = controller::handle(&state.source, &request);
    Html(StatsPage { title: &state.title, report: &report }.render())
}

/// Bind and serve until the process exits.
pub async fn serve(address: &str, port: u16, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind((address, port))
        .await
        .with_context(|| format!("cannot listen on {address}:{port}"))?;
    log::info!("listening on http://{address}:{port}");
    axum::serve(listener, router(state)).await.context("server error")
}

/// The result page. One named slot per template hole; the report blocks are
/// already HTML-safe (the formatter escaped them), everything else is
/// escaped here.
pub struct StatsPage<'a> {
    pub title: &'a str,
    pub report: &'a RenderedReport,
}

impl StatsPage<'_> {
    #[must_use]
    pub fn render(&self) -> String {
        let mut body = String::new();
        let _ = writeln!(body, "        <pre>{}</pre>", self.report.stats);
        if let Some(callers) = &self.report.callers {
            let _ = writeln!(body, "\n        <h2>Called By:</h2>\n        <pre>{callers}</pre>");
        }
        if let Some(callees) = &self.report.callees {
            let _ = writeln!(body, "\n        <h2>Called:</h2>\n        <pre>{callees}</pre>");
        }
        let _ = writeln!(body, "\n        <h3>Restrictions applied to get stats listed above:</h3>");
        if self.report.restrictions.is_empty() {
            body.push_str("        None\n");
        } else {
            body.push_str("        <ul>\n");
            for restriction in &self.report.restrictions {
                let _ = writeln!(
                    body,
                    "            <li><pre>{}</pre></li>",
                    format::escape(restriction)
                );
            }
            body.push_str("        </ul>\n");
        }

        format!(
            "<html>\n    <head>\n        <title>{title} | statscope</title>\n    </head>\n    <body>\n{body}    </body>\n</html>",
            title = format::escape(self.title),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statscope_common::{CallCounts, FunctionKey, FunctionRecord, RecordBatch};

    fn state_with_foo() -> AppState {
        let source = ProfilingDataSource::default();
        source.merge(RecordBatch {
            records: vec![FunctionRecord {
                key: FunctionKey::new("mod.rs", 10, "foo"),
                counts: CallCounts { prim_calls: 1, calls: 1, own_time: 0.001, cum_time: 0.002 },
                callers: Vec::new(),
            }],
        });
        AppState { source: Arc::new(source), title: "demo <run>".into() }
    }

    #[tokio::test]
    async fn handler_serves_the_full_report_without_query() {
        let Html(page) = view(State(state_with_foo()), RawQuery(None)).await;
        assert!(page.contains("demo &lt;run&gt; | statscope"));
        assert!(page.contains("(<a href='?func_name=foo'>foo</a>)"));
        assert!(!page.contains("Called By:"));
        assert!(page.contains("Restrictions applied"));
        assert!(page.contains("None"));
    }

    #[tokio::test]
    async fn handler_drills_down_on_func_name() {
        let Html(page) =
            view(State(state_with_foo()), RawQuery(Some("func_name=foo".into()))).await;
        assert!(page.contains("Called By:"));
        assert!(page.contains("Called:"));
        assert!(page.contains("<li><pre>\\(foo\\)</pre></li>"));
    }

    #[tokio::test]
    async fn handler_survives_malformed_queries() {
        let Html(page) =
            view(State(state_with_foo()), RawQuery(Some("sort=bogus&&&=&%%%".into()))).await;
        assert!(page.contains("Ordered by: cumulative time"));
    }

    #[test]
    fn page_lists_restrictions_or_none() {
        let report = RenderedReport {
            stats: String::from("stats"),
            callers: None,
            callees: None,
            restrictions: vec![String::from(r"\(a<b\)")],
        };
        let page = StatsPage { title: "t", report: &report }.render();
        assert!(page.contains(r"<li><pre>\(a&lt;b\)</pre></li>"));
        assert!(!page.contains("None"));
    }
}
