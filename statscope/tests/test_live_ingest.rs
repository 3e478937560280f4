//! Checks that the viewer observes a data source that keeps advancing:
//! dump loading, additive merging, and the no-caching guarantee across
//! sequential requests.

use statscope::controller;
use statscope::query::ViewRequest;
use statscope::runner::load_dump;
use statscope::source::ProfilingDataSource;
use statscope_common::{CallCounts, FunctionKey, FunctionRecord, RecordBatch};

fn foo_batch(calls: u64, seconds: f64) -> RecordBatch {
    RecordBatch {
        records: vec![FunctionRecord {
            key: FunctionKey::new("mod.rs", 10, "foo"),
            counts: CallCounts {
                prim_calls: calls,
                calls,
                own_time: seconds,
                cum_time: seconds,
            },
            callers: Vec::new(),
        }],
    }
}

#[test]
fn sequential_requests_observe_the_advancing_source() {
    let source = ProfilingDataSource::default();

    source.merge(foo_batch(1, 0.001));
    let first = controller::handle(&source, &ViewRequest::default());
    assert!(first.stats.contains("1 function calls"));

    // the "background workload" advances between two identical requests
    source.merge(foo_batch(4, 0.004));
    let second = controller::handle(&source, &ViewRequest::default());
    assert!(second.stats.contains("5 function calls"), "no caching across sessions");
    assert_ne!(first.stats, second.stats);
}

#[test]
fn dump_file_round_trips_through_the_report_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let dump = dir.path().join("run.ndjson");
    let lines = [
        serde_json::to_string(&foo_batch(2, 0.002)).unwrap(),
        serde_json::to_string(&foo_batch(3, 0.001)).unwrap(),
    ];
    std::fs::write(&dump, format!("{}\n{}\n", lines[0], lines[1])).unwrap();

    let source = ProfilingDataSource::default();
    load_dump(&dump, &source).unwrap();

    let report = controller::handle(&source, &ViewRequest::default());
    assert!(report.stats.contains("5 function calls"));
    assert!(report.stats.contains("'>foo</a>"));
    assert!(report.stats.contains("in 0.003 seconds"));
}

#[test]
fn caller_edges_accumulate_across_batches() {
    let source = ProfilingDataSource::default();
    let main = FunctionKey::new("src/main.rs", 5, "main");
    let edge_batch = |calls: u64| RecordBatch {
        records: vec![FunctionRecord {
            key: FunctionKey::new("mod.rs", 10, "foo"),
            counts: CallCounts { prim_calls: calls, calls, own_time: 0.001, cum_time: 0.001 },
            callers: vec![(
                main.clone(),
                CallCounts { prim_calls: calls, calls, own_time: 0.001, cum_time: 0.001 },
            )],
        }],
    };
    source.merge(edge_batch(1));
    source.merge(edge_batch(2));

    let report = controller::handle(
        &source,
        &ViewRequest { func_name: Some("foo".into()), ..Default::default() },
    );
    let callers = report.callers.expect("callers block");
    let edge_row = callers
        .lines()
        .find(|l| l.contains("main"))
        .expect("edge row for main");
    assert!(edge_row.contains("3"), "1 + 2 calls merged: {edge_row:?}");
}
