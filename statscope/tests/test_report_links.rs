//! End-to-end checks over the source → controller → formatter pipeline:
//! every property a link-navigable report must hold.

use statscope::controller;
use statscope::query::ViewRequest;
use statscope::source::ProfilingDataSource;
use statscope_common::{CallCounts, FunctionKey, FunctionRecord, RecordBatch};

fn seeded_source() -> ProfilingDataSource {
    let source = ProfilingDataSource::default();
    let main = FunctionKey::new("src/main.rs", 5, "main");
    let foo = FunctionKey::new("mod.rs", 10, "foo");
    let bar = FunctionKey::new("mod.rs", 20, "bar");
    source.merge(RecordBatch {
        records: vec![
            FunctionRecord {
                key: main.clone(),
                counts: CallCounts { prim_calls: 1, calls: 1, own_time: 0.001, cum_time: 0.009 },
                callers: Vec::new(),
            },
            FunctionRecord {
                key: foo.clone(),
                counts: CallCounts { prim_calls: 2, calls: 2, own_time: 0.002, cum_time: 0.006 },
                callers: vec![(
                    main,
                    CallCounts { prim_calls: 2, calls: 2, own_time: 0.002, cum_time: 0.006 },
                )],
            },
            FunctionRecord {
                key: bar,
                counts: CallCounts { prim_calls: 5, calls: 5, own_time: 0.003, cum_time: 0.004 },
                callers: vec![(
                    foo,
                    CallCounts { prim_calls: 5, calls: 5, own_time: 0.003, cum_time: 0.004 },
                )],
            },
        ],
    });
    source
}

/// The href of the anchor whose visible text is `text`.
fn href_of(html: &str, text: &str) -> Option<String> {
    let close = format!("'>{text}</a>");
    let end = html.find(&close)?;
    let start = html[..end].rfind("<a href='")? + "<a href='".len();
    Some(html[start..end].replace("&amp;", "&"))
}

#[test]
fn every_data_line_carries_a_location_and_a_name_link() {
    let report = controller::handle(&seeded_source(), &ViewRequest::default());
    let data_lines: Vec<&str> =
        report.stats.lines().filter(|l| l.contains("</a>)")).collect();
    assert_eq!(data_lines.len(), 3, "one linked line per function:\n{}", report.stats);
    for line in data_lines {
        assert_eq!(line.matches("<a href=").count(), 2, "location + name on {line:?}");
    }
}

#[test]
fn every_header_token_becomes_a_sort_link() {
    let report = controller::handle(&seeded_source(), &ViewRequest::default());
    for (token, sort) in [
        ("ncalls", "calls"),
        ("tottime", "time"),
        ("cumtime", "cumulative"),
        ("filename", "module"),
        ("lineno", "nfl"),
    ] {
        let href = href_of(&report.stats, token).unwrap_or_else(|| panic!("no link for {token}"));
        assert_eq!(href, format!("?sort={sort}"));
    }
}

#[test]
fn sort_link_round_trips_into_a_sorted_report() {
    let source = seeded_source();
    let first = controller::handle(&source, &ViewRequest::default());
    assert!(first.stats.contains("Ordered by: cumulative time"));

    // Follow the ncalls header link exactly as a browser would.
    let href = href_of(&first.stats, "ncalls").expect("ncalls link");
    let followed = ViewRequest::from_query(href.trim_start_matches('?'));
    let second = controller::handle(&source, &followed);

    assert!(second.stats.contains("Ordered by: call count"));
    assert!(second.restrictions.is_empty(), "restriction set unchanged");
    let bar = second.stats.find("'>bar</a>").unwrap();
    let main = second.stats.find("'>main</a>").unwrap();
    assert!(bar < main, "bar has the most calls");

    // Idempotence: the same link rebuilt from the followed request is identical.
    assert_eq!(href_of(&second.stats, "ncalls").unwrap(), href);
}

#[test]
fn drill_down_link_round_trips_into_a_restricted_report() {
    let source = seeded_source();
    let first = controller::handle(&source, &ViewRequest::default());

    let href = href_of(&first.stats, "foo").expect("foo name link");
    assert_eq!(href, "?func_name=foo");
    let followed = ViewRequest::from_query(href.trim_start_matches('?'));
    let second = controller::handle(&source, &followed);

    assert!(second.stats.contains("'>foo</a>"));
    assert!(!second.stats.contains("'>bar</a>"));
    assert_eq!(second.restrictions, vec![r"\(foo\)"]);
    let callers = second.callers.expect("drill-down adds callers");
    assert!(callers.contains("main"), "foo is called by main:\n{callers}");
    let callees = second.callees.expect("drill-down adds callees");
    assert!(callees.contains("bar"), "foo calls bar:\n{callees}");
}

#[test]
fn location_link_selects_name_and_location() {
    let source = seeded_source();
    let first = controller::handle(&source, &ViewRequest::default());

    let href = href_of(&first.stats, "mod.rs:10").expect("location link");
    assert_eq!(href, "?func_name=foo&func_loc=mod.rs%3A10");
    let followed = ViewRequest::from_query(href.trim_start_matches('?'));
    let second = controller::handle(&source, &followed);

    assert_eq!(
        second.restrictions,
        vec![r"\(foo\)".to_owned(), r"^mod\.rs:10".to_owned()],
        "name and location apply as successive narrowing passes"
    );
    assert!(second.stats.contains("'>foo</a>"));
    assert!(!second.stats.contains("'>bar</a>"));
}

#[test]
fn unmatched_selection_keeps_the_filter_visible() {
    let report = controller::handle(
        &seeded_source(),
        &ViewRequest { func_name: Some("ghost".into()), ..Default::default() },
    );
    assert!(!report.stats.contains("'>foo</a>"));
    assert!(!report.stats.contains("'>bar</a>"));
    assert!(!report.stats.contains("'>main</a>"));
    assert_eq!(report.restrictions, vec![r"\(ghost\)"]);
    assert!(report.callers.is_some());
    assert!(report.callees.is_some());
}

#[test]
fn bogus_sort_token_falls_back_to_cumulative() {
    let report = controller::handle(
        &seeded_source(),
        &ViewRequest { sort: Some("bogus".into()), ..Default::default() },
    );
    assert!(report.stats.contains("Ordered by: cumulative time"));
}

#[test]
fn single_function_scenario() {
    let source = ProfilingDataSource::default();
    source.merge(RecordBatch {
        records: vec![FunctionRecord {
            key: FunctionKey::new("mod.rs", 10, "foo"),
            counts: CallCounts { prim_calls: 1, calls: 1, own_time: 0.001, cum_time: 0.001 },
            callers: Vec::new(),
        }],
    });

    let plain = controller::handle(&source, &ViewRequest::default());
    assert!(plain.stats.contains("mod.rs:10"));
    assert!(plain.callers.is_none());
    assert!(plain.callees.is_none());

    let selected = controller::handle(
        &source,
        &ViewRequest { func_name: Some("foo".into()), ..Default::default() },
    );
    assert!(selected.stats.contains("mod.rs:10"));
    // foo is a root: the callers block exists and shows the bare row
    let callers = selected.callers.expect("callers block present");
    assert!(callers.contains("mod.rs:10"));
}
