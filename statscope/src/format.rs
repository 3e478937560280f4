//! The report formatter: raw table text in, hyperlinked HTML-safe text out.
//!
//! This is the one place that parses the semi-structured report format, so
//! the line grammar lives here in full:
//!
//! - A *header line* contains one of the column tokens `ncalls`, `tottime`,
//!   `cumtime`. Each recognized token among the five sortable columns is
//!   replaced by a link that reissues the current view sorted by that
//!   column. The first header line containing the
//!   `filename:lineno(function)` marker fixes the byte offset at which the
//!   function-signature column starts; that offset is assumed stable for
//!   the remaining lines of the same report (the table printer emits
//!   fixed-width numeric columns, but the assumption is still guarded — see
//!   below).
//! - A *data line* matches `^(.*)\((.*)\)$`: anything, then a final
//!   parenthesized function name. The name gets a link selecting that
//!   function; the part of the prefix at or after the remembered offset is
//!   the source location and gets a link selecting name + location. Names
//!   that are empty or the header's own `function` sentinel are aggregate
//!   noise and stay unlinked.
//! - Anything else passes through (escaped) untouched.
//!
//! If the marker was never seen, or a line is too short (or splits inside a
//! multi-byte character) at the remembered offset, the line degrades to a
//! name-only link instead of failing.
//!
//! Only textual content changes: the visible text of every link equals the
//! original segment, so column alignment inside `<pre>` is preserved.

use crate::domain::SortKey;
use crate::query::{ViewRequest, FUNC_LOC_KEY, FUNC_NAME_KEY, SORT_KEY};
use crate::stats::table::FUNCTION_SIG_HEADER;
use regex::Regex;
use std::sync::OnceLock;

/// Function names that mark aggregate/noise rows, never linked.
const IGNORE_FUNC_NAMES: [&str; 2] = ["", "function"];

/// Column tokens that mark a header line.
const HEADER_TOKENS: [&str; 3] = ["ncalls", "tottime", "cumtime"];

fn stats_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.*)\((.*)\)$").expect("static pattern"))
}

/// Annotate the text of exactly one report-printing call.
///
/// Pass each block (stats, callers, callees) separately: the signature
/// column offset is discovered per block and must not leak across blocks
/// with different layouts.
#[must_use]
pub fn annotate(report: &str, request: &ViewRequest) -> String {
    let mut func_col: Option<usize> = None;
    let mut out = String::with_capacity(report.len() * 2);
    for line in report.lines() {
        annotate_line(line, request, &mut func_col, &mut out);
        out.push('\n');
    }
    if !report.ends_with('\n') {
        out.pop();
    }
    out
}

fn annotate_line(line: &str, request: &ViewRequest, func_col: &mut Option<usize>, out: &mut String) {
    if HEADER_TOKENS.iter().any(|t| line.contains(t)) {
        // Remember where the signature column starts, once per report.
        if func_col.is_none() {
            if let Some(pos) = line.find(FUNCTION_SIG_HEADER) {
                *func_col = Some(pos);
            }
        }
        out.push_str(&link_header_tokens(line, request));
        return;
    }

    let Some(caps) = stats_line_re().captures(line) else {
        push_escaped(out, line);
        return;
    };
    let prefix = caps.get(1).map_or("", |m| m.as_str());
    let func_name = caps.get(2).map_or("", |m| m.as_str());
    if IGNORE_FUNC_NAMES.contains(&func_name) {
        push_escaped(out, line);
        return;
    }

    // Location link over the signature column, when the offset is usable on
    // this line; otherwise fall back to the bare name link only.
    let split = func_col
        .filter(|&pos| pos < prefix.len() && prefix.is_char_boundary(pos))
        .map(|pos| prefix.split_at(pos));
    match split {
        Some((numeric, func_loc)) => {
            let loc_href = request.href_with(&[
                (FUNC_LOC_KEY, Some(func_loc)),
                (FUNC_NAME_KEY, Some(func_name)),
            ]);
            push_escaped(out, numeric);
            push_anchor(out, &loc_href, func_loc);
        }
        None => push_escaped(out, prefix),
    }

    let name_href =
        request.href_with(&[(FUNC_LOC_KEY, None), (FUNC_NAME_KEY, Some(func_name))]);
    out.push('(');
    push_anchor(out, &name_href, func_name);
    out.push(')');
}

/// Replace every occurrence of the five sortable column tokens with a sort
/// link. Token positions are located in the raw line first and the result is
/// built in one left-to-right pass, so link targets inserted for one token
/// (which may carry the current request's selections) are never rescanned
/// for another.
fn link_header_tokens(line: &str, request: &ViewRequest) -> String {
    let mut hits: Vec<(usize, &str, SortKey)> = Vec::new();
    for (token, key) in SortKey::HEADER_LINKS {
        let mut from = 0;
        while let Some(i) = line[from..].find(token) {
            hits.push((from + i, token, key));
            from += i + token.len();
        }
    }
    hits.sort_by_key(|&(i, ..)| i);

    let mut html = String::with_capacity(line.len() * 2);
    let mut cursor = 0;
    for (i, token, key) in hits {
        if i < cursor {
            continue;
        }
        push_escaped(&mut html, &line[cursor..i]);
        let href = request.href_with(&[(SORT_KEY, Some(key.token()))]);
        push_anchor(&mut html, &href, token);
        cursor = i + token.len();
    }
    push_escaped(&mut html, &line[cursor..]);
    html
}

fn push_anchor(out: &mut String, href: &str, text: &str) {
    out.push_str("<a href='");
    push_escaped(out, href);
    out.push_str("'>");
    push_escaped(out, text);
    out.push_str("</a>");
}

/// Escape text for embedding in the `<pre>` report body or an attribute.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    push_escaped(&mut out, text);
    out
}

fn push_escaped(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
}
