//! Sort keys and report restrictions.

use std::fmt;

use crate::domain::ReportError;

/// The metric a report is ordered by. Exactly one is active per report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Total call count (`ncalls` column).
    Calls,
    /// Own time, children excluded (`tottime` column).
    Time,
    /// Cumulative time (`cumtime` column). The default.
    #[default]
    Cumulative,
    /// Source file, then line, then name (`filename` column).
    Module,
    /// Function name, then file, then line (`lineno` column).
    Nfl,
}

impl SortKey {
    /// Column-header token → sort key carried by that header's link.
    ///
    /// These are the five recognized header substrings the formatter turns
    /// into sort links.
    pub const HEADER_LINKS: [(&'static str, SortKey); 5] = [
        ("ncalls", SortKey::Calls),
        ("tottime", SortKey::Time),
        ("cumtime", SortKey::Cumulative),
        ("filename", SortKey::Module),
        ("lineno", SortKey::Nfl),
    ];

    /// Parse an external sort token (the `sort` query parameter).
    pub fn from_token(token: &str) -> Result<Self, ReportError> {
        match token {
            "calls" => Ok(SortKey::Calls),
            "time" => Ok(SortKey::Time),
            "cumulative" => Ok(SortKey::Cumulative),
            "module" => Ok(SortKey::Module),
            "nfl" => Ok(SortKey::Nfl),
            other => Err(ReportError::UnknownSortKey(other.to_owned())),
        }
    }

    /// The token used in link targets.
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            SortKey::Calls => "calls",
            SortKey::Time => "time",
            SortKey::Cumulative => "cumulative",
            SortKey::Module => "module",
            SortKey::Nfl => "nfl",
        }
    }

    /// Human-readable form used in the `Ordered by:` report line.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            SortKey::Calls => "call count",
            SortKey::Time => "internal time",
            SortKey::Cumulative => "cumulative time",
            SortKey::Module => "file name",
            SortKey::Nfl => "name/file/line",
        }
    }
}

/// One narrowing pass over a report's entry list.
///
/// Restrictions apply in sequence; each sees only what the previous ones
/// kept. Patterns match against the `file:line(name)` signature.
#[derive(Debug, Clone, PartialEq)]
pub enum Restriction {
    /// Keep the first N entries.
    Count(usize),
    /// Keep that share of the entries (0.0..1.0), rounded to nearest.
    Fraction(f64),
    /// Keep entries whose signature matches the regex.
    Pattern(String),
}

impl fmt::Display for Restriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Restriction::Count(n) => write!(f, "{n}"),
            Restriction::Fraction(frac) => write!(f, "{frac}"),
            Restriction::Pattern(pat) => write!(f, "{pat}"),
        }
    }
}
