//! Field recovery: rendered element text → typed record fragments.
//!
//! The site mixes metadata and body into one text blob per element, so every
//! field is found heuristically. Recovery never panics and never aborts a
//! traversal; an element that cannot be recovered yields a [`SkipReason`].

pub mod fields;
pub mod records;

use thiserror::Error;

/// Why an element produced no record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("element text unreadable or empty")]
    Unreadable,
    #[error("element text too short")]
    TooShort,
    #[error("name '{0}' is page chrome")]
    Stoplisted(String),
    #[error("no date found")]
    MissingDate,
    #[error("dated {year}, older than cutoff")]
    Stale { year: i32 },
    #[error("no body line long enough")]
    BodyTooShort,
    #[error("text length {len} outside 10..=400")]
    OutOfRange { len: usize },
    #[error("contains excluded phrase '{phrase}'")]
    Excluded { phrase: String },
}

/// Non-empty trimmed lines of rendered text.
pub fn lines(text: &str) -> Vec<&str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).collect()
}

/// Collapse every whitespace run to a single space.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── Tests ──
