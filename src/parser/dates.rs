//! Lenient parsing of the date strings feeds actually publish.
//!
//! RSS nominally uses RFC 2822 and Atom RFC 3339, but in practice feeds mix
//! in textual zones (`GMT`, `EST`, `UTC`), localized weekdays, missing zones
//! and plain `YYYY-MM-DD HH:MM:SS` stamps. Anything without a zone is taken
//! as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Zone abbreviations rewritten to numeric offsets before RFC 2822 parsing.
const ZONES: &[(&str, &str)] = &[
    ("GMT", "+0000"),
    ("UTC", "+0000"),
    ("UT", "+0000"),
    ("Z", "+0000"),
    ("EST", "-0500"),
    ("EDT", "-0400"),
    ("CST", "-0600"),
    ("CDT", "-0500"),
    ("MST", "-0700"),
    ("MDT", "-0600"),
    ("PST", "-0800"),
    ("PDT", "-0700"),
    ("CET", "+0100"),
    ("CEST", "+0200"),
    ("BST", "+0100"),
];

/// Formats that carry an explicit numeric offset.
const ZONED_FORMATS: &[&str] = &[
    "%d %b %Y %H:%M:%S %z",
    "%d %b %Y %H:%M %z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S %z",
];

/// Formats without a zone; interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M",
];

/// Parse `raw` as a timestamp, trying progressively looser interpretations.
pub fn parse_lenient(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    let normalized = normalize_zone(strip_weekday(raw));
    if let Ok(dt) = DateTime::parse_from_rfc2822(&normalized) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Drop a leading `Weekday,` in any language.
fn strip_weekday(raw: &str) -> &str {
    match raw.split_once(',') {
        Some((head, tail)) if head.chars().all(|c| c.is_alphabetic() || c == '.') => tail.trim(),
        _ => raw,
    }
}

/// Rewrite a trailing zone abbreviation into a numeric offset.
fn normalize_zone(raw: &str) -> String {
    if let Some((head, zone)) = raw.rsplit_once(' ') {
        if let Some((_, offset)) = ZONES.iter().find(|(name, _)| *name == zone) {
            return format!("{} {}", head, offset);
        }
    }
    if let Some(head) = raw.strip_suffix('Z') {
        if head.contains('T') {
            return format!("{}+0000", head);
        }
    }
    raw.to_string()
}
