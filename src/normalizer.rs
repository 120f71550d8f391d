//! Timestamp normalization
//!
//! The origin server records wall-clock times that are 5h30m ahead of true UTC, so
//! every parsed instant gets a fixed correction subtracted before use. Display and
//! clock labels are rendered in the +05:30 civil calendar (Asia/Kolkata), which makes
//! the correction round-trip for zone-less strings.
//!
//! Two normalization variants exist because their callers genuinely differ:
//! - [`normalize_for_display`] degrades to a visible sentinel on bad input
//! - [`normalize_for_bucketing`] degrades to the supplied reference instant, so
//!   day-grouping never drops a record
//!
//! Neither variant panics or returns an error.

use crate::adapter::RawTimestamp;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use std::fmt;

/// Fixed zone-correction offset in minutes (5h30m), subtracted from every parsed instant.
pub const ZONE_CORRECTION_MINUTES: i64 = 330;

/// Offset of the civil calendar used for display and clock labels (+05:30).
pub const CIVIL_OFFSET_MINUTES: i64 = 330;

/// Result of normalizing a timestamp for display purposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayTime {
    /// Corrected instant, ready for civil-calendar rendering
    Time(DateTime<Utc>),
    /// Input was null or empty
    Missing,
    /// Input was present but unparseable
    Invalid,
}

impl DisplayTime {
    /// The corrected instant, if one was parsed.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            DisplayTime::Time(t) => Some(*t),
            _ => None,
        }
    }
}

impl fmt::Display for DisplayTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayTime::Time(t) => write!(f, "{}", civil(*t).format("%b %d, %I:%M:%S %p")),
            DisplayTime::Missing => write!(f, "--/-- --:--"),
            DisplayTime::Invalid => write!(f, "Invalid Time"),
        }
    }
}

/// Normalize a timestamp for display.
///
/// Null/empty input yields [`DisplayTime::Missing`]; unparseable input yields
/// [`DisplayTime::Invalid`]. Both render as sentinel strings instead of aborting
/// the batch.
pub fn normalize_for_display(raw: Option<&RawTimestamp>) -> DisplayTime {
    match raw {
        None => DisplayTime::Missing,
        Some(ts) => {
            if ts.is_empty() {
                return DisplayTime::Missing;
            }
            match parse_corrected(ts) {
                Some(instant) => DisplayTime::Time(instant),
                None => DisplayTime::Invalid,
            }
        }
    }
}

/// Normalize a timestamp for day bucketing.
///
/// Null or unparseable input degrades to `now` so that grouping never drops a
/// record. The reference instant is an explicit parameter so callers (and tests)
/// can pin a fixed day.
pub fn normalize_for_bucketing(raw: Option<&RawTimestamp>, now: DateTime<Utc>) -> DateTime<Utc> {
    raw.and_then(parse_corrected).unwrap_or(now)
}

/// Bucketing key: the corrected instant's calendar date.
pub fn bucket_date(instant: DateTime<Utc>) -> chrono::NaiveDate {
    instant.date_naive()
}

/// The corrected instant expressed as civil wall-clock time (+05:30).
pub fn civil(instant: DateTime<Utc>) -> NaiveDateTime {
    (instant + Duration::minutes(CIVIL_OFFSET_MINUTES)).naive_utc()
}

/// Clock label in the civil calendar ("04:15 AM").
pub fn clock_label(instant: DateTime<Utc>) -> String {
    civil(instant).format("%I:%M %p").to_string()
}

/// Parse a raw timestamp and apply the fixed zone correction.
fn parse_corrected(raw: &RawTimestamp) -> Option<DateTime<Utc>> {
    parse_instant(raw).map(|t| t - Duration::minutes(ZONE_CORRECTION_MINUTES))
}

fn parse_instant(raw: &RawTimestamp) -> Option<DateTime<Utc>> {
    match raw {
        RawTimestamp::EpochMillis(ms) => DateTime::from_timestamp_millis(*ms),
        RawTimestamp::Text(s) => parse_text(s),
    }
}

fn parse_text(s: &str) -> Option<DateTime<Utc>> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Explicit zone marker: take the instant at face value.
    if let Ok(t) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(t.with_timezone(&Utc));
    }

    // No zone marker: reinterpret "YYYY-MM-DD HH:MM:SS" with a T separator and
    // treat the wall clock as UTC.
    let with_t = trimmed.replace(' ', "T");
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&with_t, fmt) {
            return Some(naive.and_utc());
        }
    }

    None
}
