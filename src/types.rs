//! Core types for the Valvepulse pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: normalized readings, detected session windows, day metrics, and the
//! compliance summaries built from them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One normalized telemetry sample.
///
/// Produced by the adapter at the system boundary; the engine never sees the raw
/// ambiguous wire shape. `timestamp` is the zone-corrected instant (see
/// [`crate::normalizer`]); `rotation_count` and `pressure` are already defaulted,
/// so the engine can scan without re-checking for missing fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    /// Device identifier
    pub device_id: String,
    /// Zone-corrected instant
    pub timestamp: DateTime<Utc>,
    /// Valve turn count (absent in the source → 0)
    pub rotation_count: u32,
    /// Pressure reading (absent in the source → 0)
    pub pressure: f64,
    /// Device-reported status string, if any
    pub status_label: Option<String>,
}

impl Reading {
    /// The device-reported status, or a neutral placeholder when absent.
    pub fn status_or_default(&self) -> &str {
        self.status_label.as_deref().unwrap_or("Unknown")
    }
}

/// A detected interval of contiguous rotation activity within one day's readings.
///
/// Ephemeral: recomputed from scratch on every scan, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionWindow {
    /// Instant of the reading that opened the session
    pub start: DateTime<Utc>,
    /// Instant of the last reading that still showed flow
    pub end: DateTime<Utc>,
    /// Number of readings considered active
    pub active_readings: u32,
    /// Floored mean pressure over the active readings
    pub avg_pressure: i64,
}

/// Engine output for one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayMetrics {
    /// The detected session window, if any
    pub session: Option<SessionWindow>,
    /// Session start as a clock time in the corrected civil calendar, or "unknown"
    pub start_clock: String,
    /// Session duration in whole minutes (0 when no session)
    pub duration_minutes: u32,
    /// Human-readable duration ("2h 5m", "45m", "0m")
    pub duration_label: String,
    /// Compliance score, 0-100
    pub score: u8,
    /// Floored mean pressure during the session, absent when no active readings
    pub avg_pressure: Option<i64>,
}

impl DayMetrics {
    /// The zero result returned for an empty day or a day with no detected session.
    pub fn zero() -> Self {
        Self {
            session: None,
            start_clock: "unknown".to_string(),
            duration_minutes: 0,
            duration_label: "0m".to_string(),
            score: 0,
            avg_pressure: None,
        }
    }
}

/// Tri-level adherence classification of a day's compliance score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdherenceLevel {
    Adhered,
    Partial,
    NonCompliant,
}

impl AdherenceLevel {
    /// Classify a 0-100 score: >= 80 adhered, >= 50 partial, else non-compliant.
    pub fn from_score(score: u8) -> Self {
        if score >= 80 {
            AdherenceLevel::Adhered
        } else if score >= 50 {
            AdherenceLevel::Partial
        } else {
            AdherenceLevel::NonCompliant
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdherenceLevel::Adhered => "adhered",
            AdherenceLevel::Partial => "partial",
            AdherenceLevel::NonCompliant => "non-compliant",
        }
    }
}

/// Coarse pressure classification used on cards and day rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PressureBand {
    Low,
    Normal,
    High,
}

impl PressureBand {
    /// Band thresholds: > 2200 high, > 800 normal, else low.
    pub fn from_value(pressure: f64) -> Self {
        if pressure > 2200.0 {
            PressureBand::High
        } else if pressure > 800.0 {
            PressureBand::Normal
        } else {
            PressureBand::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PressureBand::Low => "LOW",
            PressureBand::Normal => "NORMAL",
            PressureBand::High => "HIGH",
        }
    }
}

/// Today's compliance summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceCard {
    /// Metrics for the reference day
    pub metrics: DayMetrics,
    /// Adherence classification of the score
    pub adherence: AdherenceLevel,
    /// Band of the session's average pressure
    pub pressure_band: PressureBand,
}

/// One row of the recent-day history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySummary {
    /// Corrected civil date of the bucket
    pub date: NaiveDate,
    pub metrics: DayMetrics,
    pub pressure_band: PressureBand,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adherence_thresholds() {
        assert_eq!(AdherenceLevel::from_score(100), AdherenceLevel::Adhered);
        assert_eq!(AdherenceLevel::from_score(80), AdherenceLevel::Adhered);
        assert_eq!(AdherenceLevel::from_score(79), AdherenceLevel::Partial);
        assert_eq!(AdherenceLevel::from_score(50), AdherenceLevel::Partial);
        assert_eq!(AdherenceLevel::from_score(49), AdherenceLevel::NonCompliant);
        assert_eq!(AdherenceLevel::from_score(0), AdherenceLevel::NonCompliant);
    }

    #[test]
    fn test_pressure_band_thresholds() {
        assert_eq!(PressureBand::from_value(0.0), PressureBand::Low);
        assert_eq!(PressureBand::from_value(800.0), PressureBand::Low);
        assert_eq!(PressureBand::from_value(801.0), PressureBand::Normal);
        assert_eq!(PressureBand::from_value(2200.0), PressureBand::Normal);
        assert_eq!(PressureBand::from_value(2201.0), PressureBand::High);
    }

    #[test]
    fn test_adherence_serialization() {
        let json = serde_json::to_string(&AdherenceLevel::NonCompliant).unwrap();
        assert_eq!(json, "\"non_compliant\"");
    }

    #[test]
    fn test_zero_metrics() {
        let zero = DayMetrics::zero();
        assert_eq!(zero.score, 0);
        assert_eq!(zero.duration_label, "0m");
        assert_eq!(zero.start_clock, "unknown");
        assert!(zero.avg_pressure.is_none());
        assert!(zero.session.is_none());
    }
}
