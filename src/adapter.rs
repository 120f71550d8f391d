//! History payload adapter
//!
//! Parses raw device-history records and maps them to normalized [`Reading`]s.
//! The wire shape is loose across schema revisions: the rotation count appears
//! under either `turns` or `valve_turns`, and `created_at` may be a string or a
//! native epoch value. The adapter resolves all of that here so the engine only
//! ever sees the normalized shape.

use crate::error::EngineError;
use crate::normalizer;
use crate::types::Reading;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw timestamp as it appears on the wire: a string or an epoch-millisecond value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    EpochMillis(i64),
    Text(String),
}

impl RawTimestamp {
    pub fn is_empty(&self) -> bool {
        matches!(self, RawTimestamp::Text(s) if s.trim().is_empty())
    }
}

/// One record of the raw history payload.
///
/// Every field except `valve_id` is optional on the wire; identifiers are not
/// validated here — callers filter malformed entries before invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawReading {
    #[serde(default)]
    pub valve_id: String,
    #[serde(default)]
    pub created_at: Option<RawTimestamp>,
    #[serde(default)]
    pub turns: Option<i64>,
    #[serde(default)]
    pub valve_turns: Option<i64>,
    #[serde(default)]
    pub pressure_val: Option<f64>,
    #[serde(default)]
    pub valve_status: Option<String>,
}

impl RawReading {
    /// Resolve the rotation count across schema revisions.
    ///
    /// `turns` wins when present, including an explicit 0; otherwise fall back to
    /// `valve_turns`, otherwise 0. Negative counts are clamped to 0.
    pub fn rotation_count(&self) -> u32 {
        self.turns.or(self.valve_turns).unwrap_or(0).max(0) as u32
    }

    /// Map to the normalized reading shape.
    ///
    /// The timestamp uses the bucketing normalization: a missing or unparseable
    /// `created_at` degrades to `now` so the record is never dropped.
    pub fn to_reading(&self, now: DateTime<Utc>) -> Reading {
        Reading {
            device_id: self.valve_id.clone(),
            timestamp: normalizer::normalize_for_bucketing(self.created_at.as_ref(), now),
            rotation_count: self.rotation_count(),
            pressure: self.pressure_val.unwrap_or(0.0),
            status_label: self.valve_status.clone(),
        }
    }
}

/// Adapter for raw history payloads
pub struct HistoryAdapter;

impl HistoryAdapter {
    /// Parse a JSON array of history records.
    pub fn parse_array(raw_json: &str) -> Result<Vec<RawReading>, EngineError> {
        serde_json::from_str(raw_json)
            .map_err(|e| EngineError::ParseError(format!("Failed to parse history array: {}", e)))
    }

    /// Parse newline-delimited JSON (one record per line).
    pub fn parse_ndjson(raw_json: &str) -> Result<Vec<RawReading>, EngineError> {
        let mut records = Vec::new();
        for (idx, line) in raw_json.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let record: RawReading = serde_json::from_str(trimmed).map_err(|e| {
                EngineError::ParseError(format!("Failed to parse record on line {}: {}", idx + 1, e))
            })?;
            records.push(record);
        }
        Ok(records)
    }

    /// Map a batch of raw records to normalized readings.
    pub fn to_readings(records: &[RawReading], now: DateTime<Utc>) -> Vec<Reading> {
        records.iter().map(|r| r.to_reading(now)).collect()
    }

    /// Unique device identifiers in first-seen order.
    pub fn device_ids(records: &[RawReading]) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for record in records {
            if !ids.iter().any(|id| id == &record.valve_id) {
                ids.push(record.valve_id.clone());
            }
        }
        ids
    }
}
