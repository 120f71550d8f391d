//! Report encoding
//!
//! Encodes a device's daily stats and live diagnostic into a versioned JSON
//! payload for dashboards and downstream consumers. Ensures all required fields
//! are present and properly formatted.

use crate::diagnostics::{DiagnosticStatus, Severity};
use crate::engine::DailyStats;
use crate::error::EngineError;
use crate::types::{ComplianceCard, DailySummary};
use crate::{ENGINE_VERSION, PRODUCER_NAME};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Report producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Live diagnostic as carried in a report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDiagnostic {
    pub status: DiagnosticStatus,
    pub severity: Severity,
    pub message: String,
}

impl From<DiagnosticStatus> for ReportDiagnostic {
    fn from(status: DiagnosticStatus) -> Self {
        Self {
            severity: status.severity(),
            message: status.message(),
            status,
        }
    }
}

/// Complete report payload for one device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportPayload {
    pub report_version: String,
    pub producer: ReportProducer,
    pub device_id: String,
    pub computed_at_utc: String,
    /// Classification of the most recent reading, absent when the device has none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<ReportDiagnostic>,
    /// Today's compliance card
    pub compliance: ComplianceCard,
    /// Recent day summaries, most recent first
    pub recent_days: Vec<DailySummary>,
}

/// Report encoder for producing versioned JSON payloads
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Encode daily stats and a live diagnostic into a report payload.
    pub fn encode(
        &self,
        device_id: &str,
        diagnostic: Option<DiagnosticStatus>,
        stats: &DailyStats,
        computed_at: DateTime<Utc>,
    ) -> ReportPayload {
        ReportPayload {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: ENGINE_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            device_id: device_id.to_string(),
            computed_at_utc: computed_at.to_rfc3339(),
            diagnostic: diagnostic.map(ReportDiagnostic::from),
            compliance: stats.today.clone(),
            recent_days: stats.recent.clone(),
        }
    }

    /// Encode to a pretty JSON string.
    pub fn encode_to_json(
        &self,
        device_id: &str,
        diagnostic: Option<DiagnosticStatus>,
        stats: &DailyStats,
        computed_at: DateTime<Utc>,
    ) -> Result<String, EngineError> {
        let payload = self.encode(device_id, diagnostic, stats, computed_at);
        serde_json::to_string_pretty(&payload).map_err(EngineError::JsonError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AdherenceLevel, DayMetrics, PressureBand};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn zero_stats() -> DailyStats {
        DailyStats {
            today: ComplianceCard {
                metrics: DayMetrics::zero(),
                adherence: AdherenceLevel::NonCompliant,
                pressure_band: PressureBand::Low,
            },
            recent: Vec::new(),
        }
    }

    #[test]
    fn test_encode_payload_fields() {
        let encoder = ReportEncoder::with_instance_id("fixed-id".to_string());
        let computed_at = Utc.with_ymd_and_hms(2024, 3, 10, 6, 0, 0).unwrap();
        let payload = encoder.encode(
            "valve-1",
            Some(DiagnosticStatus::GhostFlow),
            &zero_stats(),
            computed_at,
        );

        assert_eq!(payload.report_version, REPORT_VERSION);
        assert_eq!(payload.producer.name, PRODUCER_NAME);
        assert_eq!(payload.producer.instance_id, "fixed-id");
        assert_eq!(payload.device_id, "valve-1");
        assert_eq!(payload.computed_at_utc, "2024-03-10T06:00:00+00:00");

        let diagnostic = payload.diagnostic.unwrap();
        assert_eq!(diagnostic.status, DiagnosticStatus::GhostFlow);
        assert_eq!(diagnostic.severity, Severity::Critical);
    }

    #[test]
    fn test_encode_to_json_is_valid() {
        let encoder = ReportEncoder::new();
        let json = encoder
            .encode_to_json("valve-1", None, &zero_stats(), Utc::now())
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["report_version"], "1.0.0");
        assert_eq!(value["producer"]["name"], "valvepulse");
        assert_eq!(value["compliance"]["metrics"]["score"], 0);
        // Absent diagnostic is skipped entirely.
        assert!(value.get("diagnostic").is_none());
    }

    #[test]
    fn test_payload_round_trip() {
        let encoder = ReportEncoder::new();
        let json = encoder
            .encode_to_json(
                "valve-1",
                Some(DiagnosticStatus::Reported("FLOW OK".to_string())),
                &zero_stats(),
                Utc::now(),
            )
            .unwrap();

        let parsed: ReportPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.device_id, "valve-1");
        assert_eq!(
            parsed.diagnostic.unwrap().status,
            DiagnosticStatus::Reported("FLOW OK".to_string())
        );
    }
}
