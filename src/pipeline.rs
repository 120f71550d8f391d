//! Pipeline orchestration
//!
//! This module provides the public API for Valvepulse. It wires the stages
//! together: wire adaptation → normalization → per-device filtering → daily
//! stats → report encoding. The reference instant is always an explicit
//! parameter so callers and tests can pin "today".

use crate::adapter::HistoryAdapter;
use crate::context::DeviceView;
use crate::diagnostics;
use crate::engine;
use crate::error::EngineError;
use crate::report::{ReportEncoder, ReportPayload};
use chrono::{DateTime, Utc};

/// Default number of recent days carried in a report.
pub const DEFAULT_HISTORY_DAYS: usize = 5;

/// Convert a raw history payload into a compliance report for one device.
///
/// # Arguments
/// * `raw_json` - JSON array of raw history records
/// * `device_id` - Device to report on; `None` selects the first device found
/// * `now` - Reference instant for "today" bucketing and provenance
/// * `history_days` - Bound on the recent-day summary list
///
/// # Returns
/// Pretty-printed report JSON
pub fn history_to_report(
    raw_json: &str,
    device_id: Option<&str>,
    now: DateTime<Utc>,
    history_days: usize,
) -> Result<String, EngineError> {
    let mut processor = ComplianceProcessor::with_history_days(history_days);
    let payload = processor.process(raw_json, device_id, now)?;
    serde_json::to_string_pretty(&payload).map_err(EngineError::JsonError)
}

/// Stateful processor for repeated polling cycles.
///
/// Owns the mutable view context (device roster + selection) so the pure engine
/// stays stateless; a UI layer keeps one of these alive across refreshes.
pub struct ComplianceProcessor {
    view: DeviceView,
    encoder: ReportEncoder,
    history_days: usize,
}

impl Default for ComplianceProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ComplianceProcessor {
    /// Create a processor with default settings
    pub fn new() -> Self {
        Self::with_history_days(DEFAULT_HISTORY_DAYS)
    }

    /// Create a processor with a specific recent-history bound
    pub fn with_history_days(history_days: usize) -> Self {
        Self {
            view: DeviceView::new(),
            encoder: ReportEncoder::new(),
            history_days,
        }
    }

    /// The current view context.
    pub fn view(&self) -> &DeviceView {
        &self.view
    }

    /// Process one history payload and build a report for the focused device.
    ///
    /// `device_id` switches focus when given; otherwise the view's retained
    /// selection applies. An empty payload is an error: a report always
    /// describes at least one reading.
    pub fn process(
        &mut self,
        raw_json: &str,
        device_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ReportPayload, EngineError> {
        let records = HistoryAdapter::parse_array(raw_json)?;
        if records.is_empty() {
            return Err(EngineError::EmptyHistory);
        }

        self.view.ingest(&records);
        if let Some(id) = device_id {
            self.view.select(id)?;
        }
        let selected = self
            .view
            .selected()
            .ok_or(EngineError::EmptyHistory)?
            .to_string();

        let readings = HistoryAdapter::to_readings(&records, now);
        let history = self.view.selected_history(&readings);

        let diagnostic = history.last().map(diagnostics::classify);
        let stats = engine::process_daily_stats(&history, now.date_naive(), self.history_days);

        Ok(self.encoder.encode(&selected, diagnostic, &stats, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticStatus;
    use crate::types::AdherenceLevel;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn sample_history_json() -> &'static str {
        r#"[
            {"valve_id": "valve-1", "created_at": "2024-03-10 08:00:00", "turns": 0, "pressure_val": 500.0},
            {"valve_id": "valve-1", "created_at": "2024-03-10 09:00:00", "turns": 2, "pressure_val": 1200.0},
            {"valve_id": "valve-1", "created_at": "2024-03-10 10:00:00", "turns": 2, "pressure_val": 1300.0},
            {"valve_id": "valve-1", "created_at": "2024-03-10 10:05:00", "turns": 0, "pressure_val": 600.0, "valve_status": "FLOW STOPPED"},
            {"valve_id": "valve-2", "created_at": "2024-03-10 09:30:00", "valve_turns": 3, "pressure_val": 5.0}
        ]"#
    }

    fn fixed_now() -> DateTime<Utc> {
        // 2024-03-10 in the corrected frame
        Utc.with_ymd_and_hms(2024, 3, 10, 6, 0, 0).unwrap()
    }

    #[test]
    fn test_history_to_report() {
        let json =
            history_to_report(sample_history_json(), Some("valve-1"), fixed_now(), 5).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(payload["report_version"], "1.0.0");
        assert_eq!(payload["producer"]["name"], "valvepulse");
        assert_eq!(payload["device_id"], "valve-1");

        // 60-minute session from 09:00 to 10:00 wall clock scores exactly 50.
        let metrics = &payload["compliance"]["metrics"];
        assert_eq!(metrics["score"], 50);
        assert_eq!(metrics["start_clock"], "09:00 AM");
        assert_eq!(metrics["duration_label"], "1h 0m");
        assert_eq!(metrics["avg_pressure"], 1250);
        assert_eq!(payload["compliance"]["adherence"], "partial");
        assert_eq!(payload["compliance"]["pressure_band"], "normal");

        // Latest reading is idle with a reported label.
        assert_eq!(payload["diagnostic"]["status"]["kind"], "reported");
        assert_eq!(payload["diagnostic"]["status"]["detail"], "FLOW STOPPED");
    }

    #[test]
    fn test_processor_defaults_to_first_device() {
        let mut processor = ComplianceProcessor::new();
        let payload = processor
            .process(sample_history_json(), None, fixed_now())
            .unwrap();
        assert_eq!(payload.device_id, "valve-1");
    }

    #[test]
    fn test_processor_detects_ghost_flow_on_other_device() {
        let mut processor = ComplianceProcessor::new();
        let payload = processor
            .process(sample_history_json(), Some("valve-2"), fixed_now())
            .unwrap();

        let diagnostic = payload.diagnostic.unwrap();
        assert_eq!(diagnostic.status, DiagnosticStatus::GhostFlow);
        // valve-2 has a single reading with turns >= 2: a still-open session
        // floored to one minute.
        assert_eq!(payload.compliance.metrics.duration_minutes, 1);
        assert_eq!(payload.compliance.adherence, AdherenceLevel::NonCompliant);
    }

    #[test]
    fn test_processor_retains_selection_across_polls() {
        let mut processor = ComplianceProcessor::new();
        processor
            .process(sample_history_json(), Some("valve-2"), fixed_now())
            .unwrap();

        // Next poll without an explicit device keeps the previous focus.
        let payload = processor
            .process(sample_history_json(), None, fixed_now())
            .unwrap();
        assert_eq!(payload.device_id, "valve-2");
    }

    #[test]
    fn test_empty_history_is_an_error() {
        let mut processor = ComplianceProcessor::new();
        let result = processor.process("[]", None, fixed_now());
        assert!(matches!(result, Err(EngineError::EmptyHistory)));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let mut processor = ComplianceProcessor::new();
        assert!(processor.process("not json", None, fixed_now()).is_err());
    }

    #[test]
    fn test_unknown_device_is_an_error() {
        let mut processor = ComplianceProcessor::new();
        let result = processor.process(sample_history_json(), Some("valve-99"), fixed_now());
        assert!(matches!(result, Err(EngineError::UnknownDevice(_))));
    }
}
