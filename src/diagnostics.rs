//! Live diagnostics
//!
//! Stateless O(1) classification of the single most recent reading, independent of
//! session history. The critical condition is "ghost flow": the valve reports
//! rotation but the line shows essentially no pressure.

use crate::types::Reading;
use serde::{Deserialize, Serialize};

/// Pressure below which rotation counts as ghost flow.
pub const GHOST_FLOW_PRESSURE: f64 = 10.0;

/// Pressure above which the line is flagged regardless of rotation.
pub const HIGH_PRESSURE_LIMIT: f64 = 2500.0;

/// Pressure at or below which active rotation is flagged as suboptimal.
pub const LOW_PRESSURE_LIMIT: f64 = 800.0;

/// Full-scale pressure for gauge rendering.
pub const GAUGE_FULL_SCALE: f64 = 3000.0;

/// Live condition of a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum DiagnosticStatus {
    /// Valve open but flow is zero
    GhostFlow,
    /// Line pressure above the safe limit
    HighPressure,
    /// Flow detected but pressure is suboptimal
    LowPressure,
    /// Device-reported status string, passed through
    Reported(String),
    /// Nothing to report
    Nominal,
}

/// Severity of a diagnostic status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl DiagnosticStatus {
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticStatus::GhostFlow => Severity::Critical,
            DiagnosticStatus::HighPressure | DiagnosticStatus::LowPressure => Severity::Warning,
            DiagnosticStatus::Reported(_) | DiagnosticStatus::Nominal => Severity::Info,
        }
    }

    pub fn message(&self) -> String {
        match self {
            DiagnosticStatus::GhostFlow => {
                "Ghost flow detected: valve open but flow is zero".to_string()
            }
            DiagnosticStatus::HighPressure => "High pressure warning".to_string(),
            DiagnosticStatus::LowPressure => {
                "Flow detected but pressure is suboptimal".to_string()
            }
            DiagnosticStatus::Reported(label) => label.clone(),
            DiagnosticStatus::Nominal => "System nominal".to_string(),
        }
    }
}

/// Classify the most recent reading.
///
/// Ghost flow wins over the pressure warnings, which win over the device's
/// self-reported label; a quiet device with no label is nominal.
pub fn classify(reading: &Reading) -> DiagnosticStatus {
    let turns = reading.rotation_count;
    let pressure = reading.pressure;

    if turns > 0 && pressure < GHOST_FLOW_PRESSURE {
        return DiagnosticStatus::GhostFlow;
    }
    if pressure > HIGH_PRESSURE_LIMIT {
        return DiagnosticStatus::HighPressure;
    }
    if turns > 0 && pressure <= LOW_PRESSURE_LIMIT {
        return DiagnosticStatus::LowPressure;
    }
    match reading.status_label.as_deref().map(str::trim) {
        Some(label) if !label.is_empty() => DiagnosticStatus::Reported(label.to_string()),
        _ => DiagnosticStatus::Nominal,
    }
}

/// Gauge fill percentage for a pressure value, capped at 100.
pub fn gauge_percent(pressure: f64) -> f64 {
    (pressure / GAUGE_FULL_SCALE * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn reading(turns: u32, pressure: f64, label: Option<&str>) -> Reading {
        Reading {
            device_id: "valve-1".to_string(),
            timestamp: Utc::now(),
            rotation_count: turns,
            pressure,
            status_label: label.map(str::to_string),
        }
    }

    #[test]
    fn test_ghost_flow_detection() {
        let status = classify(&reading(3, 0.0, None));
        assert_eq!(status, DiagnosticStatus::GhostFlow);
        assert_eq!(status.severity(), Severity::Critical);

        // Pressure at the threshold is not ghost flow.
        assert_ne!(classify(&reading(3, 10.0, None)), DiagnosticStatus::GhostFlow);
        // No rotation means no ghost flow even at zero pressure.
        assert_ne!(classify(&reading(0, 0.0, None)), DiagnosticStatus::GhostFlow);
    }

    #[test]
    fn test_ghost_flow_wins_over_label() {
        let status = classify(&reading(2, 5.0, Some("FLOW OK")));
        assert_eq!(status, DiagnosticStatus::GhostFlow);
    }

    #[test]
    fn test_high_pressure_warning() {
        let status = classify(&reading(0, 2600.0, None));
        assert_eq!(status, DiagnosticStatus::HighPressure);
        assert_eq!(status.severity(), Severity::Warning);
    }

    #[test]
    fn test_low_pressure_warning() {
        let status = classify(&reading(2, 400.0, None));
        assert_eq!(status, DiagnosticStatus::LowPressure);

        // Idle valve at low pressure is not a warning.
        assert_eq!(classify(&reading(0, 400.0, None)), DiagnosticStatus::Nominal);
    }

    #[test]
    fn test_reported_label_passthrough() {
        let status = classify(&reading(2, 1500.0, Some("HIGH FLOW")));
        assert_eq!(status, DiagnosticStatus::Reported("HIGH FLOW".to_string()));
        assert_eq!(status.severity(), Severity::Info);
        assert_eq!(status.message(), "HIGH FLOW");
    }

    #[test]
    fn test_blank_label_is_nominal() {
        assert_eq!(classify(&reading(0, 1500.0, Some("  "))), DiagnosticStatus::Nominal);
        assert_eq!(classify(&reading(0, 1500.0, None)), DiagnosticStatus::Nominal);
    }

    #[test]
    fn test_gauge_percent() {
        assert_eq!(gauge_percent(0.0), 0.0);
        assert_eq!(gauge_percent(1500.0), 50.0);
        assert_eq!(gauge_percent(3000.0), 100.0);
        assert_eq!(gauge_percent(4500.0), 100.0);
        assert_eq!(gauge_percent(-50.0), 0.0);
    }
}
