//! Caller-owned view state
//!
//! The engine itself holds no state between calls. The polling/UI layer owns a
//! single mutable [`DeviceView`] describing which device is currently in focus,
//! and calls the pure engine on each refresh with readings drawn from it.

use crate::adapter::RawReading;
use crate::error::EngineError;
use crate::types::Reading;

/// Device roster plus current selection, rebuilt from each ingested batch.
///
/// Re-ingesting a batch preserves the current selection when the device is still
/// present; otherwise the selection falls back to the first device seen.
#[derive(Debug, Clone, Default)]
pub struct DeviceView {
    devices: Vec<String>,
    selected: Option<String>,
}

impl DeviceView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Devices found in the last ingested batch, in first-seen order.
    pub fn devices(&self) -> &[String] {
        &self.devices
    }

    /// The currently selected device, if any.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Refresh the roster from a batch of raw records.
    pub fn ingest(&mut self, records: &[RawReading]) {
        self.devices = crate::adapter::HistoryAdapter::device_ids(records);

        let still_present = self
            .selected
            .as_ref()
            .map(|s| self.devices.contains(s))
            .unwrap_or(false);
        if !still_present {
            self.selected = self.devices.first().cloned();
        }
    }

    /// Select a device from the current roster.
    pub fn select(&mut self, device_id: &str) -> Result<(), EngineError> {
        if self.devices.iter().any(|d| d == device_id) {
            self.selected = Some(device_id.to_string());
            Ok(())
        } else {
            Err(EngineError::UnknownDevice(device_id.to_string()))
        }
    }

    /// The selected device's readings, sorted ascending by instant.
    ///
    /// Sorting here satisfies the engine's ordering precondition.
    pub fn selected_history(&self, readings: &[Reading]) -> Vec<Reading> {
        let selected = match self.selected.as_deref() {
            Some(s) => s,
            None => return Vec::new(),
        };
        let mut history: Vec<Reading> = readings
            .iter()
            .filter(|r| r.device_id == selected)
            .cloned()
            .collect();
        history.sort_by_key(|r| r.timestamp);
        history
    }
}
