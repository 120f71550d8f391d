//! Valvepulse - Telemetry compliance engine for valve-monitoring devices
//!
//! Valvepulse transforms raw valve telemetry (rotation counts and pressure readings)
//! into operational insight through a deterministic pipeline: wire adaptation →
//! timestamp normalization → session detection → compliance scoring → report encoding.
//!
//! ## Modules
//!
//! - **Adapter**: Parse raw history records into normalized readings
//! - **Normalizer**: Zone-corrected timestamp handling for display and day bucketing
//! - **Engine**: Hysteresis session detection and per-day compliance metrics
//! - **Diagnostics**: Stateless live classification of the latest reading

pub mod adapter;
pub mod context;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod normalizer;
pub mod pipeline;
pub mod report;
pub mod types;

pub use context::DeviceView;
pub use error::EngineError;
pub use pipeline::{history_to_report, ComplianceProcessor};

// Adapter exports
pub use adapter::{HistoryAdapter, RawReading};

// Engine exports
pub use engine::{compute_day_metrics, process_daily_stats};

/// Engine version embedded in all report payloads
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report payloads
pub const PRODUCER_NAME: &str = "valvepulse";
