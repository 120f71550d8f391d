//! Error types for Valvepulse
//!
//! Errors only occur at the parse/encode boundary. The compute functions in
//! [`crate::engine`], [`crate::normalizer`] and [`crate::diagnostics`] are
//! infallible: missing fields and bad timestamps degrade to documented defaults.

use thiserror::Error;

/// Errors that can occur while parsing input or encoding output
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to parse history payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("No readings found in input")]
    EmptyHistory,

    #[error("Unknown device: {0}")]
    UnknownDevice(String),
}
