//! Mission-level error types.

use nav_core::MapError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },
    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f64 },
}

/// Rejected before the first telemetry event is processed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MissionError {
    #[error("invalid mission config: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid obstacle map: {0}")]
    InvalidMap(#[from] MapError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("vehicle link disconnected")]
    Disconnected,
    #[error("vehicle rejected {command}: {reason}")]
    Rejected { command: String, reason: String },
}
