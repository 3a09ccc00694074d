//! Error types for kernel input validation.
//!
//! The kernel itself never fails mid-tick; these errors only reject bad
//! caller input (ball specs, arena sizes, configuration).

use thiserror::Error;

/// Result type for kernel operations.
pub type SimResult<T> = Result<T, SimError>;

/// Errors returned when caller input is rejected.
#[derive(Debug, Error)]
pub enum SimError {
    /// A ball spec field is out of range.
    #[error("invalid ball {field}: {value}")]
    InvalidBall {
        /// Offending field name.
        field: &'static str,
        /// Value that was rejected.
        value: f64,
    },

    /// Arena dimensions must be positive and finite.
    #[error("invalid arena bounds {width}x{height}")]
    InvalidBounds {
        /// Requested width.
        width: f64,
        /// Requested height.
        height: f64,
    },

    /// Configuration value out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Configuration JSON could not be parsed.
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}
