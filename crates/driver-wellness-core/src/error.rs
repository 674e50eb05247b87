//! Error types for driver wellness telemetry.
//!
//! The ingest, classify and aggregate paths are infallible; errors only come
//! from the configuration surface and task scheduling.
//!
//! ```rust
//! use driver_wellness_core::error::{WellnessError, WellnessResult};
//!
//! fn tick_period(ms: u64) -> WellnessResult<u64> {
//!     if ms == 0 {
//!         return Err(WellnessError::configuration("tick period must be non-zero"));
//!     }
//!     Ok(ms)
//! }
//!
//! assert!(tick_period(0).is_err());
//! ```

use thiserror::Error;

/// A specialized `Result` type for wellness operations.
pub type WellnessResult<T> = Result<T, WellnessError>;

/// Top-level error type for the driver wellness crates.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum WellnessError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
    },

    /// Settings patch or config payload could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// I/O error while reading configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid state for the requested operation
    #[error("Invalid state: expected {expected}, found {actual}")]
    InvalidState {
        /// Expected state
        expected: String,
        /// Actual state
        actual: String,
    },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error
        message: String,
    },
}

impl WellnessError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new invalid state error.
    #[must_use]
    pub fn invalid_state(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::InvalidState {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if the caller can retry or fall back to defaults.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) | Self::Parse(_) => true,
            Self::Configuration { .. } | Self::InvalidState { .. } | Self::Internal { .. } => {
                false
            }
        }
    }
}
