//! Error types for element observation
//!
//! Detachment of the tracked element is not an error; it is reported as
//! [`CheckOutcome::Detached`](crate::CheckOutcome::Detached). The variants here
//! cover configuration that cannot be honoured and measurements the geometry
//! provider could not take.

use thiserror::Error;

/// Main error type for the observer
#[derive(Error, Debug)]
pub enum ObserverError {
    #[error("Offset '{name}' is not a number")]
    InvalidOffset { name: &'static str },

    #[error("Geometry unavailable: {0}")]
    Geometry(String),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Callback failed: {0}")]
    Callback(String),
}

impl ObserverError {
    /// Build a geometry error from anything printable
    pub fn geometry(message: impl Into<String>) -> Self {
        ObserverError::Geometry(message.into())
    }

    /// Build a callback error from anything printable
    pub fn callback(message: impl Into<String>) -> Self {
        ObserverError::Callback(message.into())
    }

    /// Whether the error came from measuring, rather than from configuration
    pub fn is_geometry(&self) -> bool {
        matches!(self, ObserverError::Geometry(_))
    }
}

/// Result alias used throughout the crate
pub type ObserverResult<T> = Result<T, ObserverError>;
