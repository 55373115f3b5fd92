//! Error types for the pruning engine.
//!
//! The first four variants are caller contract violations raised by the
//! engine itself. They are not recoverable in place and propagate to the
//! training loop, which decides whether to abort the run.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for olvidar operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the sensitivity-guided pruning engine.
#[derive(Debug, Error)]
pub enum Error {
    /// Metric name outside `{lora, grad}`.
    #[error("Unknown prune metric: '{0}'\n  → Supported metrics: lora, grad")]
    UnknownMetric(String),

    /// The `grad` metric was selected but a tracked group has no gradient.
    #[error("Missing gradient for parameter group '{group}'\n  → The grad metric needs gradients on tracked weights; unfreeze them before training")]
    MissingGradient { group: String },

    /// Schedule parameters that cannot produce a ratio curve.
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    /// Sensitivity/score keys or unit counts disagree with the model.
    #[error("Inconsistent shapes: {0}\n  → Trackers are stale; rebuild them after changing the model architecture")]
    InconsistentShapes(String),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error with the path involved.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Create an IO error tied to a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Shorthand for an `InconsistentShapes` error.
    pub(crate) fn shapes(message: impl Into<String>) -> Self {
        Self::InconsistentShapes(message.into())
    }

    /// Check if this error is one of the engine's contract violations.
    pub fn is_engine_error(&self) -> bool {
        matches!(
            self,
            Error::UnknownMetric(_)
                | Error::MissingGradient { .. }
                | Error::InvalidSchedule(_)
                | Error::InconsistentShapes(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
