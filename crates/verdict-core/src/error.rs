//! Common error types for verdict components.

use thiserror::Error;

/// Common error type for aggregation operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Input is not a valid answer table
    #[error("schema error: {0}")]
    Schema(String),

    /// Malformed JSON at the string boundary
    #[error("schema error: invalid answer json: {0}")]
    Json(#[from] serde_json::Error),

    /// A capability this aggregator variant does not provide
    #[error("{aggregator} does not expose {capability}; {hint}")]
    MissingCapability {
        aggregator: String,
        capability: String,
        hint: String,
    },

    /// Result accessed before `fit`
    #[error("aggregator has not been fitted")]
    NotFitted,

    /// Metric undefined for this input
    #[error("degenerate input: {0}")]
    Degenerate(String),
}

impl Error {
    /// Capability error naming the missing quantity and how to supply it.
    pub fn missing_capability(aggregator: &str, capability: &str, hint: &str) -> Self {
        Self::MissingCapability {
            aggregator: aggregator.to_string(),
            capability: capability.to_string(),
            hint: hint.to_string(),
        }
    }
}

/// Result type alias using the verdict Error.
pub type Result<T> = std::result::Result<T, Error>;
