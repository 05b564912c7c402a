//! Core error types for Quotabar.

use thiserror::Error;

/// Core error type for Quotabar operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A provider name did not match any known provider.
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Invalid data from a provider response.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
