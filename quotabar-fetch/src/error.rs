//! Fetch error types.
//!
//! Provider adapters use these internally and convert them into the
//! [`UsageError`] taxonomy at the capability boundary.

use quotabar_core::{UsageError, UsageErrorCode};
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type for fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    HttpStatus {
        /// Status code.
        status: u16,
        /// Short description, usually the canonical reason.
        message: String,
    },

    /// The whole operation exceeded its time budget.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Subprocess failed.
    #[error("Process error: {0}")]
    Process(#[from] ProcessError),

    /// Invalid response from the provider.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The provider's CLI reports no active session.
    #[error("Not logged in: {0}")]
    NotLoggedIn(String),

    /// No credentials were supplied for the provider.
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),
}

impl FetchError {
    /// Maps this error into the usage error taxonomy.
    pub fn to_usage_error(&self) -> UsageError {
        let message = self.to_string();
        match self {
            FetchError::Http(HttpError::Timeout(_)) | FetchError::Timeout(_) => {
                UsageError::timeout(message)
            }
            FetchError::Http(HttpError::Request(e)) if e.is_timeout() => {
                UsageError::timeout(message)
            }
            FetchError::Http(HttpError::Request(e)) => match e.status() {
                Some(status) => UsageError::http(status.as_u16(), message),
                None => UsageError::new(UsageErrorCode::FetchFailed, message),
            },
            FetchError::Http(_) => UsageError::new(UsageErrorCode::FetchFailed, message),
            FetchError::HttpStatus { status, .. } => UsageError::http(*status, message),
            FetchError::Process(ProcessError::NotFound(_)) => UsageError::no_cli(message),
            FetchError::Process(ProcessError::Timeout(_)) => UsageError::timeout(message),
            FetchError::Process(_) => UsageError::new(UsageErrorCode::FetchFailed, message),
            FetchError::InvalidResponse(_) | FetchError::Json(_) => {
                UsageError::new(UsageErrorCode::ApiError, message)
            }
            FetchError::NotLoggedIn(_) => UsageError::not_logged_in(message),
            FetchError::MissingCredentials(_) => UsageError::no_credentials(message),
        }
    }
}

// ============================================================================
// HTTP Error
// ============================================================================

/// HTTP-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request error.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Domain not allowed.
    #[error("Domain not allowed: {0}")]
    DomainNotAllowed(String),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid header value.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

// ============================================================================
// Process Error
// ============================================================================

/// Error type for process operations.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Command not found.
    #[error("Command not found: {0}")]
    NotFound(String),

    /// Command timed out.
    #[error("Command timed out after {0:?}")]
    Timeout(Duration),

    /// Non-zero exit code.
    #[error("Command exited with code {code}: {stderr}")]
    NonZeroExit {
        /// Exit code from the process.
        code: i32,
        /// Standard error output.
        stderr: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Status Error
// ============================================================================

/// Error type for status page operations.
#[derive(Debug, Error)]
pub enum StatusError {
    /// Status page unavailable.
    #[error("Status page unavailable: {0}")]
    Unavailable(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Tests
// ============================================================================
