//! Usage error taxonomy.
//!
//! Providers never raise; every failure becomes a [`UsageError`] inside the
//! returned snapshot. Consumers branch on [`UsageErrorCode`] only.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a usage fetch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UsageErrorCode {
    /// No token or API key was supplied.
    NoCredentials,
    /// The provider's CLI binary is not installed.
    NoCli,
    /// The provider's CLI reports no active session.
    NotLoggedIn,
    /// Transport-level failure (DNS, connection reset, ...).
    FetchFailed,
    /// Non-success HTTP status.
    HttpError,
    /// The provider answered with an unexpected payload.
    ApiError,
    /// The request exceeded its time budget.
    Timeout,
    /// Anything else.
    Unknown,
}

impl UsageErrorCode {
    /// Returns true for codes that mean "provider not configured".
    ///
    /// These never discard a cached value and never surface as a failure.
    pub fn is_expected_missing(self) -> bool {
        matches!(self, Self::NoCredentials | Self::NoCli | Self::NotLoggedIn)
    }

    /// Returns the wire name of the code.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoCredentials => "NO_CREDENTIALS",
            Self::NoCli => "NO_CLI",
            Self::NotLoggedIn => "NOT_LOGGED_IN",
            Self::FetchFailed => "FETCH_FAILED",
            Self::HttpError => "HTTP_ERROR",
            Self::ApiError => "API_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for UsageErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure captured as data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageError {
    /// Failure classification.
    pub code: UsageErrorCode,
    /// Short human-readable message.
    pub message: String,
    /// HTTP status, for `HTTP_ERROR`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
}

impl UsageError {
    /// Creates an error with the given code and message.
    pub fn new(code: UsageErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            http_status: None,
        }
    }

    /// No credentials were supplied.
    pub fn no_credentials(message: impl Into<String>) -> Self {
        Self::new(UsageErrorCode::NoCredentials, message)
    }

    /// The CLI binary is missing.
    pub fn no_cli(message: impl Into<String>) -> Self {
        Self::new(UsageErrorCode::NoCli, message)
    }

    /// The CLI has no active session.
    pub fn not_logged_in(message: impl Into<String>) -> Self {
        Self::new(UsageErrorCode::NotLoggedIn, message)
    }

    /// Non-success HTTP status.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            code: UsageErrorCode::HttpError,
            message: message.into(),
            http_status: Some(status),
        }
    }

    /// The request timed out.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(UsageErrorCode::Timeout, message)
    }

    /// Returns true if this error means "provider not configured".
    pub fn is_expected_missing(&self) -> bool {
        self.code.is_expected_missing()
    }
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.http_status {
            Some(status) => write!(f, "{} ({status}): {}", self.code, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_missing_classification() {
        assert!(UsageErrorCode::NoCredentials.is_expected_missing());
        assert!(UsageErrorCode::NoCli.is_expected_missing());
        assert!(UsageErrorCode::NotLoggedIn.is_expected_missing());

        assert!(!UsageErrorCode::FetchFailed.is_expected_missing());
        assert!(!UsageErrorCode::HttpError.is_expected_missing());
        assert!(!UsageErrorCode::ApiError.is_expected_missing());
        assert!(!UsageErrorCode::Timeout.is_expected_missing());
        assert!(!UsageErrorCode::Unknown.is_expected_missing());
    }

    #[test]
    fn test_http_error_display() {
        let err = UsageError::http(401, "token rejected");
        assert_eq!(err.to_string(), "HTTP_ERROR (401): token rejected");
        assert_eq!(err.http_status, Some(401));
    }
}
