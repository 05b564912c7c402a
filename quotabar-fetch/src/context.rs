//! Fetch context providing access to host APIs.
//!
//! Every provider adapter is constructed with a context; constructing one
//! performs no I/O.

use std::sync::Arc;
use std::time::Duration;

use crate::host::{http::HttpClient, process::ProcessRunner, status::StatusPoller};

// ============================================================================
// Fetch Settings
// ============================================================================

/// Time budgets for fetch operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    /// Budget for one provider API request.
    pub api_timeout: Duration,
    /// Budget for one CLI subprocess call.
    pub cli_timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            api_timeout: crate::host::http::DEFAULT_TIMEOUT,
            cli_timeout: crate::host::process::DEFAULT_TIMEOUT,
        }
    }
}

// ============================================================================
// Fetch Context
// ============================================================================

/// Shared host APIs handed to provider adapters.
#[derive(Debug, Clone)]
pub struct FetchContext {
    /// HTTP client for provider APIs.
    pub http: Arc<HttpClient>,
    /// Subprocess runner for CLI providers.
    pub process: Arc<ProcessRunner>,
    /// Status page poller.
    pub status: Arc<StatusPoller>,
    /// Time budgets.
    pub settings: FetchSettings,
}

impl FetchContext {
    /// Creates a context with default settings.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a builder.
    pub fn builder() -> FetchContextBuilder {
        FetchContextBuilder::default()
    }
}

impl Default for FetchContext {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`FetchContext`].
#[derive(Debug, Default)]
pub struct FetchContextBuilder {
    settings: FetchSettings,
}

impl FetchContextBuilder {
    /// Sets the API request budget.
    #[must_use]
    pub fn api_timeout(mut self, timeout: Duration) -> Self {
        self.settings.api_timeout = timeout;
        self
    }

    /// Sets the CLI subprocess budget.
    #[must_use]
    pub fn cli_timeout(mut self, timeout: Duration) -> Self {
        self.settings.cli_timeout = timeout;
        self
    }

    /// Builds the context.
    pub fn build(self) -> FetchContext {
        let http = HttpClient::with_timeout(self.settings.api_timeout);
        FetchContext {
            status: Arc::new(StatusPoller::with_client(http.clone())),
            http: Arc::new(http),
            process: Arc::new(ProcessRunner::with_timeout(self.settings.cli_timeout)),
            settings: self.settings,
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
    fn test_default_budgets() {
        let ctx = FetchContext::new();
        assert_eq!(ctx.settings.api_timeout, Duration::from_secs(5));
        assert_eq!(ctx.settings.cli_timeout, Duration::from_secs(10));
        assert_eq!(ctx.http.timeout(), Duration::from_secs(5));
        assert_eq!(ctx.process.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_builder_overrides() {
        let ctx = FetchContext::builder()
            .api_timeout(Duration::from_millis(100))
            .cli_timeout(Duration::from_millis(200))
            .build();
        assert_eq!(ctx.http.timeout(), Duration::from_millis(100));
        assert_eq!(ctx.process.timeout(), Duration::from_millis(200));
    }
}
