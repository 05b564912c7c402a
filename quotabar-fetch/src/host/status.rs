//! Status page polling for provider health.
//!
//! Providers publish their health on statuspage.io-compatible endpoints;
//! this module reads them into [`ProviderStatus`].

use quotabar_core::{ProviderStatus, StatusIndicator};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::http::HttpClient;
use crate::error::StatusError;

// ============================================================================
// Statuspage.io Response Types
// ============================================================================

/// Response from statuspage.io /api/v2/status.json endpoint.
#[derive(Debug, Deserialize)]
struct StatuspageStatus {
    status: StatuspageIndicator,
}

#[derive(Debug, Deserialize)]
struct StatuspageIndicator {
    indicator: String,
    #[serde(default)]
    description: Option<String>,
}

// ============================================================================
// Status Poller
// ============================================================================

/// API for polling provider status pages.
#[derive(Debug, Clone, Default)]
pub struct StatusPoller {
    client: HttpClient,
}

impl StatusPoller {
    /// Creates a new status poller with the default API timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a status poller with a custom HTTP client.
    pub fn with_client(client: HttpClient) -> Self {
        Self { client }
    }

    /// Fetch status from a statuspage.io-compatible endpoint.
    ///
    /// URL should be like: `https://status.openai.com/api/v2/status.json`
    #[instrument(skip(self), fields(url = %status_url))]
    pub async fn fetch_status(&self, status_url: &str) -> Result<ProviderStatus, StatusError> {
        debug!("Fetching status page");

        let response = self.client.get(status_url).await.map_err(|e| {
            warn!(error = %e, "Failed to fetch status");
            StatusError::Unavailable(e.to_string())
        })?;

        if !response.status().is_success() {
            return Err(StatusError::Unavailable(format!("HTTP {}", response.status())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| StatusError::Unavailable(e.to_string()))?;

        let status = parse_statuspage(&body)?;
        debug!(indicator = ?status.indicator, "Status fetched");
        Ok(status)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Parses a statuspage.io `status.json` body.
pub fn parse_statuspage(body: &str) -> Result<ProviderStatus, StatusError> {
    let data: StatuspageStatus = serde_json::from_str(body)?;
    Ok(ProviderStatus {
        indicator: StatusIndicator::from_statuspage(&data.status.indicator),
        description: data.status.description.filter(|d| !d.is_empty()),
    })
}

// ============================================================================
// Known Status Page URLs
// ============================================================================

/// Known status page URLs for providers.
pub mod urls {
    /// OpenAI status page API endpoint.
    pub const OPENAI: &str = "https://status.openai.com/api/v2/status.json";
    /// Anthropic status page API endpoint.
    pub const ANTHROPIC: &str = "https://status.anthropic.com/api/v2/status.json";
    /// GitHub status page API endpoint.
    pub const GITHUB: &str = "https://www.githubstatus.com/api/v2/status.json";
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_statuspage() {
        let body = r#"{
            "page": {"id": "x", "name": "OpenAI", "url": "https://status.openai.com"},
            "status": {"indicator": "minor", "description": "Partially Degraded Service"}
        }"#;
        let status = parse_statuspage(body).unwrap();
        assert_eq!(status.indicator, StatusIndicator::Minor);
        assert_eq!(status.description.as_deref(), Some("Partially Degraded Service"));
    }

    #[test]
    fn test_parse_statuspage_unknown_indicator() {
        let body = r#"{"status": {"indicator": "weird"}}"#;
        let status = parse_statuspage(body).unwrap();
        assert_eq!(status.indicator, StatusIndicator::Unknown);
        assert!(status.description.is_none());
    }

    #[test]
    fn test_parse_statuspage_garbage() {
        assert!(matches!(parse_statuspage("<html>"), Err(StatusError::Json(_))));
    }
}
