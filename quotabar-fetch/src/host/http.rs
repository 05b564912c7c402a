//! HTTP client with tracing, a hard time budget, and domain allowlist.
//!
//! This module provides a wrapped HTTP client that adds:
//! - Request/response tracing
//! - Domain allowlist for security
//! - A `tokio::time::timeout` around the whole request, body included
//! - Typed JSON helpers that classify non-success statuses

use reqwest::{Client, RequestBuilder, header, header::HeaderMap, header::HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::{FetchError, HttpError};

/// Default request timeout for provider APIs.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// User agent string for Quotabar.
const USER_AGENT: &str = concat!("Quotabar/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client wrapper with tracing, timeout, and domain allowlist.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    timeout: Duration,
    allowed_domains: Option<Vec<String>>,
}

impl HttpClient {
    /// Creates a new HTTP client with the default API timeout.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates a new HTTP client with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        let inner = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to build configured HTTP client, using defaults");
                Client::new()
            });

        Self {
            inner,
            timeout,
            allowed_domains: None,
        }
    }

    /// Restricts requests to the given domains (and their subdomains).
    #[must_use]
    pub fn with_allowed_domains(mut self, domains: &[&str]) -> Self {
        self.allowed_domains = Some(domains.iter().map(|d| (*d).to_string()).collect());
        self
    }

    /// Returns the time budget applied to each request.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Checks if a URL's domain is allowed.
    fn is_domain_allowed(&self, url: &str) -> Result<(), HttpError> {
        let parsed = Url::parse(url).map_err(|e| HttpError::InvalidUrl(e.to_string()))?;

        let Some(ref allowed) = self.allowed_domains else {
            return Ok(());
        };

        let host = parsed
            .host_str()
            .ok_or_else(|| HttpError::InvalidUrl("No host in URL".to_string()))?;

        let allowed = allowed
            .iter()
            .any(|domain| host == domain || host.ends_with(&format!(".{domain}")));

        if allowed {
            Ok(())
        } else {
            Err(HttpError::DomainNotAllowed(host.to_string()))
        }
    }

    /// Performs a GET request and decodes a JSON body.
    ///
    /// Non-success statuses become [`FetchError::HttpStatus`]; the whole
    /// exchange including the body read shares one time budget.
    #[instrument(skip(self, headers), fields(url = %url))]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: HeaderMap,
    ) -> Result<T, FetchError> {
        self.is_domain_allowed(url)?;
        debug!("GET request (JSON)");
        self.exchange_json(self.inner.get(url).headers(headers)).await
    }

    /// Performs a POST request with a JSON body and decodes a JSON response.
    #[instrument(skip(self, headers, body), fields(url = %url))]
    pub async fn post_json<B, T>(
        &self,
        url: &str,
        headers: HeaderMap,
        body: &B,
    ) -> Result<T, FetchError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.is_domain_allowed(url)?;
        debug!("POST request (JSON)");
        self.exchange_json(self.inner.post(url).headers(headers).json(body))
            .await
    }

    /// Sends a prepared request and decodes the JSON response within the budget.
    async fn exchange_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, FetchError> {
        let exchange = async {
            let response = request.send().await.map_err(HttpError::from)?;
            let status = response.status();
            debug!(status = %status, "Response received");
            if !status.is_success() {
                return Err(FetchError::HttpStatus {
                    status: status.as_u16(),
                    message: status
                        .canonical_reason()
                        .unwrap_or("unexpected status")
                        .to_string(),
                });
            }
            let body = response.text().await.map_err(HttpError::from)?;
            Ok::<T, FetchError>(serde_json::from_str(&body)?)
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))?
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Header Helpers
// ============================================================================

/// Builds JSON request headers with a bearer token.
pub fn bearer_headers(token: &str) -> Result<HeaderMap, HttpError> {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    let auth = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| HttpError::InvalidHeader(e.to_string()))?;
    headers.insert(header::AUTHORIZATION, auth);
    Ok(headers)
}

// ============================================================================
// Tests
// ============================================================================
