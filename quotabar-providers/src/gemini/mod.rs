//! Gemini provider.
//!
//! Reads per-model request quotas from the Cloud Code private API:
//!
//! ```text
//! POST https://cloudcode-pa.googleapis.com/v1internal:retrieveUserQuota
//! Authorization: Bearer <oauth access token>
//! {}
//! ```

mod parser;

pub use parser::{GeminiQuotaBucket, GeminiQuotaResponse};

use async_trait::async_trait;
use quotabar_core::{Credentials, ProviderKind, UsageProvider, UsageSnapshot};
use quotabar_fetch::{FetchContext, FetchError, HttpClient, bearer_headers};
use serde_json::json;
use tracing::instrument;

use crate::common::{into_snapshot, require_token};
use crate::descriptor::{CliConfig, DetectionTokens, ProviderDescriptor};

/// Quota endpoint.
pub const QUOTA_URL: &str = "https://cloudcode-pa.googleapis.com/v1internal:retrieveUserQuota";

/// Creates the Gemini provider descriptor.
pub fn gemini_descriptor() -> ProviderDescriptor {
    ProviderDescriptor {
        id: ProviderKind::Gemini,
        cli: CliConfig {
            name: "gemini",
            aliases: &["google"],
        },
        token_env: Some("GEMINI_ACCESS_TOKEN"),
        status_url: None,
        detection: DetectionTokens {
            provider: &["google", "gemini", "vertex"],
            model: &["gemini"],
        },
    }
}

/// Gemini usage provider.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    http: HttpClient,
}

impl GeminiProvider {
    /// Creates the provider. Performs no I/O.
    pub fn new(ctx: &FetchContext) -> Self {
        Self {
            http: (*ctx.http)
                .clone()
                .with_allowed_domains(&["googleapis.com"]),
        }
    }

    async fn fetch(&self, credentials: &Credentials) -> Result<UsageSnapshot, FetchError> {
        let token = require_token(credentials, ProviderKind::Gemini)?;
        let response: GeminiQuotaResponse = self
            .http
            .post_json(QUOTA_URL, bearer_headers(token)?, &json!({}))
            .await?;
        Ok(response.to_snapshot())
    }
}

#[async_trait]
impl UsageProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    #[instrument(skip(self, credentials), fields(provider = "gemini"))]
    async fn fetch_usage(&self, credentials: &Credentials) -> UsageSnapshot {
        into_snapshot(ProviderKind::Gemini, self.fetch(credentials).await)
    }

    fn has_credentials(&self, credentials: &Credentials) -> Option<bool> {
        Some(credentials.has_token(ProviderKind::Gemini))
    }
}
