//! GitHub Copilot provider.
//!
//! Reads premium request and chat quotas from the internal Copilot user
//! endpoint using a GitHub token.

mod parser;

pub use parser::{CopilotQuota, CopilotUserResponse};

use async_trait::async_trait;
use quotabar_core::{Credentials, ProviderKind, ProviderStatus, UsageProvider, UsageSnapshot};
use quotabar_fetch::host::status::urls;
use quotabar_fetch::{FetchContext, FetchError, HttpClient, HttpError, bearer_headers};
use reqwest::header::{AUTHORIZATION, HeaderValue};
use tracing::instrument;

use crate::common::{into_snapshot, poll_status, require_token};
use crate::descriptor::{CliConfig, DetectionTokens, ProviderDescriptor};

/// Usage endpoint.
pub const USAGE_URL: &str = "https://api.github.com/copilot_internal/user";

/// Creates the Copilot provider descriptor.
pub fn copilot_descriptor() -> ProviderDescriptor {
    ProviderDescriptor {
        id: ProviderKind::Copilot,
        cli: CliConfig {
            name: "copilot",
            aliases: &["github"],
        },
        token_env: Some("GITHUB_TOKEN"),
        status_url: Some(urls::GITHUB),
        detection: DetectionTokens {
            provider: &["copilot", "github"],
            model: &["copilot"],
        },
    }
}

/// Copilot usage provider.
#[derive(Debug, Clone)]
pub struct CopilotProvider {
    ctx: FetchContext,
    http: HttpClient,
}

impl CopilotProvider {
    /// Creates the provider. Performs no I/O.
    pub fn new(ctx: &FetchContext) -> Self {
        Self {
            http: (*ctx.http).clone().with_allowed_domains(&["api.github.com"]),
            ctx: ctx.clone(),
        }
    }

    async fn fetch(&self, credentials: &Credentials) -> Result<UsageSnapshot, FetchError> {
        let token = require_token(credentials, ProviderKind::Copilot)?;
        let mut headers = bearer_headers(token)?;
        // The internal endpoint expects GitHub's `token` scheme.
        let auth = HeaderValue::from_str(&format!("token {token}"))
            .map_err(|e| HttpError::InvalidHeader(e.to_string()))?;
        headers.insert(AUTHORIZATION, auth);

        let response: CopilotUserResponse = self.http.get_json(USAGE_URL, headers).await?;
        Ok(response.to_snapshot())
    }
}

#[async_trait]
impl UsageProvider for CopilotProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Copilot
    }

    #[instrument(skip(self, credentials), fields(provider = "copilot"))]
    async fn fetch_usage(&self, credentials: &Credentials) -> UsageSnapshot {
        into_snapshot(ProviderKind::Copilot, self.fetch(credentials).await)
    }

    fn supports_status(&self) -> bool {
        true
    }

    async fn fetch_status(&self) -> Option<ProviderStatus> {
        poll_status(&self.ctx, ProviderKind::Copilot, urls::GITHUB).await
    }

    fn has_credentials(&self, credentials: &Credentials) -> Option<bool> {
        Some(credentials.has_token(ProviderKind::Copilot))
    }
}
