//! Claude (Anthropic) provider.
//!
//! Reads the OAuth usage endpoint used by Claude subscriptions:
//!
//! ```text
//! GET https://api.anthropic.com/api/oauth/usage
//! Authorization: Bearer <oauth token>
//! anthropic-beta: oauth-2025-04-20
//! ```

mod parser;

pub use parser::{ClaudeUsageResponse, ClaudeWindow};

use async_trait::async_trait;
use quotabar_core::{Credentials, ProviderKind, ProviderStatus, UsageProvider, UsageSnapshot};
use quotabar_fetch::host::status::urls;
use quotabar_fetch::{FetchContext, FetchError, HttpClient, bearer_headers};
use reqwest::header::HeaderValue;
use tracing::instrument;

use crate::common::{into_snapshot, poll_status, require_token};
use crate::descriptor::{CliConfig, DetectionTokens, ProviderDescriptor};

/// Usage endpoint.
pub const USAGE_URL: &str = "https://api.anthropic.com/api/oauth/usage";

/// Beta header required by the OAuth usage endpoint.
const OAUTH_BETA: &str = "oauth-2025-04-20";

/// Creates the Claude provider descriptor.
pub fn claude_descriptor() -> ProviderDescriptor {
    ProviderDescriptor {
        id: ProviderKind::Claude,
        cli: CliConfig {
            name: "claude",
            aliases: &["anthropic"],
        },
        token_env: Some("ANTHROPIC_OAUTH_TOKEN"),
        status_url: Some(urls::ANTHROPIC),
        detection: DetectionTokens {
            provider: &["anthropic", "claude"],
            model: &["claude"],
        },
    }
}

/// Claude usage provider.
#[derive(Debug, Clone)]
pub struct ClaudeProvider {
    ctx: FetchContext,
    http: HttpClient,
}

impl ClaudeProvider {
    /// Creates the provider. Performs no I/O.
    pub fn new(ctx: &FetchContext) -> Self {
        Self {
            http: (*ctx.http).clone().with_allowed_domains(&["api.anthropic.com"]),
            ctx: ctx.clone(),
        }
    }

    async fn fetch(&self, credentials: &Credentials) -> Result<UsageSnapshot, FetchError> {
        let token = require_token(credentials, ProviderKind::Claude)?;
        let mut headers = bearer_headers(token)?;
        headers.insert("anthropic-beta", HeaderValue::from_static(OAUTH_BETA));

        let response: ClaudeUsageResponse = self.http.get_json(USAGE_URL, headers).await?;
        Ok(response.to_snapshot())
    }
}

#[async_trait]
impl UsageProvider for ClaudeProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Claude
    }

    #[instrument(skip(self, credentials), fields(provider = "claude"))]
    async fn fetch_usage(&self, credentials: &Credentials) -> UsageSnapshot {
        into_snapshot(ProviderKind::Claude, self.fetch(credentials).await)
    }

    fn supports_status(&self) -> bool {
        true
    }

    async fn fetch_status(&self) -> Option<ProviderStatus> {
        poll_status(&self.ctx, ProviderKind::Claude, urls::ANTHROPIC).await
    }

    fn has_credentials(&self, credentials: &Credentials) -> Option<bool> {
        Some(credentials.has_token(ProviderKind::Claude))
    }
}
