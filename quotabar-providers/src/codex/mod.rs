//! Codex (OpenAI) provider.
//!
//! Reads the ChatGPT backend usage endpoint with the OAuth access token
//! issued to the Codex CLI.

mod parser;

pub use parser::{CodexCredits, CodexRateLimit, CodexUsageResponse, CodexWindow};

use async_trait::async_trait;
use quotabar_core::{Credentials, ProviderKind, ProviderStatus, UsageProvider, UsageSnapshot};
use quotabar_fetch::host::status::urls;
use quotabar_fetch::{FetchContext, FetchError, HttpClient, bearer_headers};
use tracing::instrument;

use crate::common::{into_snapshot, poll_status, require_token};
use crate::descriptor::{CliConfig, DetectionTokens, ProviderDescriptor};

/// Usage endpoint.
pub const USAGE_URL: &str = "https://chatgpt.com/backend-api/wham/usage";

/// Creates the Codex provider descriptor.
pub fn codex_descriptor() -> ProviderDescriptor {
    ProviderDescriptor {
        id: ProviderKind::Codex,
        cli: CliConfig {
            name: "codex",
            aliases: &["openai"],
        },
        token_env: Some("OPENAI_ACCESS_TOKEN"),
        status_url: Some(urls::OPENAI),
        detection: DetectionTokens {
            provider: &["openai", "codex"],
            model: &["gpt", "codex", "o1", "o3", "o4"],
        },
    }
}

/// Codex usage provider.
#[derive(Debug, Clone)]
pub struct CodexProvider {
    ctx: FetchContext,
    http: HttpClient,
}

impl CodexProvider {
    /// Creates the provider. Performs no I/O.
    pub fn new(ctx: &FetchContext) -> Self {
        Self {
            http: (*ctx.http).clone().with_allowed_domains(&["chatgpt.com"]),
            ctx: ctx.clone(),
        }
    }

    async fn fetch(&self, credentials: &Credentials) -> Result<UsageSnapshot, FetchError> {
        let token = require_token(credentials, ProviderKind::Codex)?;
        let response: CodexUsageResponse =
            self.http.get_json(USAGE_URL, bearer_headers(token)?).await?;
        Ok(response.to_snapshot())
    }
}

#[async_trait]
impl UsageProvider for CodexProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Codex
    }

    #[instrument(skip(self, credentials), fields(provider = "codex"))]
    async fn fetch_usage(&self, credentials: &Credentials) -> UsageSnapshot {
        into_snapshot(ProviderKind::Codex, self.fetch(credentials).await)
    }

    fn supports_status(&self) -> bool {
        true
    }

    async fn fetch_status(&self) -> Option<ProviderStatus> {
        poll_status(&self.ctx, ProviderKind::Codex, urls::OPENAI).await
    }

    fn has_credentials(&self, credentials: &Credentials) -> Option<bool> {
        Some(credentials.has_token(ProviderKind::Codex))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotabar_core::UsageErrorCode;

    #[tokio::test]
    async fn test_missing_token_is_no_credentials() {
        let provider = CodexProvider::new(&FetchContext::new());
        let snapshot = provider.fetch_usage(&Credentials::new()).await;
        assert_eq!(snapshot.error.unwrap().code, UsageErrorCode::NoCredentials);
    }

    #[test]
    fn test_descriptor_detection_tokens() {
        let desc = codex_descriptor();
        assert!(desc.detection.model.contains(&"o3"));
        assert_eq!(desc.cli.aliases, &["openai"]);
    }
}
