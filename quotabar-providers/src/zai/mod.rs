//! z.ai (Zhipu GLM) provider.
//!
//! Reads the coding-plan quota monitor with an API key:
//!
//! ```text
//! GET https://api.z.ai/api/monitor/usage/quota/limit
//! Authorization: Bearer <api key>
//! ```

mod parser;

pub use parser::{ZaiLimit, ZaiQuotaResponse};

use async_trait::async_trait;
use quotabar_core::{Credentials, ProviderKind, UsageProvider, UsageSnapshot};
use quotabar_fetch::{FetchContext, FetchError, HttpClient, bearer_headers};
use tracing::instrument;

use crate::common::{into_snapshot, require_token};
use crate::descriptor::{CliConfig, DetectionTokens, ProviderDescriptor};

/// Quota endpoint.
pub const QUOTA_URL: &str = "https://api.z.ai/api/monitor/usage/quota/limit";

/// Creates the z.ai provider descriptor.
pub fn zai_descriptor() -> ProviderDescriptor {
    ProviderDescriptor {
        id: ProviderKind::Zai,
        cli: CliConfig {
            name: "zai",
            aliases: &["glm", "zhipu"],
        },
        token_env: Some("ZAI_API_KEY"),
        status_url: None,
        detection: DetectionTokens {
            provider: &["zai", "z.ai", "zhipu"],
            model: &["glm"],
        },
    }
}

/// z.ai usage provider.
#[derive(Debug, Clone)]
pub struct ZaiProvider {
    http: HttpClient,
}

impl ZaiProvider {
    /// Creates the provider. Performs no I/O.
    pub fn new(ctx: &FetchContext) -> Self {
        Self {
            http: (*ctx.http).clone().with_allowed_domains(&["z.ai"]),
        }
    }

    async fn fetch(&self, credentials: &Credentials) -> Result<UsageSnapshot, FetchError> {
        let token = require_token(credentials, ProviderKind::Zai)?;
        let response: ZaiQuotaResponse =
            self.http.get_json(QUOTA_URL, bearer_headers(token)?).await?;
        response.into_snapshot()
    }
}

#[async_trait]
impl UsageProvider for ZaiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Zai
    }

    #[instrument(skip(self, credentials), fields(provider = "zai"))]
    async fn fetch_usage(&self, credentials: &Credentials) -> UsageSnapshot {
        into_snapshot(ProviderKind::Zai, self.fetch(credentials).await)
    }

    fn has_credentials(&self, credentials: &Credentials) -> Option<bool> {
        Some(credentials.has_token(ProviderKind::Zai))
    }
}
