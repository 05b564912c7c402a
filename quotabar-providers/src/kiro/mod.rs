//! Kiro provider.
//!
//! Kiro has no public usage API; credits are read from the `kiro-cli`
//! `/usage` command, which prints either JSON or a human summary.

mod parser;

pub use parser::{KiroUsageReport, parse_usage_output};

use async_trait::async_trait;
use quotabar_core::{Credentials, ProviderKind, UsageProvider, UsageSnapshot};
use quotabar_fetch::{FetchContext, FetchError, ProcessError};
use tracing::{debug, instrument};

use crate::common::into_snapshot;
use crate::descriptor::{CliConfig, DetectionTokens, ProviderDescriptor};

/// CLI binary name.
pub const KIRO_BINARY: &str = "kiro-cli";

/// Creates the Kiro provider descriptor.
pub fn kiro_descriptor() -> ProviderDescriptor {
    ProviderDescriptor {
        id: ProviderKind::Kiro,
        cli: CliConfig {
            name: "kiro",
            aliases: &[],
        },
        token_env: None,
        status_url: None,
        detection: DetectionTokens {
            provider: &["kiro"],
            model: &["kiro"],
        },
    }
}

/// Kiro usage provider.
#[derive(Debug, Clone)]
pub struct KiroProvider {
    ctx: FetchContext,
}

impl KiroProvider {
    /// Creates the provider. Performs no I/O.
    pub fn new(ctx: &FetchContext) -> Self {
        Self { ctx: ctx.clone() }
    }

    async fn fetch(&self) -> Result<UsageSnapshot, FetchError> {
        let output = self.ctx.process.run(KIRO_BINARY, &["/usage"]).await?;
        debug!(exit_code = output.exit_code, "kiro-cli finished");

        match parse_usage_output(&output.combined()) {
            Ok(snapshot) => Ok(snapshot),
            // Exit status is more informative than "no credits found".
            Err(FetchError::InvalidResponse(_)) if !output.success() => {
                Err(ProcessError::NonZeroExit {
                    code: output.exit_code,
                    stderr: output.stderr.trim().to_string(),
                }
                .into())
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl UsageProvider for KiroProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Kiro
    }

    #[instrument(skip(self, _credentials), fields(provider = "kiro"))]
    async fn fetch_usage(&self, _credentials: &Credentials) -> UsageSnapshot {
        into_snapshot(ProviderKind::Kiro, self.fetch().await)
    }

    fn has_credentials(&self, _credentials: &Credentials) -> Option<bool> {
        Some(self.ctx.process.command_exists(KIRO_BINARY))
    }
}
