//! Usage command - resolve a provider and show its usage.

use anyhow::Result;
use clap::Args;
use quotabar_core::{ModelInfo, UsageSnapshot};
use quotabar_store::{UsageController, UsageUpdate};
use std::sync::Arc;
use tracing::{info, warn};

use crate::output::emit;
use crate::session::{Session, parse_provider};
use crate::{Cli, ExitCode};

/// Arguments for the usage command.
#[derive(Args, Default)]
pub struct UsageArgs {
    /// Bypass the cache TTL (the minimum refresh interval still applies).
    #[arg(long)]
    pub force: bool,

    /// Provider to show, overriding the default and model detection.
    #[arg(long, short)]
    pub provider: Option<String>,

    /// Declared provider of the active model, used for detection.
    #[arg(long)]
    pub model_provider: Option<String>,

    /// Id of the active model, used for detection.
    #[arg(long)]
    pub model_id: Option<String>,
}

impl UsageArgs {
    /// The active model, if either half was given.
    pub fn model(&self) -> Option<ModelInfo> {
        if self.model_provider.is_none() && self.model_id.is_none() {
            return None;
        }
        Some(ModelInfo::new(
            self.model_provider.clone().unwrap_or_default(),
            self.model_id.clone().unwrap_or_default(),
        ))
    }
}

/// Runs the usage command.
pub async fn run(args: &UsageArgs, cli: &Cli) -> Result<ExitCode> {
    let pinned = args.provider.as_deref().map(parse_provider).transpose()?;

    let session = Session::open(cli).await;
    let controller = UsageController::new(Arc::clone(&session.orchestrator));

    if let Some(kind) = pinned {
        if !session.orchestrator.is_enabled(kind).await {
            warn!(provider = %kind, "Provider is disabled or has no credentials");
        }
        controller.pin(Some(kind));
    }
    controller.set_model(args.model());

    info!(force = args.force, "Refreshing usage");
    let update = controller.refresh(args.force).await;

    emit(
        cli,
        |text| match &update.usage {
            Some(usage) => text.format_usage(usage),
            None => text.format_idle(),
        },
        |json| json.format_update(&update),
    )?;

    Ok(exit_code(&update))
}

/// Success only when real numbers are shown.
fn exit_code(update: &UsageUpdate) -> ExitCode {
    if update.usage.as_ref().is_some_and(UsageSnapshot::has_windows) {
        ExitCode::Success
    } else {
        ExitCode::NoData
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use quotabar_core::{ProviderKind, RateWindow, UsageError};

    #[test]
    fn test_model_from_args() {
        assert!(UsageArgs::default().model().is_none());

        let args = UsageArgs {
            model_id: Some("claude-sonnet-4".into()),
            ..UsageArgs::default()
        };
        assert_eq!(args.model(), Some(ModelInfo::new("", "claude-sonnet-4")));
    }

    #[test]
    fn test_exit_code() {
        assert_eq!(exit_code(&UsageUpdate::idle()), ExitCode::NoData);

        let failed = UsageUpdate {
            provider: Some(ProviderKind::Claude),
            usage: Some(UsageSnapshot::from_error(
                ProviderKind::Claude,
                UsageError::http(500, "boom"),
            )),
        };
        assert_eq!(exit_code(&failed), ExitCode::NoData);

        let ok = UsageUpdate {
            provider: Some(ProviderKind::Claude),
            usage: Some(
                UsageSnapshot::new(ProviderKind::Claude)
                    .with_windows(vec![RateWindow::new("5h", 12.0)]),
            ),
        };
        assert_eq!(exit_code(&ok), ExitCode::Success);
    }
}
