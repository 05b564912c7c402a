//! Cycle command - land on the next provider with usable data.
//!
//! Each invocation is a fresh controller, so the rotation point comes from
//! `--after`, falling back to the configured default provider.

use anyhow::Result;
use clap::Args;
use quotabar_core::ProviderKind;
use quotabar_store::{Settings, UsageController};
use std::sync::Arc;

use crate::output::emit;
use crate::session::{Session, parse_provider};
use crate::{Cli, ExitCode};

/// Arguments for the cycle command.
#[derive(Args, Default)]
pub struct CycleArgs {
    /// Start probing just after this provider, e.g. the one currently shown.
    #[arg(long, value_name = "PROVIDER")]
    pub after: Option<String>,
}

impl CycleArgs {
    /// Provider the rotation continues from.
    fn starting_point(&self, settings: &Settings) -> Result<Option<ProviderKind>> {
        match self.after.as_deref() {
            Some(name) => parse_provider(name).map(Some),
            None => Ok(settings.default_provider_kind()),
        }
    }
}

/// Runs the cycle command.
pub async fn run(args: &CycleArgs, cli: &Cli) -> Result<ExitCode> {
    let session = Session::open(cli).await;
    let after = args.starting_point(&session.settings.get().await)?;

    let controller = UsageController::new(Arc::clone(&session.orchestrator));
    if let Some(provider) = after {
        controller.seed_cycle(provider).await;
    }

    let landed = controller.cycle_provider().await;
    let update = controller.current_update();

    emit(
        cli,
        |text| match &update.usage {
            Some(usage) => text.format_usage(usage),
            None => "none".to_string(),
        },
        |json| json.format_update(&update),
    )?;

    Ok(if landed.is_some() {
        ExitCode::Success
    } else {
        ExitCode::NoData
    })
}
