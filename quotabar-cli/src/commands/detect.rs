//! Detect command - map a model descriptor to a provider.

use anyhow::Result;
use clap::Args;
use quotabar_core::ModelInfo;
use quotabar_providers::{ProviderRegistry, detect_provider_from_model};

use crate::output::emit;
use crate::{Cli, ExitCode};

/// Arguments for the detect command.
#[derive(Args)]
pub struct DetectArgs {
    /// Declared provider of the model, e.g. "OpenAI".
    #[arg(long, default_value = "")]
    pub model_provider: String,

    /// Model id, e.g. "gpt-4o".
    #[arg(long, default_value = "")]
    pub model_id: String,
}

/// Runs the detect command.
pub fn run(args: &DetectArgs, cli: &Cli) -> Result<ExitCode> {
    let model = ModelInfo::new(args.model_provider.clone(), args.model_id.clone());
    let detected = detect_provider_from_model(&model);

    emit(
        cli,
        |_| {
            detected
                .and_then(ProviderRegistry::get)
                .map_or_else(|| "none".to_string(), |d| d.cli_name().to_string())
        },
        |json| json.format_detection(&model, detected),
    )?;

    Ok(if detected.is_some() {
        ExitCode::Success
    } else {
        ExitCode::NoData
    })
}
