//! Entries command - fetch several providers with bounded concurrency.

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use quotabar_store::CachedUsage;
use tracing::info;

use crate::output::emit;
use crate::session::{Session, parse_provider_list};
use crate::{Cli, ExitCode};

/// Arguments for the entries command.
#[derive(Args, Default)]
pub struct EntriesArgs {
    /// Bypass the cache TTL (the minimum refresh interval still applies).
    #[arg(long)]
    pub force: bool,

    /// Comma-separated providers, e.g. "codex,claude". Defaults to every
    /// enabled provider.
    #[arg(long, short)]
    pub provider: Option<String>,
}

/// Runs the entries command.
pub async fn run(args: &EntriesArgs, cli: &Cli) -> Result<ExitCode> {
    let selection = args.provider.as_deref().map(parse_provider_list).transpose()?;

    let session = Session::open(cli).await;
    let kinds = match selection {
        Some(kinds) => kinds,
        None => session.orchestrator.enabled_providers().await,
    };

    info!(providers = ?kinds, "Fetching usage entries");
    let results = session
        .orchestrator
        .fetch_usage_entries(&kinds, args.force)
        .await;

    emit(cli, |text| format_text(text, &results), |json| json.format_entries(&results))?;

    if results.iter().any(|r| r.entry.usage.has_windows()) {
        Ok(ExitCode::Success)
    } else {
        Ok(ExitCode::NoData)
    }
}

fn format_text(text: &crate::output::TextFormatter, results: &[CachedUsage]) -> String {
    if results.is_empty() {
        return "No enabled provider returned data.".to_string();
    }
    let now = Utc::now();
    results
        .iter()
        .map(|r| {
            format!(
                "{}\n{}",
                text.format_usage(&r.entry.merged_usage()),
                text.format_cache_note(r.from_cache, r.entry.fetched_at, now)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
