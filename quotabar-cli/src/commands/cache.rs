//! Cache command - inspect or delete the shared usage cache.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Subcommand};
use quotabar_store::CacheStore;
use tracing::info;

use crate::output::emit;
use crate::session::store_config;
use crate::{Cli, ExitCode};

/// Arguments for the cache command.
#[derive(Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache actions.
#[derive(Subcommand)]
pub enum CacheAction {
    /// Print every cached entry.
    Show,
    /// Delete the cache file.
    Clear,
}

/// Runs the cache command.
pub async fn run(args: &CacheArgs, cli: &Cli) -> Result<ExitCode> {
    let store = CacheStore::new(store_config(cli));
    let path = store.config().cache_path.display().to_string();

    match args.action {
        CacheAction::Show => {
            let cache = store.read().await;
            let json = cache.to_json()?;
            let now = Utc::now();

            emit(
                cli,
                |text| {
                    if cache.is_empty() {
                        return format!("Cache is empty ({path})");
                    }
                    let mut blocks: Vec<String> = cache
                        .entries()
                        .map(|(_, entry)| {
                            format!(
                                "{}\n{}",
                                text.format_usage(&entry.merged_usage()),
                                text.format_cache_note(true, entry.fetched_at, now)
                            )
                        })
                        .collect();
                    let unknown: Vec<&str> = cache.unknown_keys().collect();
                    if !unknown.is_empty() {
                        blocks.push(format!("Other entries: {}", unknown.join(", ")));
                    }
                    blocks.join("\n\n")
                },
                |formatter| formatter.format(&json),
            )?;
        }
        CacheAction::Clear => {
            store
                .clear()
                .await
                .with_context(|| format!("Failed to clear {path}"))?;
            info!(path = %path, "Cache cleared");
            if !cli.quiet {
                emit(
                    cli,
                    |_| format!("Cleared {path}"),
                    |formatter| formatter.format(&serde_json::json!({ "cleared": path })),
                )?;
            }
        }
    }

    Ok(ExitCode::Success)
}
