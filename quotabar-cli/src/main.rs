// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! Quotabar CLI - AI provider quota usage from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Usage for the provider resolved from settings or the active model
//! quotabar
//!
//! # Usage for a specific provider, bypassing the cache TTL
//! quotabar usage --provider claude --force
//!
//! # Every enabled provider, as JSON
//! quotabar entries --format json --pretty
//!
//! # Which provider serves a model?
//! quotabar detect --model-provider openai --model-id gpt-4o
//!
//! # Inspect or drop the shared cache
//! quotabar cache show
//! quotabar cache clear
//! ```

mod commands;
mod output;
mod session;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{cache, cycle, detect, entries, providers, usage};

// ============================================================================
// CLI Definition
// ============================================================================

/// Quotabar CLI - AI provider quota usage.
#[derive(Parser)]
#[command(name = "quotabar")]
#[command(about = "AI provider quota usage from the command line")]
#[command(long_about = r#"
Quotabar shows how much of each AI account's rate-limit quota is used.
Results are cached and shared between concurrent quotabar processes.

Supported providers:
  • OpenAI Codex (codex)
  • Claude (claude)
  • Gemini (gemini)
  • GitHub Copilot (copilot)
  • z.ai (zai)
  • Kiro (kiro)

Tokens are read from environment variables (see `quotabar providers`).

Examples:
  quotabar                        # Resolved provider
  quotabar usage -p codex         # Single provider
  quotabar entries                # All enabled providers
  quotabar --format json          # JSON output
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run. If none, runs 'usage' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode (no logs, no error messages).
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Settings file (defaults to the platform config directory).
    #[arg(long, global = true, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Usage cache file (defaults to the platform cache directory).
    #[arg(long, global = true, value_name = "PATH")]
    pub cache: Option<PathBuf>,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Show usage for the resolved provider (default if no command specified).
    #[command(visible_alias = "u")]
    Usage(usage::UsageArgs),

    /// Fetch several providers at once.
    #[command(visible_alias = "e")]
    Entries(entries::EntriesArgs),

    /// Move to the next provider with usable data.
    Cycle(cycle::CycleArgs),

    /// Detect the provider serving a model.
    Detect(detect::DetectArgs),

    /// List providers with enablement and credential state.
    #[command(visible_alias = "p")]
    Providers,

    /// Inspect or clear the usage cache.
    Cache(cache::CacheArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// No provider produced usable data.
    NoData = 2,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let default = if verbose {
        "quotabar=debug,info"
    } else {
        "quotabar=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result: Result<ExitCode> = match &cli.command {
        Some(Commands::Usage(args)) => usage::run(args, &cli).await,
        Some(Commands::Entries(args)) => entries::run(args, &cli).await,
        Some(Commands::Cycle(args)) => cycle::run(args, &cli).await,
        Some(Commands::Detect(args)) => detect::run(args, &cli),
        Some(Commands::Providers) => providers::run(&cli).await,
        Some(Commands::Cache(args)) => cache::run(args, &cli).await,
        None => usage::run(&usage::UsageArgs::default(), &cli).await,
    };

    let code = match result {
        Ok(code) => code,
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {e:#}");
            }
            ExitCode::Error
        }
    };
    std::process::exit(code as i32);
}
