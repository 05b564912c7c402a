//! Wiring shared by every command: settings, credentials, cache, and the
//! orchestrator over the registered providers.

use anyhow::{Result, bail};
use quotabar_core::{Credentials, ProviderKind};
use quotabar_fetch::FetchContext;
use quotabar_providers::ProviderRegistry;
use quotabar_store::{CacheStore, Settings, SettingsStore, StoreConfig, UsageOrchestrator};
use std::sync::Arc;
use tracing::debug;

use crate::Cli;

/// Components for one CLI invocation.
pub struct Session {
    pub settings: Arc<SettingsStore>,
    pub orchestrator: Arc<UsageOrchestrator>,
    pub credentials: Credentials,
}

impl Session {
    /// Loads settings, reads tokens from the environment, and builds the
    /// orchestrator. No provider I/O happens here.
    pub async fn open(cli: &Cli) -> Self {
        let settings = Arc::new(match &cli.settings {
            Some(path) => SettingsStore::load(path).await,
            None => SettingsStore::load_default().await,
        });
        let cache = Arc::new(CacheStore::new(store_config(cli)));

        let credentials = credentials_with(&settings.get().await, |var| std::env::var(var).ok());
        let providers = ProviderRegistry::create_all(&FetchContext::new());
        let orchestrator = Arc::new(UsageOrchestrator::new(
            cache,
            providers,
            Arc::clone(&settings),
            credentials.clone(),
        ));

        Self {
            settings,
            orchestrator,
            credentials,
        }
    }
}

/// Cache store configuration honouring `--cache`.
pub fn store_config(cli: &Cli) -> StoreConfig {
    match &cli.cache {
        Some(path) => StoreConfig::with_cache_path(path.clone()),
        None => StoreConfig::default(),
    }
}

/// Collects provider tokens from the variables named in settings.
pub fn credentials_with<F>(settings: &Settings, lookup: F) -> Credentials
where
    F: Fn(&str) -> Option<String>,
{
    let mut credentials = Credentials::new();
    for kind in ProviderRegistry::kinds() {
        let Some(var) = settings.credential_env(kind) else {
            continue;
        };
        if let Some(token) = lookup(&var).filter(|t| !t.trim().is_empty()) {
            debug!(provider = %kind, env = %var, "Token found");
            credentials.insert(kind, token.trim());
        }
    }
    credentials
}

/// Resolves a provider name or alias.
pub fn parse_provider(name: &str) -> Result<ProviderKind> {
    match ProviderRegistry::get_by_cli_name(name.trim()) {
        Some(desc) => Ok(desc.id),
        None => bail!(
            "Unknown provider: {name}. Valid options: {}",
            ProviderRegistry::all()
                .iter()
                .map(|d| d.cli_name())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

/// Parses a comma-separated provider list, dropping duplicates.
pub fn parse_provider_list(names: &str) -> Result<Vec<ProviderKind>> {
    let mut kinds = Vec::new();
    for name in names.split(',').filter(|n| !n.trim().is_empty()) {
        let kind = parse_provider(name)?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    if kinds.is_empty() {
        bail!("No valid providers specified");
    }
    Ok(kinds)
}

// ============================================================================
// Tests
// ============================================================================
