//! Usage fetch orchestration.
//!
//! Applies enablement, the minimum refresh floor, and the status refresh
//! policy on top of [`CacheStore::fetch_with_cache`], and fans fetches out
//! across providers with bounded concurrency.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use quotabar_core::{Credentials, ProviderKind, UsageProvider};
use quotabar_providers::{ProviderMap, ProviderRegistry};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::cache::{CacheEntry, CacheStore, CachedUsage};
use crate::settings::{EnabledMode, RefreshSettings, Settings, SettingsStore};

/// Maximum providers fetched at once by [`UsageOrchestrator::fetch_usage_entries`].
pub const MAX_CONCURRENT_FETCHES: usize = 3;

/// Per-call fetch options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Bypass the usage TTL (the minimum refresh floor still applies).
    pub force: bool,
    /// Bypass the status TTL (the status floor still applies).
    pub force_status: bool,
}

impl FetchOptions {
    /// Forced usage refresh.
    pub fn forced() -> Self {
        Self {
            force: true,
            force_status: false,
        }
    }
}

/// Coordinates provider fetches with the cache.
pub struct UsageOrchestrator {
    cache: Arc<CacheStore>,
    providers: ProviderMap,
    settings: Arc<SettingsStore>,
    credentials: Credentials,
}

impl std::fmt::Debug for UsageOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageOrchestrator")
            .field("cache", &self.cache)
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl UsageOrchestrator {
    /// Creates an orchestrator over the given providers.
    pub fn new(
        cache: Arc<CacheStore>,
        providers: ProviderMap,
        settings: Arc<SettingsStore>,
        credentials: Credentials,
    ) -> Self {
        Self {
            cache,
            providers,
            settings,
            credentials,
        }
    }

    /// Returns the cache store.
    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    /// Returns the settings store.
    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.settings
    }

    /// Returns a registered provider.
    pub fn provider(&self, kind: ProviderKind) -> Option<&Arc<dyn UsageProvider>> {
        self.providers.get(&kind)
    }

    /// Registered provider kinds, in registry order.
    pub fn registered(&self) -> Vec<ProviderKind> {
        ProviderRegistry::kinds()
            .into_iter()
            .filter(|k| self.providers.contains_key(k))
            .collect()
    }

    // ========================================================================
    // Enablement
    // ========================================================================

    fn enabled_with(&self, settings: &Settings, kind: ProviderKind) -> bool {
        let Some(provider) = self.providers.get(&kind) else {
            return false;
        };
        match settings.provider(kind).enabled {
            EnabledMode::Enabled => true,
            EnabledMode::Disabled => false,
            EnabledMode::Auto => provider.has_credentials(&self.credentials).unwrap_or(true),
        }
    }

    /// Returns true if the provider is registered and enabled.
    pub async fn is_enabled(&self, kind: ProviderKind) -> bool {
        self.enabled_with(&self.settings.get().await, kind)
    }

    /// Enabled providers: configured order first, then registry order.
    pub async fn enabled_providers(&self) -> Vec<ProviderKind> {
        let settings = self.settings.get().await;
        settings
            .ordered(&self.registered())
            .into_iter()
            .filter(|kind| self.enabled_with(&settings, *kind))
            .collect()
    }

    // ========================================================================
    // Single Provider
    // ========================================================================

    /// Fetches one provider through the cache.
    ///
    /// Returns `None` for unregistered or disabled providers without
    /// touching the cache. Inside the minimum refresh interval the cached
    /// entry is returned even when forced.
    #[instrument(skip(self), fields(provider = %kind))]
    pub async fn fetch_usage_for_provider(
        &self,
        kind: ProviderKind,
        options: FetchOptions,
    ) -> Option<CachedUsage> {
        let settings = self.settings.get().await;
        if !self.enabled_with(&settings, kind) {
            debug!("Provider disabled");
            return None;
        }
        let provider = Arc::clone(self.providers.get(&kind)?);
        let fetch_status = settings.provider(kind).fetch_status;
        let previous = self.cache.get_entry(kind).await;

        let floor = settings.behavior.min_refresh_interval;
        let within_floor = previous.as_ref().filter(|e| e.age() < floor).cloned();
        let result = if let Some(entry) = within_floor {
            debug!(age = ?entry.age(), "Within minimum refresh interval");
            CachedUsage::cached(entry)
        } else {
            let status_clock = settings.status_refresh;
            let credentials = &self.credentials;
            let prev = previous.clone();
            let fetch = || async move {
                let usage = provider.fetch_usage(credentials).await;
                let now = Utc::now();
                let (status, status_at) = if !(fetch_status && provider.supports_status()) {
                    (None, None)
                } else if status_due(prev.as_ref(), status_clock, options.force_status, now) {
                    let fetched = provider.fetch_status().await;
                    let status = fetched.or_else(|| prev.as_ref().and_then(|e| e.status.clone()));
                    (status, Some(now))
                } else {
                    (
                        prev.as_ref().and_then(|e| e.status.clone()),
                        prev.as_ref().and_then(|e| e.status_fetched_at),
                    )
                };
                CacheEntry {
                    fetched_at: now,
                    usage,
                    status,
                    status_fetched_at: status_at,
                }
            };
            self.cache
                .fetch_with_cache(kind, settings.behavior.refresh_interval, fetch, options.force)
                .await
        };

        if result.from_cache && fetch_status {
            return Some(self.refresh_cached_status(kind, result, &settings, options).await);
        }
        Some(result)
    }

    /// Refreshes the status of an entry served from cache, if due.
    async fn refresh_cached_status(
        &self,
        kind: ProviderKind,
        mut result: CachedUsage,
        settings: &Settings,
        options: FetchOptions,
    ) -> CachedUsage {
        let Some(provider) = self.providers.get(&kind) else {
            return result;
        };
        let now = Utc::now();
        if !provider.supports_status()
            || !status_due(Some(&result.entry), settings.status_refresh, options.force_status, now)
        {
            return result;
        }

        let status = provider
            .fetch_status()
            .await
            .or_else(|| result.entry.status.clone());
        match self.cache.update_status(kind, status.clone(), now).await {
            Ok(Some(entry)) => result.entry = entry,
            Ok(None) => {
                result.entry.status = status;
                result.entry.status_fetched_at = Some(now);
            }
            Err(e) => warn!(provider = %kind, error = %e, "Failed to store status"),
        }
        result
    }

    // ========================================================================
    // Batch
    // ========================================================================

    /// Fetches several providers, at most [`MAX_CONCURRENT_FETCHES`] at a
    /// time.
    ///
    /// Results keep the input order. Disabled providers and providers
    /// reporting "expected missing" data with no windows are left out.
    #[instrument(skip(self, kinds), fields(count = kinds.len()))]
    pub async fn fetch_usage_entries(&self, kinds: &[ProviderKind], force: bool) -> Vec<CachedUsage> {
        let concurrency = kinds.len().clamp(1, MAX_CONCURRENT_FETCHES);
        let options = FetchOptions {
            force,
            force_status: false,
        };

        // Completed slots free up immediately; order is restored afterwards.
        let mut results: Vec<(usize, Option<CachedUsage>)> =
            stream::iter(kinds.iter().copied().enumerate())
                .map(|(index, kind)| async move {
                    (index, self.fetch_usage_for_provider(kind, options).await)
                })
                .buffer_unordered(concurrency)
                .collect()
                .await;
        results.sort_unstable_by_key(|(index, _)| *index);

        results
            .into_iter()
            .filter_map(|(_, result)| result.filter(|r| r.entry.usage.is_usable()))
            .collect()
    }
}

/// Whether a status fetch is permitted for the entry's status clock.
fn status_due(
    entry: Option<&CacheEntry>,
    clock: RefreshSettings,
    force: bool,
    now: DateTime<Utc>,
) -> bool {
    let Some(fetched_at) = entry.and_then(|e| e.status_fetched_at) else {
        return true;
    };
    let age = (now - fetched_at).to_std().unwrap_or(Duration::ZERO);
    if age < clock.min_refresh_interval {
        return false;
    }
    force || age >= clock.refresh_interval
}

// ============================================================================
// Tests
// ============================================================================
