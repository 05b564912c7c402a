//! On-disk usage cache shared between processes.
//!
//! The cache file is a JSON object keyed by provider id:
//!
//! ```json
//! {
//!   "claude": {
//!     "fetchedAt": 1735732800000,
//!     "usage": {"provider": "claude", "displayName": "Claude", "windows": [...]},
//!     "status": {"indicator": "none"},
//!     "statusFetchedAt": 1735732800000
//!   }
//! }
//! ```
//!
//! Reads never fail: a missing file is an empty cache, and a corrupted
//! file is truncated back to its last parseable prefix and rewritten.
//! Keys this build does not recognize are carried through writes.

use chrono::{DateTime, Utc};
use futures::FutureExt;
use quotabar_core::{ProviderKind, ProviderStatus, UsageSnapshot};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::future::Future;
use std::io::ErrorKind;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::lock::LockManager;
use crate::persistence::write_atomic;

// ============================================================================
// Cache Entry
// ============================================================================

/// Durable per-provider record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// When usage was fetched.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub fetched_at: DateTime<Utc>,
    /// The fetched usage.
    pub usage: UsageSnapshot,
    /// Last known service status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProviderStatus>,
    /// When the status was fetched; refreshed independently of usage.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub status_fetched_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    /// Creates an entry fetched now, without status.
    pub fn new(usage: UsageSnapshot) -> Self {
        Self {
            fetched_at: Utc::now(),
            usage,
            status: None,
            status_fetched_at: None,
        }
    }

    /// Sets the status and its timestamp.
    #[must_use]
    pub fn with_status(
        mut self,
        status: Option<ProviderStatus>,
        fetched_at: Option<DateTime<Utc>>,
    ) -> Self {
        self.status = status;
        self.status_fetched_at = fetched_at;
        self
    }

    /// Time since usage was fetched. Future timestamps count as zero.
    pub fn age(&self) -> Duration {
        (Utc::now() - self.fetched_at).to_std().unwrap_or_default()
    }

    /// Returns true if the entry is younger than `ttl`.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age() < ttl
    }

    /// Returns the usage snapshot with the entry's status merged in.
    pub fn merged_usage(&self) -> UsageSnapshot {
        let status = self.status.clone().or_else(|| self.usage.status.clone());
        self.usage.clone().with_status(status)
    }
}

/// A cache lookup result.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedUsage {
    /// The entry.
    pub entry: CacheEntry,
    /// True when served from the cache without fetching.
    pub from_cache: bool,
}

impl CachedUsage {
    /// An entry served from the cache.
    pub fn cached(entry: CacheEntry) -> Self {
        Self {
            entry,
            from_cache: true,
        }
    }

    /// A freshly fetched entry.
    pub fn fresh(entry: CacheEntry) -> Self {
        Self {
            entry,
            from_cache: false,
        }
    }
}

// ============================================================================
// Usage Cache
// ============================================================================

/// In-memory form of the cache file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageCache {
    entries: BTreeMap<ProviderKind, CacheEntry>,
    other: Map<String, Value>,
}

impl UsageCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a provider's entry.
    pub fn get(&self, provider: ProviderKind) -> Option<&CacheEntry> {
        self.entries.get(&provider)
    }

    /// Inserts or replaces a provider's entry.
    pub fn insert(&mut self, provider: ProviderKind, entry: CacheEntry) -> Option<CacheEntry> {
        self.entries.insert(provider, entry)
    }

    /// Removes a provider's entry.
    pub fn remove(&mut self, provider: ProviderKind) -> Option<CacheEntry> {
        self.entries.remove(&provider)
    }

    /// Iterates entries in provider order.
    pub fn entries(&self) -> impl Iterator<Item = (ProviderKind, &CacheEntry)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    /// Number of provider entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no provider entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top-level keys that are not provider entries.
    pub fn unknown_keys(&self) -> impl Iterator<Item = &str> {
        self.other.keys().map(String::as_str)
    }

    fn from_map(map: Map<String, Value>) -> Self {
        let mut cache = Self::default();
        for (key, value) in map {
            let Ok(kind) = key.parse::<ProviderKind>() else {
                cache.other.insert(key, value);
                continue;
            };
            match serde_json::from_value::<CacheEntry>(value) {
                Ok(entry) => {
                    cache.entries.insert(kind, entry);
                }
                Err(e) => warn!(provider = %kind, error = %e, "Dropping unreadable cache entry"),
            }
        }
        cache
    }

    /// Serializes to the on-disk JSON object.
    pub fn to_json(&self) -> Result<Value, StoreError> {
        let mut map = self.other.clone();
        for (kind, entry) in &self.entries {
            map.insert(kind.to_string(), serde_json::to_value(entry)?);
        }
        Ok(Value::Object(map))
    }

    /// Parses cache file contents, recovering from trailing garbage or
    /// truncation. The flag is true when the input needed repair.
    pub fn parse(text: &str) -> (Self, bool) {
        if text.trim().is_empty() {
            return (Self::default(), false);
        }

        let mut stream = serde_json::Deserializer::from_str(text).into_iter::<Value>();
        if let Some(Ok(Value::Object(map))) = stream.next() {
            let clean = text[stream.byte_offset()..].trim().is_empty();
            return (Self::from_map(map), !clean);
        }

        // Walk back over closing braces looking for a parseable prefix,
        // also trying to close a top-level object cut off mid-entry.
        for (idx, _) in text.rmatch_indices('}') {
            let prefix = &text[..=idx];
            for candidate in [prefix.to_string(), format!("{prefix}}}")] {
                if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&candidate) {
                    return (Self::from_map(map), true);
                }
            }
        }

        (Self::default(), true)
    }
}

// ============================================================================
// Listeners
// ============================================================================

/// Callback invoked after a cache write with the provider's new entry,
/// or `None` when the entry was removed.
pub type CacheListener = Arc<dyn Fn(ProviderKind, Option<&CacheEntry>) + Send + Sync>;

/// Handle returned by [`CacheStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

// ============================================================================
// Cache Store
// ============================================================================

/// Cross-process usage cache with advisory locking.
pub struct CacheStore {
    config: StoreConfig,
    locks: LockManager,
    listeners: Mutex<Vec<(ListenerId, CacheListener)>>,
    next_listener: AtomicU64,
    // Serializes read-modify-write cycles within this process.
    writes: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CacheStore {
    /// Creates a store. Performs no I/O.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            locks: LockManager::new(config.lock_dir.clone()),
            config,
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(1),
            writes: tokio::sync::Mutex::new(()),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the lock manager.
    pub fn locks(&self) -> &LockManager {
        &self.locks
    }

    // ------------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------------

    /// Reads the cache. Never fails; corrupted files are repaired.
    #[instrument(skip(self), fields(path = %self.config.cache_path.display()))]
    pub async fn read(&self) -> UsageCache {
        let path = &self.config.cache_path;
        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return UsageCache::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read usage cache");
                return UsageCache::default();
            }
        };

        let (cache, repaired) = UsageCache::parse(&text);
        if repaired {
            warn!(entries = cache.len(), "Usage cache was corrupted, rewriting recovered data");
            if let Err(e) = self.write_file(&cache).await {
                warn!(error = %e, "Failed to rewrite repaired usage cache");
            }
        }
        cache
    }

    /// Returns a provider's entry if it is younger than `ttl`.
    pub async fn get_cached_data(&self, provider: ProviderKind, ttl: Duration) -> Option<CacheEntry> {
        self.get_entry(provider)
            .await
            .filter(|entry| entry.is_fresh(ttl))
    }

    /// Returns a provider's entry regardless of age.
    pub async fn get_entry(&self, provider: ProviderKind) -> Option<CacheEntry> {
        self.read().await.remove(provider)
    }

    // ------------------------------------------------------------------------
    // Writing
    // ------------------------------------------------------------------------

    /// Writes the whole cache and notifies listeners for every entry, plus
    /// a removal for each provider the new cache no longer holds.
    pub async fn write(&self, cache: &UsageCache) -> Result<(), StoreError> {
        let _guard = self.writes.lock().await;
        let previous = self.read().await;
        self.write_file(cache).await?;
        for (kind, entry) in cache.entries() {
            self.notify(kind, Some(entry));
        }
        for (kind, _) in previous.entries() {
            if cache.get(kind).is_none() {
                self.notify(kind, None);
            }
        }
        Ok(())
    }

    async fn write_file(&self, cache: &UsageCache) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(&cache.to_json()?)?;
        write_atomic(&self.config.cache_path, &json).await?;
        debug!(entries = cache.len(), "Usage cache written");
        Ok(())
    }

    /// Replaces one provider's entry.
    pub async fn set_entry(&self, provider: ProviderKind, entry: CacheEntry) -> Result<(), StoreError> {
        let _guard = self.writes.lock().await;
        let mut cache = self.read().await;
        cache.insert(provider, entry.clone());
        self.write_file(&cache).await?;
        self.notify(provider, Some(&entry));
        Ok(())
    }

    /// Removes one provider's entry. Returns whether one existed; listeners
    /// are only told about actual removals.
    pub async fn remove_entry(&self, provider: ProviderKind) -> Result<bool, StoreError> {
        let _guard = self.writes.lock().await;
        let mut cache = self.read().await;
        if cache.remove(provider).is_none() {
            return Ok(false);
        }
        self.write_file(&cache).await?;
        self.notify(provider, None);
        Ok(true)
    }

    /// Updates only the status fields of an existing entry.
    ///
    /// Returns the updated entry, or `None` if the provider has no entry.
    pub async fn update_status(
        &self,
        provider: ProviderKind,
        status: Option<ProviderStatus>,
        status_fetched_at: DateTime<Utc>,
    ) -> Result<Option<CacheEntry>, StoreError> {
        let _guard = self.writes.lock().await;
        let mut cache = self.read().await;
        let Some(entry) = cache.entries.get_mut(&provider) else {
            return Ok(None);
        };
        entry.status = status;
        entry.status_fetched_at = Some(status_fetched_at);
        let updated = entry.clone();

        self.write_file(&cache).await?;
        self.notify(provider, Some(&updated));
        Ok(Some(updated))
    }

    /// Deletes the cache file, notifying removal of every entry.
    pub async fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.writes.lock().await;
        let cache = self.read().await;
        match tokio::fs::remove_file(&self.config.cache_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        for (kind, _) in cache.entries() {
            self.notify(kind, None);
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------------

    /// Registers a listener called synchronously after each write.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(ProviderKind, Option<&CacheEntry>) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.lock_listeners().push((id, Arc::new(listener)));
        id
    }

    /// Removes a listener. Returns whether it was registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.lock_listeners();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    fn lock_listeners(&self) -> std::sync::MutexGuard<'_, Vec<(ListenerId, CacheListener)>> {
        self.listeners
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn notify(&self, provider: ProviderKind, entry: Option<&CacheEntry>) {
        let listeners: Vec<CacheListener> =
            self.lock_listeners().iter().map(|(_, l)| Arc::clone(l)).collect();
        for listener in listeners {
            let call = std::panic::catch_unwind(AssertUnwindSafe(|| listener(provider, entry)));
            if call.is_err() {
                error!(provider = %provider, "Cache listener panicked");
            }
        }
    }

    // ------------------------------------------------------------------------
    // Fetch With Cache
    // ------------------------------------------------------------------------

    /// Returns a fresh cached entry, or fetches under the provider lock.
    ///
    /// - Unless `force`, a fresh entry is returned without locking.
    /// - With the lock held, `fetch` runs and its result is persisted when
    ///   it carries usage data; an "expected missing" result deletes the
    ///   provider's entry instead. The lock is released on every path.
    /// - Without the lock, waits for the holder, returns its result if the
    ///   cache became fresh, and otherwise fetches unlocked.
    #[instrument(skip(self, fetch), fields(provider = %provider, force = force))]
    pub async fn fetch_with_cache<F, Fut>(
        &self,
        provider: ProviderKind,
        ttl: Duration,
        fetch: F,
        force: bool,
    ) -> CachedUsage
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CacheEntry>,
    {
        if !force {
            if let Some(entry) = self.get_cached_data(provider, ttl).await {
                debug!("Cache hit");
                return CachedUsage::cached(entry);
            }
        }

        let started = Utc::now();
        let lock_id = lock_id(provider);
        let acquired = self
            .locks
            .try_acquire(&lock_id, self.config.lock_stale_after)
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Lock unavailable, fetching without it");
                false
            });

        if acquired {
            let outcome = AssertUnwindSafe(fetch()).catch_unwind().await;
            if let Ok(entry) = &outcome {
                self.persist(provider, entry).await;
            }
            if let Err(e) = self.locks.release(&lock_id).await {
                warn!(error = %e, "Failed to release lock");
            }
            return match outcome {
                Ok(entry) => CachedUsage::fresh(entry),
                Err(panic) => std::panic::resume_unwind(panic),
            };
        }

        debug!("Another fetch in progress, waiting");
        self.locks
            .wait_for_release(&lock_id, self.config.lock_wait, self.config.lock_poll)
            .await;

        let landed = self
            .get_cached_data(provider, ttl)
            .await
            .filter(|entry| !force || entry.fetched_at >= truncate_ms(started));
        if let Some(entry) = landed {
            debug!("Using result fetched by lock holder");
            return CachedUsage::cached(entry);
        }

        let entry = fetch().await;
        self.persist(provider, &entry).await;
        CachedUsage::fresh(entry)
    }

    async fn persist(&self, provider: ProviderKind, entry: &CacheEntry) {
        if entry.usage.is_expected_missing() {
            match self.remove_entry(provider).await {
                Ok(true) => debug!("Removed cache entry for unconfigured provider"),
                Ok(false) => {}
                Err(e) => warn!(error = %e, "Failed to remove cache entry"),
            }
        } else if entry.usage.has_usage_data() {
            if let Err(e) = self.set_entry(provider, entry.clone()).await {
                warn!(error = %e, "Failed to write cache entry");
            }
        } else {
            debug!("Fetch failed, keeping previous cache entry");
        }
    }
}

/// Lock id guarding one provider's fetch.
pub fn lock_id(provider: ProviderKind) -> String {
    format!("usage-{provider}")
}

/// Cache timestamps are stored with millisecond precision.
fn truncate_ms(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap_or(at)
}

// ============================================================================
// Tests
// ============================================================================
