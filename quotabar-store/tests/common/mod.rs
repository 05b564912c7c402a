//! Shared fixtures for store integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use quotabar_core::{
    Credentials, ProviderKind, ProviderStatus, RateWindow, UsageError, UsageProvider,
    UsageSnapshot,
};
use quotabar_providers::ProviderMap;
use quotabar_store::{CacheStore, Settings, SettingsStore, StoreConfig, UsageOrchestrator};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;

// ============================================================================
// Mock Provider
// ============================================================================

/// Provider returning scripted snapshots and counting calls.
pub struct MockProvider {
    kind: ProviderKind,
    script: Mutex<VecDeque<UsageSnapshot>>,
    fallback: Mutex<UsageSnapshot>,
    delay: Duration,
    credentials: Option<bool>,
    status: Option<ProviderStatus>,
    pub calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    gauge: Arc<Gauge>,
    started: Mutex<Option<Instant>>,
}

/// Tracks concurrent fetches, optionally shared across providers.
#[derive(Default)]
pub struct Gauge {
    in_flight: AtomicUsize,
    max: AtomicUsize,
}

impl Gauge {
    pub fn max(&self) -> usize {
        self.max.load(Ordering::SeqCst)
    }
}

impl MockProvider {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(usage(kind, 10.0)),
            delay: Duration::ZERO,
            credentials: None,
            status: None,
            calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            gauge: Arc::default(),
            started: Mutex::new(None),
        }
    }

    /// Every fetch returns `snapshot` unless scripted otherwise.
    pub fn returning(self, snapshot: UsageSnapshot) -> Self {
        *self.fallback.lock().unwrap() = snapshot;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_credentials(mut self, present: bool) -> Self {
        self.credentials = Some(present);
        self
    }

    pub fn with_status(mut self, status: ProviderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_gauge(mut self, gauge: &Arc<Gauge>) -> Self {
        self.gauge = Arc::clone(gauge);
        self
    }

    /// Queues a one-off response.
    pub fn push(&self, snapshot: UsageSnapshot) {
        self.script.lock().unwrap().push_back(snapshot);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    /// When the first fetch began.
    pub fn started_at(&self) -> Option<Instant> {
        *self.started.lock().unwrap()
    }
}

#[async_trait]
impl UsageProvider for MockProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn fetch_usage(&self, _credentials: &Credentials) -> UsageSnapshot {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.lock().unwrap().get_or_insert_with(Instant::now);
        let now = self.gauge.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.gauge.max.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.gauge.in_flight.fetch_sub(1, Ordering::SeqCst);

        let scripted = self.script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| self.fallback.lock().unwrap().clone())
    }

    fn supports_status(&self) -> bool {
        self.status.is_some()
    }

    async fn fetch_status(&self) -> Option<ProviderStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.status.clone()
    }

    fn has_credentials(&self, _credentials: &Credentials) -> Option<bool> {
        self.credentials
    }
}

// ============================================================================
// Snapshots
// ============================================================================

pub fn usage(kind: ProviderKind, percent: f64) -> UsageSnapshot {
    UsageSnapshot::new(kind).with_windows(vec![RateWindow::new("5h", percent)])
}

pub fn no_credentials(kind: ProviderKind) -> UsageSnapshot {
    UsageSnapshot::from_error(kind, UsageError::no_credentials("no token"))
}

pub fn http_error(kind: ProviderKind, status: u16) -> UsageSnapshot {
    UsageSnapshot::from_error(kind, UsageError::http(status, "server error"))
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub dir: TempDir,
    pub cache: Arc<CacheStore>,
    pub settings: Arc<SettingsStore>,
    pub orchestrator: Arc<UsageOrchestrator>,
}

/// Settings with no refresh floors so every forced refresh fetches.
pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.behavior.min_refresh_interval = Duration::ZERO;
    settings.status_refresh.min_refresh_interval = Duration::ZERO;
    settings
}

pub fn store_config(dir: &TempDir) -> StoreConfig {
    StoreConfig::in_dir(dir.path()).with_lock_wait(Duration::from_millis(2000), Duration::from_millis(10))
}

pub fn harness(providers: &[Arc<MockProvider>]) -> Harness {
    harness_with(providers, test_settings())
}

pub fn harness_with(providers: &[Arc<MockProvider>], settings: Settings) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(CacheStore::new(store_config(&dir)));
    let settings = Arc::new(SettingsStore::new(settings));

    let map: ProviderMap = providers
        .iter()
        .map(|p| (p.kind(), Arc::clone(p) as Arc<dyn UsageProvider>))
        .collect();
    let orchestrator = Arc::new(UsageOrchestrator::new(
        Arc::clone(&cache),
        map,
        Arc::clone(&settings),
        Credentials::new(),
    ));

    Harness {
        dir,
        cache,
        settings,
        orchestrator,
    }
}
