//! Session-level usage controller.
//!
//! Resolves which provider to show, refreshes it through the
//! orchestrator, keeps showing the last good numbers when a fetch fails,
//! and cycles through providers on request. Every transition is broadcast
//! as a [`UsageUpdate`]; a refresh emits an optimistic update from the
//! cache when the provider changes, then the authoritative one.

use quotabar_core::{ModelInfo, ProviderKind, ProviderStatus, UsageSnapshot};
use quotabar_providers::detect_provider_from_model;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument};

use crate::orchestrator::{FetchOptions, UsageOrchestrator};

/// Capacity of the update channel.
const UPDATE_CHANNEL_CAPACITY: usize = 64;

// ============================================================================
// State, Updates, Actions
// ============================================================================

/// Per-session working state. Not persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageControllerState {
    /// Provider being shown.
    pub current_provider: Option<ProviderKind>,
    /// Last displayed snapshot, possibly carrying a synthesized status.
    pub cached_usage: Option<UsageSnapshot>,
    /// User-forced provider.
    pub pinned_provider: Option<ProviderKind>,
    /// Rotation cursor into the enabled-provider sequence.
    pub provider_cycle_index: Option<usize>,
}

/// Event broadcast on every transition.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageUpdate {
    /// Provider shown, or `None` when idle.
    pub provider: Option<ProviderKind>,
    /// Snapshot shown.
    pub usage: Option<UsageSnapshot>,
}

impl UsageUpdate {
    /// The idle update.
    pub fn idle() -> Self {
        Self {
            provider: None,
            usage: None,
        }
    }
}

/// Requests accepted by [`UsageController::handle`].
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerAction {
    /// Refresh the resolved provider.
    Refresh {
        /// Bypass the usage TTL.
        force: bool,
    },
    /// Move to the next provider with usable data.
    Cycle,
    /// Pin a provider, or unpin with `None`, then refresh.
    Pin(Option<ProviderKind>),
    /// Set the active model used for detection, then refresh.
    SetModel(Option<ModelInfo>),
}

// ============================================================================
// Controller
// ============================================================================

/// Usage controller for one session.
#[derive(Debug)]
pub struct UsageController {
    orchestrator: Arc<UsageOrchestrator>,
    state: Mutex<UsageControllerState>,
    model: Mutex<Option<ModelInfo>>,
    updates: broadcast::Sender<UsageUpdate>,
}

impl UsageController {
    /// Creates a controller. Performs no I/O.
    pub fn new(orchestrator: Arc<UsageOrchestrator>) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            orchestrator,
            state: Mutex::new(UsageControllerState::default()),
            model: Mutex::new(None),
            updates,
        }
    }

    /// Returns the orchestrator.
    pub fn orchestrator(&self) -> &Arc<UsageOrchestrator> {
        &self.orchestrator
    }

    /// Subscribes to updates.
    pub fn subscribe(&self) -> broadcast::Receiver<UsageUpdate> {
        self.updates.subscribe()
    }

    /// Returns a copy of the current state.
    pub fn state(&self) -> UsageControllerState {
        self.lock_state().clone()
    }

    /// Returns the update describing the current state.
    pub fn current_update(&self) -> UsageUpdate {
        let state = self.lock_state();
        UsageUpdate {
            provider: state.current_provider,
            usage: state.cached_usage.clone(),
        }
    }

    /// Sets the active model used for auto-detection.
    pub fn set_model(&self, model: Option<ModelInfo>) {
        *self.model.lock().unwrap_or_else(PoisonError::into_inner) = model;
    }

    /// Pins a provider, or clears the pin.
    pub fn pin(&self, provider: Option<ProviderKind>) {
        self.lock_state().pinned_provider = provider;
    }

    /// Applies an action and returns the resulting update.
    pub async fn handle(&self, action: ControllerAction) -> UsageUpdate {
        match action {
            ControllerAction::Refresh { force } => self.refresh(force).await,
            ControllerAction::Cycle => {
                self.cycle_provider().await;
                self.current_update()
            }
            ControllerAction::Pin(provider) => {
                self.pin(provider);
                self.refresh(false).await
            }
            ControllerAction::SetModel(model) => {
                self.set_model(model);
                self.refresh(false).await
            }
        }
    }

    // ========================================================================
    // Resolve
    // ========================================================================

    /// Pinned > default > detected from the model > none. Only enabled
    /// providers are eligible.
    pub async fn resolve_provider(&self) -> Option<ProviderKind> {
        let enabled = self.orchestrator.enabled_providers().await;
        let available = |kind: &ProviderKind| enabled.contains(kind);

        if let Some(pinned) = self.lock_state().pinned_provider.filter(available) {
            return Some(pinned);
        }

        let settings = self.orchestrator.settings().get().await;
        if let Some(default) = settings.default_provider_kind().filter(available) {
            return Some(default);
        }

        if settings.auto_detect_provider {
            let model = self
                .model
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            return model
                .as_ref()
                .and_then(detect_provider_from_model)
                .filter(available);
        }
        None
    }

    // ========================================================================
    // Refresh
    // ========================================================================

    /// Refreshes the resolved provider and returns the authoritative update.
    #[instrument(skip(self))]
    pub async fn refresh(&self, force: bool) -> UsageUpdate {
        let Some(provider) = self.resolve_provider().await else {
            debug!("No provider resolved, going idle");
            *self.lock_state() = UsageControllerState::default();
            return self.emit(UsageUpdate::idle());
        };

        let changed = {
            let mut state = self.lock_state();
            let changed = state.current_provider != Some(provider);
            if changed {
                state.current_provider = Some(provider);
                state.cached_usage = None;
            }
            changed
        };

        if changed {
            info!(provider = %provider, "Active provider changed");
            let optimistic = self
                .orchestrator
                .cache()
                .get_entry(provider)
                .await
                .map(|entry| entry.merged_usage());
            self.lock_state().cached_usage.clone_from(&optimistic);
            self.emit(UsageUpdate {
                provider: Some(provider),
                usage: optimistic,
            });
        }

        let options = FetchOptions {
            force,
            force_status: false,
        };
        let fetched = self
            .orchestrator
            .fetch_usage_for_provider(provider, options)
            .await
            .map(|result| result.entry.merged_usage());

        let usage = match fetched {
            Some(fresh) => Some(self.with_fallback(provider, fresh).await),
            None => None,
        };

        self.lock_state().cached_usage.clone_from(&usage);
        self.emit(UsageUpdate {
            provider: Some(provider),
            usage,
        })
    }

    /// On a real fetch failure, redisplays the last snapshot that had
    /// windows, tagged with the new error and a "Fetch failed" status.
    async fn with_fallback(&self, provider: ProviderKind, fresh: UsageSnapshot) -> UsageSnapshot {
        let Some(error) = fresh.error.clone() else {
            return fresh;
        };
        if error.is_expected_missing() || fresh.has_windows() {
            return fresh;
        }

        let in_memory = self
            .lock_state()
            .cached_usage
            .clone()
            .filter(|u| u.provider == provider && u.has_windows());
        let previous = match in_memory {
            Some(usage) => Some(usage),
            None => self
                .orchestrator
                .cache()
                .get_entry(provider)
                .await
                .map(|entry| entry.merged_usage())
                .filter(UsageSnapshot::has_windows),
        };

        match previous {
            Some(previous) => {
                debug!(provider = %provider, error = %error, "Showing last good usage");
                previous
                    .with_error(error)
                    .with_status(Some(ProviderStatus::fetch_failed()))
            }
            None => fresh,
        }
    }

    // ========================================================================
    // Cycle
    // ========================================================================

    /// Places the cycle cursor on `provider`, so the next cycle starts just
    /// after it. Providers that are not enabled reset the cursor.
    pub async fn seed_cycle(&self, provider: ProviderKind) {
        let enabled = self.orchestrator.enabled_providers().await;
        self.lock_state().provider_cycle_index = enabled.iter().position(|&k| k == provider);
    }

    /// Advances to the next enabled provider with usable data, pinning it.
    ///
    /// Probes each provider once, starting after the current cycle index.
    /// If none has usable data, pinning and provider state are cleared.
    #[instrument(skip(self))]
    pub async fn cycle_provider(&self) -> Option<ProviderKind> {
        let enabled = self.orchestrator.enabled_providers().await;
        let start = self
            .lock_state()
            .provider_cycle_index
            .map_or(0, |i| i + 1);

        for offset in 0..enabled.len() {
            let index = (start + offset) % enabled.len();
            let kind = enabled[index];
            let Some(result) = self
                .orchestrator
                .fetch_usage_for_provider(kind, FetchOptions::default())
                .await
            else {
                continue;
            };

            if !result.entry.usage.is_usable() {
                debug!(provider = %kind, "Skipping provider without usable data");
                continue;
            }

            let usage = result.entry.merged_usage();
            {
                let mut state = self.lock_state();
                state.pinned_provider = Some(kind);
                state.current_provider = Some(kind);
                state.provider_cycle_index = Some(index);
                state.cached_usage = Some(usage.clone());
            }
            info!(provider = %kind, "Cycled to provider");
            self.emit(UsageUpdate {
                provider: Some(kind),
                usage: Some(usage),
            });
            return Some(kind);
        }

        info!("No provider has usable data");
        *self.lock_state() = UsageControllerState::default();
        self.emit(UsageUpdate::idle());
        None
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn lock_state(&self) -> MutexGuard<'_, UsageControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, update: UsageUpdate) -> UsageUpdate {
        // No receivers is fine.
        let _ = self.updates.send(update.clone());
        update
    }
}
