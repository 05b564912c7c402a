//! User settings consumed by the orchestrator and controller.
//!
//! ```json
//! {
//!   "providers": {"claude": {"enabled": "auto", "fetchStatus": true}, "kiro": {"enabled": false}},
//!   "behavior": {"refreshInterval": 60, "minRefreshInterval": 30},
//!   "statusRefresh": {"refreshInterval": 300, "minRefreshInterval": 60},
//!   "providerOrder": ["claude", "codex"],
//!   "defaultProvider": null,
//!   "autoDetectProvider": true
//! }
//! ```

use quotabar_core::ProviderKind;
use quotabar_providers::ProviderRegistry;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::persistence::{default_settings_path, load_json};

// ============================================================================
// Enabled Mode
// ============================================================================

/// Whether a provider participates.
///
/// On disk: `"auto"`, `true`, or `false` (`"enabled"`/`"disabled"` are
/// also accepted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnabledMode {
    /// Enabled when the provider reports credentials.
    #[default]
    Auto,
    /// Always enabled.
    Enabled,
    /// Never enabled.
    Disabled,
}

impl Serialize for EnabledMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            EnabledMode::Auto => serializer.serialize_str("auto"),
            EnabledMode::Enabled => serializer.serialize_bool(true),
            EnabledMode::Disabled => serializer.serialize_bool(false),
        }
    }
}

impl<'de> Deserialize<'de> for EnabledMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bool(bool),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Bool(true) => Ok(EnabledMode::Enabled),
            Raw::Bool(false) => Ok(EnabledMode::Disabled),
            Raw::Text(s) => match s.to_lowercase().as_str() {
                "auto" => Ok(EnabledMode::Auto),
                "enabled" | "true" | "on" => Ok(EnabledMode::Enabled),
                "disabled" | "false" | "off" => Ok(EnabledMode::Disabled),
                other => Err(serde::de::Error::custom(format!(
                    "invalid enabled mode: {other}"
                ))),
            },
        }
    }
}

// ============================================================================
// Refresh Settings
// ============================================================================

/// A refresh clock: TTL plus a floor that even forced refreshes respect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSettings {
    /// Age after which cached data is stale.
    #[serde(with = "duration_secs")]
    pub refresh_interval: Duration,
    /// Minimum time between fetches.
    #[serde(with = "duration_secs")]
    pub min_refresh_interval: Duration,
}

impl RefreshSettings {
    /// Creates refresh settings.
    pub fn new(refresh_interval: Duration, min_refresh_interval: Duration) -> Self {
        Self {
            refresh_interval,
            min_refresh_interval,
        }
    }

    /// Usage defaults: 60 s TTL, 30 s floor.
    pub fn usage_default() -> Self {
        Self::new(Duration::from_secs(60), Duration::from_secs(30))
    }

    /// Status defaults: 300 s TTL, 60 s floor.
    pub fn status_default() -> Self {
        Self::new(Duration::from_secs(300), Duration::from_secs(60))
    }
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self::usage_default()
    }
}

/// Durations as (possibly fractional) seconds.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        if d.subsec_nanos() == 0 {
            s.serialize_u64(d.as_secs())
        } else {
            s.serialize_f64(d.as_secs_f64())
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Provider Settings
// ============================================================================

/// Per-provider settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderSettings {
    /// Enablement.
    pub enabled: EnabledMode,
    /// Whether to poll the provider's status page.
    pub fetch_status: bool,
    /// Environment variable holding the provider token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            enabled: EnabledMode::Auto,
            fetch_status: true,
            api_key_env: None,
        }
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Settings read by the usage subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Per-provider settings keyed by provider id.
    pub providers: BTreeMap<String, ProviderSettings>,
    /// Usage refresh clock.
    pub behavior: RefreshSettings,
    /// Status refresh clock.
    pub status_refresh: RefreshSettings,
    /// Preferred provider order; unknown ids are ignored.
    pub provider_order: Vec<String>,
    /// Provider shown when none is pinned.
    pub default_provider: Option<String>,
    /// Infer the provider from the active model.
    pub auto_detect_provider: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            providers: BTreeMap::new(),
            behavior: RefreshSettings::usage_default(),
            status_refresh: RefreshSettings::status_default(),
            provider_order: Vec::new(),
            default_provider: None,
            auto_detect_provider: true,
        }
    }
}

impl Settings {
    /// Returns a provider's settings, falling back to defaults.
    pub fn provider(&self, kind: ProviderKind) -> ProviderSettings {
        self.providers
            .iter()
            .find(|(key, _)| key.parse::<ProviderKind>().is_ok_and(|k| k == kind))
            .map(|(_, settings)| settings.clone())
            .unwrap_or_default()
    }

    /// Mutable access to a provider's settings, creating them if absent.
    pub fn provider_mut(&mut self, kind: ProviderKind) -> &mut ProviderSettings {
        let key = self
            .providers
            .keys()
            .find(|key| key.parse::<ProviderKind>().is_ok_and(|k| k == kind))
            .cloned()
            .unwrap_or_else(|| kind.to_string());
        self.providers.entry(key).or_default()
    }

    /// Parsed default provider, if set and known.
    pub fn default_provider_kind(&self) -> Option<ProviderKind> {
        self.default_provider.as_deref()?.parse().ok()
    }

    /// Environment variable to read a provider's token from.
    pub fn credential_env(&self, kind: ProviderKind) -> Option<String> {
        self.provider(kind).api_key_env.or_else(|| {
            ProviderRegistry::get(kind)
                .and_then(|d| d.token_env)
                .map(str::to_string)
        })
    }

    /// Orders `registered` by `provider_order` (deduplicated, unknown ids
    /// skipped) followed by the rest in registration order.
    pub fn ordered(&self, registered: &[ProviderKind]) -> Vec<ProviderKind> {
        let mut ordered = Vec::with_capacity(registered.len());
        for name in &self.provider_order {
            if let Ok(kind) = name.parse::<ProviderKind>() {
                if registered.contains(&kind) && !ordered.contains(&kind) {
                    ordered.push(kind);
                }
            }
        }
        for kind in registered {
            if !ordered.contains(kind) {
                ordered.push(*kind);
            }
        }
        ordered
    }
}

// ============================================================================
// Settings Store
// ============================================================================

/// Read-mostly settings shared by the orchestrator and controller.
#[derive(Debug)]
pub struct SettingsStore {
    settings: Arc<RwLock<Settings>>,
}

impl SettingsStore {
    /// Creates a store holding `settings`.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Arc::new(RwLock::new(settings)),
        }
    }

    /// Loads settings from the default path.
    pub async fn load_default() -> Self {
        Self::load(&default_settings_path()).await
    }

    /// Loads settings from a path. Missing or malformed files yield
    /// defaults.
    pub async fn load(path: &Path) -> Self {
        let settings = match load_json::<Settings>(path).await {
            Ok(settings) => {
                info!(path = %path.display(), "Loaded settings");
                settings
            }
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Settings file not found, using defaults");
                Settings::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load settings, using defaults");
                Settings::default()
            }
        };
        Self::new(settings)
    }

    /// Gets a copy of the current settings.
    pub async fn get(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Applies an in-memory change, e.g. a pinned default from the host.
    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        f(&mut *self.settings.write().await);
    }
}

// ============================================================================
// Tests
// ============================================================================
