// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Quotabar Store
//!
//! Usage caching and coordination.
//!
//! - **Lock**: advisory file locks with staleness override
//! - **Cache**: cross-process usage cache with listeners and
//!   fetch-with-cache
//! - **Orchestrator**: enablement, refresh floors, status policy, and
//!   bounded batch fetches
//! - **Controller**: provider resolution, refresh with fallback, cycling
//! - **Settings**: user settings loaded from disk
//!
//! ## Usage
//!
//! ```ignore
//! use quotabar_store::{CacheStore, SettingsStore, StoreConfig, UsageController, UsageOrchestrator};
//! use quotabar_providers::ProviderRegistry;
//! use quotabar_fetch::FetchContext;
//!
//! let cache = Arc::new(CacheStore::new(StoreConfig::default()));
//! let settings = Arc::new(SettingsStore::load_default().await);
//! let providers = ProviderRegistry::create_all(&FetchContext::new());
//! let orchestrator = Arc::new(UsageOrchestrator::new(cache, providers, settings, credentials));
//!
//! let controller = UsageController::new(orchestrator);
//! let mut updates = controller.subscribe();
//! controller.refresh(false).await;
//! ```

pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod lock;
pub mod orchestrator;
pub mod persistence;
pub mod settings;

pub use cache::{CacheEntry, CacheListener, CacheStore, CachedUsage, ListenerId, UsageCache};
pub use config::StoreConfig;
pub use controller::{ControllerAction, UsageController, UsageControllerState, UsageUpdate};
pub use error::StoreError;
pub use lock::LockManager;
pub use orchestrator::{FetchOptions, MAX_CONCURRENT_FETCHES, UsageOrchestrator};
pub use persistence::{
    default_cache_dir, default_cache_path, default_config_dir, default_lock_dir,
    default_settings_path, load_json,
};
pub use settings::{EnabledMode, ProviderSettings, RefreshSettings, Settings, SettingsStore};
