//! Domain models for Quotabar.
//!
//! ## Submodules
//!
//! - [`provider`] - Provider identity, model descriptors, credentials
//! - [`usage`] - Usage snapshots and rate windows
//! - [`usage_error`] - Error taxonomy carried inside snapshots
//! - [`status`] - Provider service status

mod provider;
mod status;
mod usage;
mod usage_error;

// Re-export everything at the models level
pub use provider::{Credentials, ModelInfo, ProviderKind};
pub use status::{ProviderStatus, StatusIndicator};
pub use usage::{RateWindow, UsageSnapshot};
pub use usage_error::{UsageError, UsageErrorCode};
