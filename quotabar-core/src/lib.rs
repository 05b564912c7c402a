// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Quotabar Core
//!
//! Core types, models, and traits shared by every Quotabar crate.
//!
//! ## Key Types
//!
//! ### Provider Types
//! - [`ProviderKind`] - Enum of all supported providers
//! - [`ModelInfo`] - Externally supplied model descriptor used for detection
//! - [`Credentials`] - Caller-supplied provider tokens
//!
//! ### Usage Types
//! - [`UsageSnapshot`] - Result of asking one provider for usage
//! - [`RateWindow`] - One quota bucket
//! - [`UsageError`] / [`UsageErrorCode`] - Failure taxonomy carried as data
//!
//! ### Status
//! - [`ProviderStatus`] - External service health
//! - [`StatusIndicator`] - Status indicator levels
//!
//! ### Capability
//! - [`UsageProvider`] - The trait every provider adapter implements

pub mod error;
pub mod models;
pub mod traits;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{
    // Provider types
    Credentials,
    ModelInfo,
    ProviderKind,
    // Usage types
    RateWindow,
    UsageError,
    UsageErrorCode,
    UsageSnapshot,
    // Status
    ProviderStatus,
    StatusIndicator,
};

// Re-export traits
pub use traits::UsageProvider;
