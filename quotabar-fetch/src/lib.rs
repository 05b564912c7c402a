// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Quotabar Fetch
//!
//! Host plumbing shared by provider adapters.
//!
//! ## Host APIs
//!
//! - [`host::http`] - HTTP client with tracing, a hard timeout, and domain allowlist
//! - [`host::process`] - Subprocess execution for CLI tools
//! - [`host::status`] - Status page polling (statuspage.io)
//!
//! ## Errors
//!
//! Adapters work with [`FetchError`] internally and convert it into the
//! usage error taxonomy with [`FetchError::to_usage_error`] before
//! returning a snapshot. Timeouts always classify as `TIMEOUT`.
//!
//! ## Example
//!
//! ```ignore
//! use quotabar_fetch::FetchContext;
//!
//! let ctx = FetchContext::new();
//! let body: serde_json::Value = ctx.http.get_json(url, headers).await?;
//! ```

pub mod context;
pub mod error;
pub mod host;

// Errors
pub use error::{FetchError, HttpError, ProcessError, StatusError};

// Host APIs
pub use host::{
    http::{HttpClient, bearer_headers},
    process::{ProcessOutput, ProcessRunner},
    status::StatusPoller,
};

// Context
pub use context::{FetchContext, FetchContextBuilder, FetchSettings};
