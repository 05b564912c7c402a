//! Host APIs for provider adapters.
//!
//! - [`http`] - HTTP client with tracing, timeout, and domain allowlist
//! - [`process`] - Subprocess execution for CLI tools
//! - [`status`] - Status page polling (statuspage.io)

pub mod http;
pub mod process;
pub mod status;

// Re-export key types
pub use http::HttpClient;
pub use process::{ProcessOutput, ProcessRunner};
pub use status::StatusPoller;
