// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Quotabar Providers
//!
//! Provider registry, model detection, and the concrete adapters.
//!
//! | Provider | Source | Status page |
//! |----------|--------|-------------|
//! | Codex (OpenAI) | HTTP | yes |
//! | Claude (Anthropic) | HTTP | yes |
//! | Gemini (Google) | HTTP | no |
//! | Copilot (GitHub) | HTTP | yes |
//! | z.ai | HTTP | no |
//! | Kiro | CLI | no |
//!
//! Every adapter implements [`quotabar_core::UsageProvider`]; construction
//! performs no I/O and fetches never fail, they return a snapshot with
//! `error` set.

mod common;

pub mod descriptor;
pub mod detection;
pub mod registry;

// Provider modules (alphabetical)
pub mod claude;
pub mod codex;
pub mod copilot;
pub mod gemini;
pub mod kiro;
pub mod zai;

pub use descriptor::{CliConfig, DetectionTokens, ProviderDescriptor};
pub use detection::detect_provider_from_model;
pub use registry::{ProviderMap, ProviderRegistry, create_provider, create_provider_with_context};
