//! Provider-related types.
//!
//! This module contains types related to usage providers:
//! - [`ProviderKind`] - Enum of supported providers
//! - [`ModelInfo`] - Model descriptor supplied by the host session
//! - [`Credentials`] - Tokens handed to provider adapters

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

// ============================================================================
// Provider Kind
// ============================================================================

/// Supported provider kinds.
///
/// Declaration order is the registration order used as the detection
/// tie-break and the default cycling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI Codex
    Codex,
    /// Anthropic Claude
    Claude,
    /// Google Gemini
    Gemini,
    /// GitHub Copilot
    Copilot,
    /// z.ai
    Zai,
    /// Kiro
    Kiro,
}

impl ProviderKind {
    /// Returns the display name for this provider.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Codex => "Codex",
            Self::Claude => "Claude",
            Self::Gemini => "Gemini",
            Self::Copilot => "Copilot",
            Self::Zai => "z.ai",
            Self::Kiro => "Kiro",
        }
    }

    /// Returns all provider kinds in registration order.
    pub fn all() -> &'static [ProviderKind] {
        &[
            Self::Codex,
            Self::Claude,
            Self::Gemini,
            Self::Copilot,
            Self::Zai,
            Self::Kiro,
        ]
    }

    /// Returns the CLI name for this provider (lowercase, no spaces).
    ///
    /// This is also the key used in the cache file and settings.
    pub fn cli_name(&self) -> &'static str {
        match self {
            Self::Codex => "codex",
            Self::Claude => "claude",
            Self::Gemini => "gemini",
            Self::Copilot => "copilot",
            Self::Zai => "zai",
            Self::Kiro => "kiro",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cli_name())
    }
}

impl FromStr for ProviderKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.cli_name() == lower)
            .ok_or_else(|| CoreError::UnknownProvider(s.to_string()))
    }
}

// ============================================================================
// Model Info
// ============================================================================

/// Descriptor of the model the host session is currently using.
///
/// Both fields are free-form strings supplied by an external system,
/// e.g. `{ provider: "OpenAI", id: "gpt-5-codex" }`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Declared provider name of the model.
    #[serde(default)]
    pub provider: String,
    /// Model identifier.
    #[serde(default)]
    pub id: String,
}

impl ModelInfo {
    /// Creates a model descriptor.
    pub fn new(provider: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            id: id.into(),
        }
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Provider tokens supplied by the caller.
///
/// Quotabar never persists credentials; the host assembles this value
/// (typically from environment variables) and passes it to providers.
#[derive(Clone, Default)]
pub struct Credentials {
    tokens: HashMap<ProviderKind, String>,
}

impl Credentials {
    /// Creates an empty credential set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a token for a provider, builder style.
    #[must_use]
    pub fn with_token(mut self, provider: ProviderKind, token: impl Into<String>) -> Self {
        self.insert(provider, token);
        self
    }

    /// Sets the token for a provider.
    pub fn insert(&mut self, provider: ProviderKind, token: impl Into<String>) {
        self.tokens.insert(provider, token.into());
    }

    /// Returns the token for a provider, ignoring blank values.
    pub fn token(&self, provider: ProviderKind) -> Option<&str> {
        self.tokens
            .get(&provider)
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
    }

    /// Returns true if a non-blank token exists for the provider.
    pub fn has_token(&self, provider: ProviderKind) -> bool {
        self.token(provider).is_some()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut providers: Vec<_> = self.tokens.keys().collect();
        providers.sort();
        f.debug_struct("Credentials")
            .field("providers", &providers)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
