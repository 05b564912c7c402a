//! Provider descriptor system.
//!
//! A descriptor contains the static configuration for a provider:
//! - CLI name and aliases
//! - Default environment variable for its token
//! - Status page endpoint
//! - Detection tokens used to infer the provider from model metadata

use quotabar_core::ProviderKind;

// ============================================================================
// Provider Descriptor
// ============================================================================

/// Static configuration for a provider.
#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    /// Provider identifier.
    pub id: ProviderKind,
    /// CLI naming.
    pub cli: CliConfig,
    /// Environment variable read for the token when settings name none.
    pub token_env: Option<&'static str>,
    /// statuspage.io `status.json` endpoint, if the provider has one.
    pub status_url: Option<&'static str>,
    /// Tokens used by model detection.
    pub detection: DetectionTokens,
}

impl ProviderDescriptor {
    /// Returns the display name.
    pub fn display_name(&self) -> &'static str {
        self.id.display_name()
    }

    /// Returns the CLI name.
    pub fn cli_name(&self) -> &'static str {
        self.cli.name
    }
}

// ============================================================================
// CLI Config
// ============================================================================

/// CLI naming for a provider.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Primary CLI name.
    pub name: &'static str,
    /// Alternative names accepted on the command line.
    pub aliases: &'static [&'static str],
}

// ============================================================================
// Detection Tokens
// ============================================================================

/// Lowercase tokens matched against a model descriptor.
#[derive(Debug, Clone)]
pub struct DetectionTokens {
    /// Matched against the model's declared provider string.
    pub provider: &'static [&'static str],
    /// Matched against the model id when no provider token matched.
    pub model: &'static [&'static str],
}
