//! Provider registry.
//!
//! Static access to provider descriptors plus the factory that turns a
//! [`ProviderKind`] into a [`UsageProvider`] capability object.

use quotabar_core::{ProviderKind, UsageProvider};
use quotabar_fetch::FetchContext;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock};

use crate::claude::{ClaudeProvider, claude_descriptor};
use crate::codex::{CodexProvider, codex_descriptor};
use crate::copilot::{CopilotProvider, copilot_descriptor};
use crate::descriptor::ProviderDescriptor;
use crate::gemini::{GeminiProvider, gemini_descriptor};
use crate::kiro::{KiroProvider, kiro_descriptor};
use crate::zai::{ZaiProvider, zai_descriptor};

/// Map of every registered provider, keyed by kind.
pub type ProviderMap = BTreeMap<ProviderKind, Arc<dyn UsageProvider>>;

// ============================================================================
// Static Registry
// ============================================================================

static DESCRIPTORS: OnceLock<Vec<ProviderDescriptor>> = OnceLock::new();

static CLI_NAME_MAP: OnceLock<HashMap<String, ProviderKind>> = OnceLock::new();

/// Registration order is the detection tie-break.
fn init_descriptors() -> Vec<ProviderDescriptor> {
    vec![
        codex_descriptor(),
        claude_descriptor(),
        gemini_descriptor(),
        copilot_descriptor(),
        zai_descriptor(),
        kiro_descriptor(),
    ]
}

fn build_cli_name_map(descriptors: &[ProviderDescriptor]) -> HashMap<String, ProviderKind> {
    let mut map = HashMap::new();
    for desc in descriptors {
        map.insert(desc.cli.name.to_string(), desc.id);
        for alias in desc.cli.aliases {
            map.insert((*alias).to_string(), desc.id);
        }
    }
    map
}

// ============================================================================
// Provider Registry
// ============================================================================

/// Global registry of provider descriptors.
pub struct ProviderRegistry;

impl ProviderRegistry {
    /// Returns all descriptors in registration order.
    pub fn all() -> &'static [ProviderDescriptor] {
        DESCRIPTORS.get_or_init(init_descriptors)
    }

    /// Gets a descriptor by kind.
    pub fn get(id: ProviderKind) -> Option<&'static ProviderDescriptor> {
        Self::all().iter().find(|d| d.id == id)
    }

    /// Looks up a descriptor by CLI name or alias, case-insensitively.
    pub fn get_by_cli_name(name: &str) -> Option<&'static ProviderDescriptor> {
        let map = CLI_NAME_MAP.get_or_init(|| build_cli_name_map(Self::all()));
        let kind = map.get(&name.trim().to_lowercase())?;
        Self::get(*kind)
    }

    /// Returns the number of registered providers.
    pub fn count() -> usize {
        Self::all().len()
    }

    /// Returns all provider kinds in registration order.
    pub fn kinds() -> Vec<ProviderKind> {
        Self::all().iter().map(|d| d.id).collect()
    }

    /// Builds every registered provider with a shared context.
    pub fn create_all(ctx: &FetchContext) -> ProviderMap {
        Self::kinds()
            .into_iter()
            .map(|kind| (kind, create_provider_with_context(kind, ctx)))
            .collect()
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Creates a provider with a default context. Performs no I/O.
pub fn create_provider(kind: ProviderKind) -> Arc<dyn UsageProvider> {
    create_provider_with_context(kind, &FetchContext::new())
}

/// Creates a provider sharing the given context. Performs no I/O.
pub fn create_provider_with_context(
    kind: ProviderKind,
    ctx: &FetchContext,
) -> Arc<dyn UsageProvider> {
    match kind {
        ProviderKind::Codex => Arc::new(CodexProvider::new(ctx)),
        ProviderKind::Claude => Arc::new(ClaudeProvider::new(ctx)),
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(ctx)),
        ProviderKind::Copilot => Arc::new(CopilotProvider::new(ctx)),
        ProviderKind::Zai => Arc::new(ZaiProvider::new(ctx)),
        ProviderKind::Kiro => Arc::new(KiroProvider::new(ctx)),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_registered_once() {
        assert_eq!(ProviderRegistry::count(), ProviderKind::all().len());
        for kind in ProviderKind::all() {
            let desc = ProviderRegistry::get(*kind).unwrap();
            assert_eq!(desc.id, *kind);
        }
    }

    #[test]
    fn test_registration_order() {
        assert_eq!(
            ProviderRegistry::kinds(),
            vec![
                ProviderKind::Codex,
                ProviderKind::Claude,
                ProviderKind::Gemini,
                ProviderKind::Copilot,
                ProviderKind::Zai,
                ProviderKind::Kiro,
            ]
        );
    }

    #[test]
    fn test_cli_name_and_aliases() {
        let lookup = |name| ProviderRegistry::get_by_cli_name(name).map(|d| d.id);
        assert_eq!(lookup("claude"), Some(ProviderKind::Claude));
        assert_eq!(lookup("openai"), Some(ProviderKind::Codex));
        assert_eq!(lookup("Anthropic"), Some(ProviderKind::Claude));
        assert_eq!(lookup("github"), Some(ProviderKind::Copilot));
        assert_eq!(lookup("glm"), Some(ProviderKind::Zai));
        assert_eq!(lookup("cursor"), None);
    }

    #[test]
    fn test_factory_matches_kind() {
        for kind in ProviderKind::all() {
            assert_eq!(create_provider(*kind).kind(), *kind);
        }
        let all = ProviderRegistry::create_all(&FetchContext::new());
        assert_eq!(all.len(), ProviderKind::all().len());
    }

    #[test]
    fn test_status_support_matches_descriptor() {
        for desc in ProviderRegistry::all() {
            let provider = create_provider(desc.id);
            assert_eq!(provider.supports_status(), desc.status_url.is_some());
        }
    }
}
