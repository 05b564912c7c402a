//! Infers the active provider from model metadata.

use quotabar_core::{ModelInfo, ProviderKind};

use crate::registry::ProviderRegistry;

/// Maps a model descriptor to a provider.
///
/// Pass one matches the model's declared provider string against each
/// provider's provider tokens. Pass two matches the model id against model
/// tokens. The first provider in registration order wins; `None` means no
/// match.
pub fn detect_provider_from_model(model: &ModelInfo) -> Option<ProviderKind> {
    let provider = model.provider.trim().to_lowercase();
    if !provider.is_empty() {
        let hit = ProviderRegistry::all().iter().find(|desc| {
            desc.detection
                .provider
                .iter()
                .any(|token| provider.contains(token))
        });
        if let Some(desc) = hit {
            return Some(desc.id);
        }
    }

    let id = model.id.trim().to_lowercase();
    if id.is_empty() {
        return None;
    }
    ProviderRegistry::all()
        .iter()
        .find(|desc| {
            desc.detection
                .model
                .iter()
                .any(|token| model_token_matches(&id, token))
        })
        .map(|desc| desc.id)
}

/// Short tokens ("o1", "o3") only match at the start of an id segment so
/// that "gpt-4o" or "claude-3-opus" do not trigger them.
fn model_token_matches(id: &str, token: &str) -> bool {
    if token.len() > 2 {
        return id.contains(token);
    }
    id.split(|c: char| matches!(c, '-' | '/' | ':' | '.' | '_' | ' '))
        .any(|segment| segment.starts_with(token))
}
