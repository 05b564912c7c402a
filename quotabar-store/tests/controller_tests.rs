//! Provider resolution, fallback, cycling, and update emission.

mod common;

use common::{MockProvider, harness, harness_with, http_error, no_credentials, test_settings, usage};
use quotabar_core::{ModelInfo, ProviderKind, ProviderStatus, UsageErrorCode};
use quotabar_store::{ControllerAction, UsageController, UsageControllerState, UsageUpdate};
use std::sync::Arc;
use tokio::sync::broadcast::error::TryRecvError;

fn with_default(kind: ProviderKind) -> quotabar_store::Settings {
    let mut settings = test_settings();
    settings.default_provider = Some(kind.to_string());
    settings
}

#[tokio::test]
async fn test_missing_credentials_deletes_prior_entry() {
    let claude = Arc::new(MockProvider::new(ProviderKind::Claude));
    let h = harness_with(&[Arc::clone(&claude)], with_default(ProviderKind::Claude));
    let controller = UsageController::new(Arc::clone(&h.orchestrator));

    let first = controller.refresh(false).await;
    assert_eq!(first.provider, Some(ProviderKind::Claude));
    assert!(h.cache.get_entry(ProviderKind::Claude).await.is_some());

    claude.push(no_credentials(ProviderKind::Claude));
    let update = controller.refresh(true).await;

    let usage = update.usage.unwrap();
    assert_eq!(usage.error.unwrap().code, UsageErrorCode::NoCredentials);
    assert!(usage.windows.is_empty());
    assert!(h.cache.get_entry(ProviderKind::Claude).await.is_none());
}

#[tokio::test]
async fn test_http_failure_keeps_last_good_windows() {
    let claude = Arc::new(MockProvider::new(ProviderKind::Claude));
    let h = harness_with(&[Arc::clone(&claude)], with_default(ProviderKind::Claude));
    let controller = UsageController::new(Arc::clone(&h.orchestrator));

    controller.refresh(false).await;
    claude.push(http_error(ProviderKind::Claude, 500));
    let update = controller.refresh(true).await;

    let usage = update.usage.unwrap();
    assert_eq!(usage.windows.len(), 1);
    assert_eq!(usage.windows[0].used_percent, 10.0);
    let error = usage.error.as_ref().unwrap();
    assert_eq!(error.code, UsageErrorCode::HttpError);
    assert_eq!(error.http_status, Some(500));
    assert_eq!(usage.status, Some(ProviderStatus::fetch_failed()));

    // The disk entry is untouched.
    let stored = h.cache.get_entry(ProviderKind::Claude).await.unwrap();
    assert!(stored.usage.error.is_none());
    assert_eq!(controller.state().cached_usage, Some(usage));
}

#[tokio::test]
async fn test_http_failure_falls_back_to_disk() {
    let claude = Arc::new(MockProvider::new(ProviderKind::Claude));
    let h = harness_with(&[Arc::clone(&claude)], with_default(ProviderKind::Claude));

    // A previous session cached good data.
    UsageController::new(Arc::clone(&h.orchestrator))
        .refresh(false)
        .await;

    let controller = UsageController::new(Arc::clone(&h.orchestrator));
    claude.push(http_error(ProviderKind::Claude, 502));
    let update = controller.refresh(true).await;

    let usage = update.usage.unwrap();
    assert_eq!(usage.windows[0].used_percent, 10.0);
    assert_eq!(usage.error.unwrap().http_status, Some(502));
}

#[tokio::test]
async fn test_http_failure_without_history_shows_error() {
    let claude = Arc::new(
        MockProvider::new(ProviderKind::Claude).returning(http_error(ProviderKind::Claude, 500)),
    );
    let h = harness_with(&[Arc::clone(&claude)], with_default(ProviderKind::Claude));
    let controller = UsageController::new(Arc::clone(&h.orchestrator));

    let usage = controller.refresh(false).await.usage.unwrap();
    assert!(usage.windows.is_empty());
    assert!(usage.status.is_none());
    assert_eq!(usage.error.unwrap().http_status, Some(500));
}

#[tokio::test]
async fn test_cycle_lands_on_first_usable_provider() {
    let codex = Arc::new(
        MockProvider::new(ProviderKind::Codex).returning(no_credentials(ProviderKind::Codex)),
    );
    let claude = Arc::new(
        MockProvider::new(ProviderKind::Claude).returning(no_credentials(ProviderKind::Claude)),
    );
    let gemini = Arc::new(
        MockProvider::new(ProviderKind::Gemini).returning(usage(ProviderKind::Gemini, 42.0)),
    );
    let h = harness(&[codex, claude, gemini]);
    let controller = UsageController::new(Arc::clone(&h.orchestrator));

    assert_eq!(controller.cycle_provider().await, Some(ProviderKind::Gemini));
    let state = controller.state();
    assert_eq!(state.pinned_provider, Some(ProviderKind::Gemini));
    assert_eq!(state.current_provider, Some(ProviderKind::Gemini));
    assert_eq!(state.provider_cycle_index, Some(2));
    assert_eq!(
        state.cached_usage.unwrap().windows[0].used_percent,
        42.0
    );

    // Wraps around to the same provider.
    let update = controller.handle(ControllerAction::Cycle).await;
    assert_eq!(update.provider, Some(ProviderKind::Gemini));
    assert_eq!(controller.state().provider_cycle_index, Some(2));
}

#[tokio::test]
async fn test_seeded_cycle_continues_after_provider() {
    let providers: Vec<Arc<MockProvider>> =
        [ProviderKind::Codex, ProviderKind::Claude, ProviderKind::Gemini]
            .into_iter()
            .map(|kind| Arc::new(MockProvider::new(kind)))
            .collect();
    let h = harness(&providers);

    let controller = UsageController::new(Arc::clone(&h.orchestrator));
    controller.seed_cycle(ProviderKind::Claude).await;
    assert_eq!(controller.cycle_provider().await, Some(ProviderKind::Gemini));

    let controller = UsageController::new(Arc::clone(&h.orchestrator));
    controller.seed_cycle(ProviderKind::Gemini).await;
    assert_eq!(controller.cycle_provider().await, Some(ProviderKind::Codex));

    // Not registered, so rotation starts from the top.
    let controller = UsageController::new(Arc::clone(&h.orchestrator));
    controller.seed_cycle(ProviderKind::Kiro).await;
    assert_eq!(controller.state().provider_cycle_index, None);
    assert_eq!(controller.cycle_provider().await, Some(ProviderKind::Codex));
}

#[tokio::test]
async fn test_cycle_without_usable_provider_goes_idle() {
    let codex = Arc::new(
        MockProvider::new(ProviderKind::Codex).returning(no_credentials(ProviderKind::Codex)),
    );
    let h = harness(&[codex]);
    let controller = UsageController::new(Arc::clone(&h.orchestrator));
    controller.pin(Some(ProviderKind::Codex));

    assert_eq!(controller.cycle_provider().await, None);
    assert_eq!(controller.state(), UsageControllerState::default());
    assert_eq!(controller.current_update(), UsageUpdate::idle());
}

#[tokio::test]
async fn test_resolution_order() {
    let providers: Vec<Arc<MockProvider>> =
        [ProviderKind::Codex, ProviderKind::Claude, ProviderKind::Gemini]
            .into_iter()
            .map(|kind| Arc::new(MockProvider::new(kind)))
            .collect();
    let h = harness(&providers);
    let controller = UsageController::new(Arc::clone(&h.orchestrator));

    // Nothing to go on.
    assert_eq!(controller.resolve_provider().await, None);
    assert_eq!(controller.refresh(false).await, UsageUpdate::idle());

    controller.set_model(Some(ModelInfo::new("OpenAI", "gpt-4o")));
    assert_eq!(controller.resolve_provider().await, Some(ProviderKind::Codex));

    h.settings
        .update(|s| s.default_provider = Some("claude".into()))
        .await;
    assert_eq!(controller.resolve_provider().await, Some(ProviderKind::Claude));

    controller.pin(Some(ProviderKind::Gemini));
    assert_eq!(controller.resolve_provider().await, Some(ProviderKind::Gemini));

    // Pins to unregistered providers are ignored.
    controller.pin(Some(ProviderKind::Kiro));
    assert_eq!(controller.resolve_provider().await, Some(ProviderKind::Claude));
}

#[tokio::test]
async fn test_detection_can_be_turned_off() {
    let codex = Arc::new(MockProvider::new(ProviderKind::Codex));
    let mut settings = test_settings();
    settings.auto_detect_provider = false;
    let h = harness_with(&[codex], settings);
    let controller = UsageController::new(Arc::clone(&h.orchestrator));

    let update = controller
        .handle(ControllerAction::SetModel(Some(ModelInfo::new("openai", "gpt-5"))))
        .await;
    assert_eq!(update, UsageUpdate::idle());
}

#[tokio::test]
async fn test_provider_change_emits_optimistic_then_final() {
    let claude = Arc::new(MockProvider::new(ProviderKind::Claude));
    let codex = Arc::new(MockProvider::new(ProviderKind::Codex).returning(usage(ProviderKind::Codex, 70.0)));
    let h = harness(&[Arc::clone(&claude), Arc::clone(&codex)]);

    // Seed the cache for Codex so the optimistic update carries data.
    h.orchestrator
        .fetch_usage_for_provider(ProviderKind::Codex, quotabar_store::FetchOptions::default())
        .await
        .unwrap();

    let controller = UsageController::new(Arc::clone(&h.orchestrator));
    let mut updates = controller.subscribe();

    controller
        .handle(ControllerAction::Pin(Some(ProviderKind::Codex)))
        .await;
    let optimistic = updates.try_recv().unwrap();
    let authoritative = updates.try_recv().unwrap();
    assert_eq!(optimistic.provider, Some(ProviderKind::Codex));
    assert_eq!(optimistic.usage.unwrap().windows[0].used_percent, 70.0);
    assert_eq!(authoritative.provider, Some(ProviderKind::Codex));
    assert!(matches!(updates.try_recv(), Err(TryRecvError::Empty)));

    // Same provider again: a single update.
    controller.refresh(false).await;
    assert!(updates.try_recv().is_ok());
    assert!(matches!(updates.try_recv(), Err(TryRecvError::Empty)));

    // Switching to a provider with no cache yields an empty optimistic update.
    controller
        .handle(ControllerAction::Pin(Some(ProviderKind::Claude)))
        .await;
    let optimistic = updates.try_recv().unwrap();
    assert_eq!(optimistic.provider, Some(ProviderKind::Claude));
    assert!(optimistic.usage.is_none());
    let authoritative = updates.try_recv().unwrap();
    assert_eq!(authoritative.usage.unwrap().windows[0].used_percent, 10.0);
    assert_eq!(claude.calls(), 1);
}
