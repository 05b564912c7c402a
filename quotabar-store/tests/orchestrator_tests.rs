//! Enablement, refresh floors, status policy, and batch fetching.

mod common;

use common::{Gauge, MockProvider, harness, harness_with, no_credentials, test_settings, usage};
use quotabar_core::{ProviderKind, ProviderStatus, StatusIndicator, UsageProvider};
use quotabar_store::{EnabledMode, FetchOptions, MAX_CONCURRENT_FETCHES, Settings};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_disabled_provider_is_skipped() {
    let disabled = Arc::new(MockProvider::new(ProviderKind::Claude));
    let missing_creds = Arc::new(MockProvider::new(ProviderKind::Codex).with_credentials(false));
    let forced_on = Arc::new(MockProvider::new(ProviderKind::Gemini).with_credentials(false));

    let mut settings = test_settings();
    settings.provider_mut(ProviderKind::Claude).enabled = EnabledMode::Disabled;
    settings.provider_mut(ProviderKind::Gemini).enabled = EnabledMode::Enabled;
    let h = harness_with(
        &[Arc::clone(&disabled), Arc::clone(&missing_creds), Arc::clone(&forced_on)],
        settings,
    );

    for kind in [ProviderKind::Claude, ProviderKind::Codex] {
        let result = h
            .orchestrator
            .fetch_usage_for_provider(kind, FetchOptions::forced())
            .await;
        assert!(result.is_none());
    }
    assert_eq!(disabled.calls(), 0);
    assert_eq!(missing_creds.calls(), 0);
    assert!(h.cache.read().await.is_empty());

    assert!(
        h.orchestrator
            .fetch_usage_for_provider(ProviderKind::Gemini, FetchOptions::default())
            .await
            .is_some()
    );
    assert_eq!(
        h.orchestrator.enabled_providers().await,
        vec![ProviderKind::Gemini]
    );
}

#[tokio::test]
async fn test_unregistered_provider_returns_none() {
    let h = harness(&[Arc::new(MockProvider::new(ProviderKind::Claude))]);
    assert!(
        h.orchestrator
            .fetch_usage_for_provider(ProviderKind::Kiro, FetchOptions::default())
            .await
            .is_none()
    );
    assert!(!h.orchestrator.is_enabled(ProviderKind::Kiro).await);
}

#[tokio::test]
async fn test_min_refresh_floor_holds_even_when_forced() {
    let claude = Arc::new(MockProvider::new(ProviderKind::Claude));
    // Default settings: 30 s floor.
    let h = harness_with(&[Arc::clone(&claude)], Settings::default());

    let first = h
        .orchestrator
        .fetch_usage_for_provider(ProviderKind::Claude, FetchOptions::default())
        .await
        .unwrap();
    assert!(!first.from_cache);

    let second = h
        .orchestrator
        .fetch_usage_for_provider(ProviderKind::Claude, FetchOptions::forced())
        .await
        .unwrap();
    assert!(second.from_cache);
    assert_eq!(claude.calls(), 1);
}

#[tokio::test]
async fn test_forced_refresh_past_floor_fetches() {
    let claude = Arc::new(MockProvider::new(ProviderKind::Claude));
    let h = harness(&[Arc::clone(&claude)]);

    for _ in 0..2 {
        h.orchestrator
            .fetch_usage_for_provider(ProviderKind::Claude, FetchOptions::forced())
            .await
            .unwrap();
    }
    assert_eq!(claude.calls(), 2);

    // Within TTL and not forced: cache hit.
    let cached = h
        .orchestrator
        .fetch_usage_for_provider(ProviderKind::Claude, FetchOptions::default())
        .await
        .unwrap();
    assert!(cached.from_cache);
    assert_eq!(claude.calls(), 2);
}

#[tokio::test]
async fn test_status_fetched_once_within_ttl() {
    let degraded = ProviderStatus::new(StatusIndicator::Major, "Elevated errors");
    let codex = Arc::new(MockProvider::new(ProviderKind::Codex).with_status(degraded.clone()));
    let h = harness(&[Arc::clone(&codex)]);

    let first = h
        .orchestrator
        .fetch_usage_for_provider(ProviderKind::Codex, FetchOptions::default())
        .await
        .unwrap();
    assert_eq!(first.entry.status.as_ref(), Some(&degraded));
    let status_at = first.entry.status_fetched_at;
    assert!(status_at.is_some());

    let second = h
        .orchestrator
        .fetch_usage_for_provider(ProviderKind::Codex, FetchOptions::forced())
        .await
        .unwrap();
    assert!(!second.from_cache);
    assert_eq!(codex.calls(), 2);
    assert_eq!(codex.status_calls(), 1);
    assert_eq!(second.entry.status.as_ref(), Some(&degraded));
    assert_eq!(second.entry.merged_usage().status, Some(degraded));
}

#[tokio::test]
async fn test_status_fetch_disabled_in_settings() {
    let codex = Arc::new(
        MockProvider::new(ProviderKind::Codex).with_status(ProviderStatus::operational()),
    );
    let mut settings = test_settings();
    settings.provider_mut(ProviderKind::Codex).fetch_status = false;
    let h = harness_with(&[Arc::clone(&codex)], settings);

    let result = h
        .orchestrator
        .fetch_usage_for_provider(ProviderKind::Codex, FetchOptions::default())
        .await
        .unwrap();
    assert!(result.entry.status.is_none());
    assert_eq!(codex.status_calls(), 0);
}

#[tokio::test]
async fn test_batch_keeps_order_and_bounds_concurrency() {
    let gauge = Arc::new(Gauge::default());
    let kinds = [
        ProviderKind::Kiro,
        ProviderKind::Codex,
        ProviderKind::Zai,
        ProviderKind::Claude,
        ProviderKind::Copilot,
        ProviderKind::Gemini,
    ];
    let providers: Vec<Arc<MockProvider>> = kinds
        .iter()
        .map(|&kind| {
            let mock = MockProvider::new(kind)
                .with_delay(Duration::from_millis(50))
                .with_gauge(&gauge);
            let mock = if kind == ProviderKind::Zai {
                mock.returning(no_credentials(kind))
            } else {
                mock.returning(usage(kind, 25.0))
            };
            Arc::new(mock)
        })
        .collect();
    let h = harness(&providers);

    let results = h.orchestrator.fetch_usage_entries(&kinds, true).await;

    let order: Vec<ProviderKind> = results.iter().map(|r| r.entry.usage.provider).collect();
    assert_eq!(
        order,
        vec![
            ProviderKind::Kiro,
            ProviderKind::Codex,
            ProviderKind::Claude,
            ProviderKind::Copilot,
            ProviderKind::Gemini,
        ]
    );
    assert!(gauge.max() <= MAX_CONCURRENT_FETCHES);
    assert!(gauge.max() > 1);
    assert!(providers.iter().all(|p| p.calls() == 1));
}

#[tokio::test]
async fn test_batch_slow_provider_does_not_hold_back_others() {
    let slow = Duration::from_millis(800);
    let kinds = [
        ProviderKind::Codex,
        ProviderKind::Claude,
        ProviderKind::Gemini,
        ProviderKind::Copilot,
        ProviderKind::Zai,
    ];
    let providers: Vec<Arc<MockProvider>> = kinds
        .iter()
        .map(|&kind| {
            let delay = if kind == ProviderKind::Codex {
                slow
            } else {
                Duration::from_millis(10)
            };
            Arc::new(MockProvider::new(kind).with_delay(delay))
        })
        .collect();
    let h = harness(&providers);

    let began = Instant::now();
    let results = h.orchestrator.fetch_usage_entries(&kinds, true).await;

    for provider in &providers[3..] {
        let started = provider.started_at().unwrap() - began;
        assert!(
            started < slow / 2,
            "{} started after {started:?}",
            provider.kind()
        );
    }
    let order: Vec<ProviderKind> = results.iter().map(|r| r.entry.usage.provider).collect();
    assert_eq!(order, kinds.to_vec());
}

#[tokio::test]
async fn test_batch_keeps_failed_providers() {
    let claude = Arc::new(MockProvider::new(ProviderKind::Claude).returning(
        common::http_error(ProviderKind::Claude, 503),
    ));
    let h = harness(&[Arc::clone(&claude)]);

    let results = h
        .orchestrator
        .fetch_usage_entries(&[ProviderKind::Claude], false)
        .await;
    assert_eq!(results.len(), 1);
    assert!(results[0].entry.usage.error.is_some());
    // Failures are not cached.
    assert!(h.cache.get_entry(ProviderKind::Claude).await.is_none());
}

#[tokio::test]
async fn test_enabled_providers_follow_configured_order() {
    let providers: Vec<Arc<MockProvider>> = [ProviderKind::Codex, ProviderKind::Claude, ProviderKind::Kiro]
        .into_iter()
        .map(|kind| Arc::new(MockProvider::new(kind)))
        .collect();
    let mut settings = test_settings();
    settings.provider_order = vec!["kiro".into(), "bogus".into(), "KIRO".into()];
    let h = harness_with(&providers, settings);

    assert_eq!(
        h.orchestrator.enabled_providers().await,
        vec![ProviderKind::Kiro, ProviderKind::Codex, ProviderKind::Claude]
    );
}
