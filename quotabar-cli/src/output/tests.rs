//! CLI output formatting tests.

mod text_formatter_tests {
    use super::super::text::{format_age, format_reset_time};
    use super::super::{ProviderRow, TextFormatter};
    use chrono::{Duration, TimeZone, Utc};
    use quotabar_core::{ProviderKind, ProviderStatus, RateWindow, UsageError, UsageSnapshot};
    use quotabar_providers::ProviderRegistry;

    #[test]
    fn test_progress_bar_levels() {
        let formatter = TextFormatter::new(false);
        let cases = [
            (0.0, "░░░░░░░░░░"),
            (10.0, "█░░░░░░░░░"),
            (25.0, "███░░░░░░░"),
            (50.0, "█████░░░░░"),
            (100.0, "██████████"),
            (140.0, "██████████"),
        ];
        for (percent, expected) in cases {
            assert_eq!(formatter.progress_bar(percent), expected, "Failed for {percent}%");
        }
    }

    #[test]
    fn test_progress_bar_colors() {
        let formatter = TextFormatter::new(true);
        assert!(formatter.progress_bar(95.0).contains("\x1b[31m"));
        assert!(formatter.progress_bar(75.0).contains("\x1b[33m"));
        assert!(formatter.progress_bar(10.0).contains("\x1b[32m"));
    }

    #[test]
    fn test_format_usage_with_windows_and_extra() {
        let formatter = TextFormatter::new(false);
        let snapshot = UsageSnapshot::new(ProviderKind::Codex)
            .with_windows(vec![
                RateWindow::new("5h", 42.0).with_reset_description("in 3h"),
                RateWindow::new("Week", 7.0),
            ])
            .with_extra("plan", serde_json::json!("pro"));

        let output = formatter.format_usage(&snapshot);
        assert!(output.starts_with(ProviderKind::Codex.display_name()));
        assert!(output.contains("5h:"));
        assert!(output.contains("42% used"));
        assert!(output.contains("Resets in 3h"));
        assert!(output.contains("Week:"));
        assert!(output.contains("Plan:"));
        assert!(output.contains("pro"));
    }

    #[test]
    fn test_format_usage_stale_with_status() {
        let formatter = TextFormatter::new(false);
        let snapshot = UsageSnapshot::new(ProviderKind::Claude)
            .with_windows(vec![RateWindow::new("5h", 10.0)])
            .with_error(UsageError::http(500, "HTTP 500: Internal Server Error"))
            .with_status(Some(ProviderStatus::fetch_failed()));

        let output = formatter.format_usage(&snapshot);
        assert!(output.contains("(Fetch failed)"));
        assert!(output.contains("Last refresh failed"));
        assert!(output.contains("10% used"));
    }

    #[test]
    fn test_format_usage_error_only() {
        let formatter = TextFormatter::new(false);
        let failed = UsageSnapshot::from_error(ProviderKind::Zai, UsageError::timeout("timed out"));
        assert!(formatter.format_usage(&failed).contains("Error: timed out"));

        let missing =
            UsageSnapshot::from_error(ProviderKind::Zai, UsageError::no_credentials("no token"));
        assert!(formatter.format_usage(&missing).contains("Not configured"));
    }

    #[test]
    fn test_reset_countdown() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(format_reset_time(now - Duration::minutes(1), now), "now");
        assert_eq!(format_reset_time(now + Duration::minutes(1), now), "in 1 minute");
        assert_eq!(format_reset_time(now + Duration::minutes(45), now), "in 45 minutes");
        assert_eq!(format_reset_time(now + Duration::hours(2), now), "in 2 hours");
        assert_eq!(
            format_reset_time(now + Duration::minutes(150), now),
            "in 2h 30m"
        );
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Duration::seconds(5)), "just now");
        assert_eq!(format_age(Duration::seconds(-5)), "just now");
        assert_eq!(format_age(Duration::minutes(3)), "3m ago");
        assert_eq!(format_age(Duration::hours(5)), "5h ago");
        assert_eq!(format_age(Duration::days(2)), "2d ago");
    }

    #[test]
    fn test_provider_line() {
        let formatter = TextFormatter::new(false);
        let row = ProviderRow {
            descriptor: ProviderRegistry::get(ProviderKind::Copilot).unwrap(),
            enabled: false,
            has_credentials: Some(false),
            token_env: Some("GITHUB_TOKEN".into()),
        };
        let line = formatter.format_provider_line(&row);
        assert!(line.contains("copilot"));
        assert!(line.contains("missing"));
        assert!(line.contains("GITHUB_TOKEN"));
    }
}

mod json_formatter_tests {
    use super::super::{JsonFormatter, ProviderRow};
    use quotabar_core::{ModelInfo, ProviderKind, RateWindow, UsageSnapshot};
    use quotabar_providers::ProviderRegistry;
    use quotabar_store::{CacheEntry, CachedUsage, UsageUpdate};
    use serde_json::Value;

    fn parse(output: &str) -> Value {
        serde_json::from_str(output).unwrap()
    }

    #[test]
    fn test_idle_update() {
        let formatter = JsonFormatter::new(false);
        let json = parse(&formatter.format_update(&UsageUpdate::idle()).unwrap());
        assert!(json["provider"].is_null());
        assert!(json["usage"].is_null());
    }

    #[test]
    fn test_update_with_usage() {
        let formatter = JsonFormatter::new(true);
        let update = UsageUpdate {
            provider: Some(ProviderKind::Gemini),
            usage: Some(
                UsageSnapshot::new(ProviderKind::Gemini)
                    .with_windows(vec![RateWindow::new("Pro", 30.0)]),
            ),
        };
        let output = formatter.format_update(&update).unwrap();
        assert!(output.contains('\n'));
        let json = parse(&output);
        assert_eq!(json["provider"], "gemini");
        assert_eq!(json["usage"]["windows"][0]["label"], "Pro");
    }

    #[test]
    fn test_entries_keep_order() {
        let formatter = JsonFormatter::new(false);
        let results = vec![
            CachedUsage::cached(CacheEntry::new(UsageSnapshot::new(ProviderKind::Kiro))),
            CachedUsage::fresh(CacheEntry::new(UsageSnapshot::new(ProviderKind::Codex))),
        ];
        let json = parse(&formatter.format_entries(&results).unwrap());
        let entries = json.as_array().unwrap();
        assert_eq!(entries[0]["provider"], "kiro");
        assert_eq!(entries[0]["fromCache"], true);
        assert_eq!(entries[1]["provider"], "codex");
        assert_eq!(entries[1]["fromCache"], false);
        assert!(entries[1]["fetchedAt"].is_i64());
        assert!(entries[1].get("statusFetchedAt").is_none());
    }

    #[test]
    fn test_providers() {
        let formatter = JsonFormatter::new(false);
        let rows = vec![ProviderRow {
            descriptor: ProviderRegistry::get(ProviderKind::Claude).unwrap(),
            enabled: true,
            has_credentials: Some(true),
            token_env: Some("ANTHROPIC_OAUTH_TOKEN".into()),
        }];
        let json = parse(&formatter.format_providers(&rows).unwrap());
        assert_eq!(json[0]["id"], "claude");
        assert_eq!(json[0]["cliName"], "claude");
        assert_eq!(json[0]["aliases"][0], "anthropic");
        assert_eq!(json[0]["hasCredentials"], true);
        assert!(json[0]["statusPageUrl"].as_str().unwrap().contains("anthropic"));
    }

    #[test]
    fn test_detection() {
        let formatter = JsonFormatter::new(false);
        let model = ModelInfo::new("OpenAI", "claude-3-opus");
        let json = parse(
            &formatter
                .format_detection(&model, Some(ProviderKind::Codex))
                .unwrap(),
        );
        assert_eq!(json["provider"], "codex");
        assert_eq!(json["model"]["id"], "claude-3-opus");
    }
}
