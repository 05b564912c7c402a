//! Integration tests for core snapshot types.

use quotabar_core::{
    Credentials, ProviderKind, RateWindow, UsageError, UsageErrorCode, UsageSnapshot,
};

#[test]
fn test_error_snapshot_round_trip() {
    let snapshot = UsageSnapshot::from_error(
        ProviderKind::Copilot,
        UsageError::new(UsageErrorCode::Timeout, "timed out after 5s"),
    );
    let json = serde_json::to_string(&snapshot).unwrap();
    let parsed: UsageSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.error.as_ref().unwrap().code, UsageErrorCode::Timeout);
    assert!(!parsed.is_expected_missing());
}

#[test]
fn test_windows_keep_order() {
    let snapshot = UsageSnapshot::new(ProviderKind::Claude).with_windows(vec![
        RateWindow::new("5h", 1.0),
        RateWindow::new("7d", 2.0),
        RateWindow::new("7d Opus", 3.0),
    ]);
    let labels: Vec<_> = snapshot.windows.iter().map(|w| w.label.as_str()).collect();
    assert_eq!(labels, ["5h", "7d", "7d Opus"]);
}

#[test]
fn test_credentials_lookup() {
    let creds = Credentials::new().with_token(ProviderKind::Claude, "abc");
    assert!(creds.has_token(ProviderKind::Claude));
    assert!(!creds.has_token(ProviderKind::Codex));
}
