//! Usage-related types.
//!
//! - [`UsageSnapshot`] - The result of asking one provider for usage
//! - [`RateWindow`] - One quota bucket

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::provider::ProviderKind;
use super::status::ProviderStatus;
use super::usage_error::UsageError;

// ============================================================================
// Usage Snapshot
// ============================================================================

/// A snapshot of usage data for one provider.
///
/// `windows` may be empty ("no quota data") independent of `error` being
/// set. Snapshots are replaced, never mutated, once handed out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSnapshot {
    /// Provider this snapshot belongs to.
    pub provider: ProviderKind,
    /// Display name of the provider.
    pub display_name: String,
    /// Ordered quota windows.
    #[serde(default)]
    pub windows: Vec<RateWindow>,
    /// Failure captured during the fetch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<UsageError>,
    /// Service status at fetch time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProviderStatus>,
    /// Provider-specific extras, e.g. remaining request counts.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl UsageSnapshot {
    /// Creates an empty snapshot for a provider.
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            display_name: provider.display_name().to_string(),
            windows: Vec::new(),
            error: None,
            status: None,
            extra: BTreeMap::new(),
        }
    }

    /// Creates a snapshot carrying only an error.
    pub fn from_error(provider: ProviderKind, error: UsageError) -> Self {
        Self::new(provider).with_error(error)
    }

    /// Replaces the windows.
    #[must_use]
    pub fn with_windows(mut self, windows: Vec<RateWindow>) -> Self {
        self.windows = windows;
        self
    }

    /// Sets the error.
    #[must_use]
    pub fn with_error(mut self, error: UsageError) -> Self {
        self.error = Some(error);
        self
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: Option<ProviderStatus>) -> Self {
        self.status = status;
        self
    }

    /// Adds a provider-specific extra field.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Returns true if the snapshot has at least one window.
    pub fn has_windows(&self) -> bool {
        !self.windows.is_empty()
    }

    /// Returns true if the error (if any) means "provider not configured".
    pub fn is_expected_missing(&self) -> bool {
        self.error.as_ref().is_some_and(UsageError::is_expected_missing)
    }

    /// Returns true if this result carries usage worth caching.
    ///
    /// That is: at least one window, or no error at all.
    pub fn has_usage_data(&self) -> bool {
        self.has_windows() || self.error.is_none()
    }

    /// Returns true if the provider is worth showing.
    ///
    /// A provider is usable when it has windows, or when its error is not
    /// an "expected missing data" error.
    pub fn is_usable(&self) -> bool {
        self.has_windows() || !self.is_expected_missing()
    }

    /// Returns the highest clamped usage percentage across all windows.
    pub fn max_used_percent(&self) -> f64 {
        self.windows
            .iter()
            .map(RateWindow::clamped_percent)
            .fold(0.0_f64, f64::max)
    }

    /// Clamps every window into `[0, 100]`.
    pub fn sanitize(&mut self) {
        for window in &mut self.windows {
            window.sanitize();
        }
    }
}

// ============================================================================
// Rate Window
// ============================================================================

/// One quota bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateWindow {
    /// Provider-defined label, e.g. "5h" or "Month".
    pub label: String,
    /// Percentage used. May exceed `[0, 100]` at the source.
    pub used_percent: f64,
    /// Human-readable reset description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_description: Option<String>,
    /// When this window resets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_at: Option<DateTime<Utc>>,
}

impl RateWindow {
    /// Creates a window with the given label and percentage.
    pub fn new(label: impl Into<String>, used_percent: f64) -> Self {
        Self {
            label: label.into(),
            used_percent,
            reset_description: None,
            reset_at: None,
        }
    }

    /// Sets the reset time.
    #[must_use]
    pub fn with_reset_at(mut self, reset_at: Option<DateTime<Utc>>) -> Self {
        self.reset_at = reset_at;
        self
    }

    /// Sets the reset description.
    #[must_use]
    pub fn with_reset_description(mut self, description: impl Into<String>) -> Self {
        self.reset_description = Some(description.into());
        self
    }

    /// Returns `used_percent` clamped to `[0, 100]`, with NaN mapped to 0.
    pub fn clamped_percent(&self) -> f64 {
        if self.used_percent.is_finite() {
            self.used_percent.clamp(0.0, 100.0)
        } else if self.used_percent == f64::INFINITY {
            100.0
        } else {
            0.0
        }
    }

    /// Returns the remaining percentage (100 - used), clamped.
    pub fn remaining_percent(&self) -> f64 {
        100.0 - self.clamped_percent()
    }

    /// Clamps `used_percent` in place.
    pub fn sanitize(&mut self) {
        self.used_percent = self.clamped_percent();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::usage_error::UsageErrorCode;

    #[test]
    fn test_clamped_percent() {
        assert_eq!(RateWindow::new("5h", 150.0).clamped_percent(), 100.0);
        assert_eq!(RateWindow::new("5h", -5.0).clamped_percent(), 0.0);
        assert_eq!(RateWindow::new("5h", f64::NAN).clamped_percent(), 0.0);
        assert_eq!(RateWindow::new("5h", f64::INFINITY).clamped_percent(), 100.0);
        assert_eq!(RateWindow::new("5h", 42.5).clamped_percent(), 42.5);
    }

    #[test]
    fn test_remaining_percent() {
        assert_eq!(RateWindow::new("Month", 30.0).remaining_percent(), 70.0);
        assert_eq!(RateWindow::new("Month", 130.0).remaining_percent(), 0.0);
    }

    #[test]
    fn test_usable_rules() {
        let empty_ok = UsageSnapshot::new(ProviderKind::Claude);
        assert!(empty_ok.has_usage_data());
        assert!(empty_ok.is_usable());

        let missing = UsageSnapshot::from_error(
            ProviderKind::Claude,
            UsageError::no_credentials("no token"),
        );
        assert!(missing.is_expected_missing());
        assert!(!missing.has_usage_data());
        assert!(!missing.is_usable());

        let failed = UsageSnapshot::from_error(
            ProviderKind::Claude,
            UsageError::new(UsageErrorCode::FetchFailed, "reset"),
        );
        assert!(!failed.has_usage_data());
        assert!(failed.is_usable());

        let stale = UsageSnapshot::new(ProviderKind::Claude)
            .with_windows(vec![RateWindow::new("5h", 10.0)])
            .with_error(UsageError::http(500, "boom"));
        assert!(stale.has_usage_data());
        assert!(stale.is_usable());
    }

    #[test]
    fn test_max_used_percent() {
        let snapshot = UsageSnapshot::new(ProviderKind::Codex).with_windows(vec![
            RateWindow::new("5h", 20.0),
            RateWindow::new("Week", 250.0),
        ]);
        assert_eq!(snapshot.max_used_percent(), 100.0);
    }

    #[test]
    fn test_sanitize() {
        let mut snapshot = UsageSnapshot::new(ProviderKind::Codex)
            .with_windows(vec![RateWindow::new("5h", -1.0), RateWindow::new("Week", 101.0)]);
        snapshot.sanitize();
        assert_eq!(snapshot.windows[0].used_percent, 0.0);
        assert_eq!(snapshot.windows[1].used_percent, 100.0);
    }
}
