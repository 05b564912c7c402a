//! Codex usage response parser.
//!
//! # Response Format
//!
//! ```json
//! {
//!   "plan_type": "plus",
//!   "rate_limit": {
//!     "primary_window": {"used_percent": 12, "limit_window_seconds": 18000, "reset_at": 1735732800},
//!     "secondary_window": {"used_percent": 40, "limit_window_seconds": 604800, "reset_at": 1736000000}
//!   },
//!   "credits": {"has_credits": true, "unlimited": false, "balance": "12.50"}
//! }
//! ```

use quotabar_core::{ProviderKind, RateWindow, UsageSnapshot};
use serde::Deserialize;

use crate::common::{from_unix_secs, window_label};

/// Response from the usage endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodexUsageResponse {
    /// Subscription plan.
    #[serde(default, alias = "planType")]
    pub plan_type: Option<String>,
    /// Rate limit windows.
    #[serde(default, alias = "rateLimit", alias = "rate_limits")]
    pub rate_limit: Option<CodexRateLimit>,
    /// Credit balance.
    #[serde(default)]
    pub credits: Option<CodexCredits>,
}

/// Rate limit block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodexRateLimit {
    /// Session window.
    #[serde(default, alias = "primaryWindow", alias = "primary")]
    pub primary_window: Option<CodexWindow>,
    /// Weekly window.
    #[serde(default, alias = "secondaryWindow", alias = "secondary")]
    pub secondary_window: Option<CodexWindow>,
}

/// One rate limit window.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodexWindow {
    /// Percentage used.
    #[serde(default, alias = "usedPercent")]
    pub used_percent: Option<f64>,
    /// Window length in seconds.
    #[serde(default, alias = "limitWindowSeconds")]
    pub limit_window_seconds: Option<i64>,
    /// Reset time as unix seconds.
    #[serde(default, alias = "resetAt", alias = "resets_at")]
    pub reset_at: Option<i64>,
}

/// Credit information.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodexCredits {
    /// Whether the account has credits.
    #[serde(default, alias = "hasCredits")]
    pub has_credits: Option<bool>,
    /// Whether credits are unlimited.
    #[serde(default)]
    pub unlimited: Option<bool>,
    /// Balance as reported (string or number).
    #[serde(default)]
    pub balance: Option<serde_json::Value>,
}

impl CodexWindow {
    fn to_window(&self, fallback: &str) -> Option<RateWindow> {
        let used = self.used_percent?;
        let label = self
            .limit_window_seconds
            .filter(|s| *s > 0)
            .map_or_else(|| fallback.to_string(), |s| window_label(s / 60));
        Some(RateWindow::new(label, used).with_reset_at(from_unix_secs(self.reset_at)))
    }
}

impl CodexUsageResponse {
    /// Converts to a snapshot. Windows are labelled from their length
    /// ("5h", "Week"), falling back to their position.
    pub fn to_snapshot(&self) -> UsageSnapshot {
        let mut windows = Vec::new();
        if let Some(limits) = &self.rate_limit {
            windows.extend(
                limits
                    .primary_window
                    .as_ref()
                    .and_then(|w| w.to_window("5h")),
            );
            windows.extend(
                limits
                    .secondary_window
                    .as_ref()
                    .and_then(|w| w.to_window("Week")),
            );
        }

        let mut snapshot = UsageSnapshot::new(ProviderKind::Codex).with_windows(windows);
        if let Some(plan) = &self.plan_type {
            snapshot = snapshot.with_extra("plan", serde_json::Value::String(plan.clone()));
        }
        if let Some(credits) = &self.credits {
            if credits.has_credits.unwrap_or(false) || credits.unlimited.unwrap_or(false) {
                snapshot = snapshot.with_extra(
                    "credits",
                    serde_json::json!({
                        "unlimited": credits.unlimited.unwrap_or(false),
                        "balance": credits.balance,
                    }),
                );
            }
        }
        snapshot
    }
}
