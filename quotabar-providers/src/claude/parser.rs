//! Claude usage response parser.
//!
//! # Response Format
//!
//! ```json
//! {
//!   "five_hour": {"utilization": 25.0, "resets_at": "2025-01-01T12:00:00Z"},
//!   "seven_day": {"utilization": 45.0, "resets_at": "2025-01-05T00:00:00Z"},
//!   "seven_day_opus": {"utilization": 30.0, "resets_at": null},
//!   "extra_usage": {"is_enabled": true, "used_credits": 500, "monthly_limit": 10000}
//! }
//! ```

use quotabar_core::{ProviderKind, RateWindow, UsageSnapshot};
use serde::Deserialize;

use crate::common::parse_rfc3339;

// ============================================================================
// Response Types
// ============================================================================

/// Response from the usage endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClaudeUsageResponse {
    /// 5-hour session window.
    #[serde(default, alias = "fiveHour")]
    pub five_hour: Option<ClaudeWindow>,
    /// 7-day window across all models.
    #[serde(default, alias = "sevenDay")]
    pub seven_day: Option<ClaudeWindow>,
    /// 7-day Opus window.
    #[serde(default, alias = "sevenDayOpus")]
    pub seven_day_opus: Option<ClaudeWindow>,
    /// 7-day Sonnet window.
    #[serde(default, alias = "sevenDaySonnet")]
    pub seven_day_sonnet: Option<ClaudeWindow>,
    /// Pay-as-you-go credits.
    #[serde(default, alias = "extraUsage")]
    pub extra_usage: Option<ExtraUsage>,
}

/// One usage window.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClaudeWindow {
    /// Percentage used.
    #[serde(default)]
    pub utilization: Option<f64>,
    /// Reset time (ISO 8601).
    #[serde(default, alias = "resetsAt")]
    pub resets_at: Option<String>,
}

/// Extra usage credits.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtraUsage {
    /// Whether extra usage is enabled.
    #[serde(default, alias = "isEnabled")]
    pub is_enabled: Option<bool>,
    /// Credits used this month.
    #[serde(default, alias = "usedCredits")]
    pub used_credits: Option<f64>,
    /// Monthly credit limit.
    #[serde(default, alias = "monthlyLimit")]
    pub monthly_limit: Option<f64>,
}

// ============================================================================
// Conversion
// ============================================================================

impl ClaudeUsageResponse {
    /// Converts to a snapshot with windows "5h", "7d", "7d Opus", "7d Sonnet".
    pub fn to_snapshot(&self) -> UsageSnapshot {
        let windows = [
            ("5h", &self.five_hour),
            ("7d", &self.seven_day),
            ("7d Opus", &self.seven_day_opus),
            ("7d Sonnet", &self.seven_day_sonnet),
        ]
        .into_iter()
        .filter_map(|(label, window)| {
            let window = window.as_ref()?;
            let used = window.utilization?;
            Some(
                RateWindow::new(label, used)
                    .with_reset_at(parse_rfc3339(window.resets_at.as_deref())),
            )
        })
        .collect();

        let mut snapshot = UsageSnapshot::new(ProviderKind::Claude).with_windows(windows);

        if let Some(extra) = &self.extra_usage {
            if extra.is_enabled.unwrap_or(false) {
                snapshot = snapshot.with_extra(
                    "extraUsage",
                    serde_json::json!({
                        "usedCredits": extra.used_credits,
                        "monthlyLimit": extra.monthly_limit,
                    }),
                );
            }
        }

        snapshot
    }
}

// ============================================================================
// Tests
// ============================================================================
