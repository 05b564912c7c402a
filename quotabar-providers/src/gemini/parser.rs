//! Gemini quota response parser.
//!
//! The endpoint returns one bucket per model with the fraction remaining:
//!
//! ```json
//! {
//!   "buckets": [
//!     {"modelId": "gemini-2.5-pro", "tokenType": "REQUESTS",
//!      "remainingFraction": 0.8, "resetTime": "2025-01-02T00:00:00Z"},
//!     {"modelId": "gemini-2.5-flash", "remainingFraction": 0.95}
//!   ]
//! }
//! ```
//!
//! Buckets are folded into a "Pro" and a "Flash" window, each reporting
//! the most exhausted model in its family.

use quotabar_core::{ProviderKind, RateWindow, UsageSnapshot};
use serde::Deserialize;

use crate::common::parse_rfc3339;

/// Response from `retrieveUserQuota`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiQuotaResponse {
    /// Per-model quota buckets.
    #[serde(default)]
    pub buckets: Vec<GeminiQuotaBucket>,
}

/// One quota bucket.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiQuotaBucket {
    /// Model identifier.
    #[serde(default, alias = "model_id")]
    pub model_id: Option<String>,
    /// Quota unit, usually `REQUESTS`.
    #[serde(default, alias = "token_type")]
    pub token_type: Option<String>,
    /// Fraction of the quota left, 0.0 to 1.0.
    #[serde(default, alias = "remaining_fraction")]
    pub remaining_fraction: Option<f64>,
    /// Reset time (ISO 8601).
    #[serde(default, alias = "reset_time")]
    pub reset_time: Option<String>,
}

impl GeminiQuotaResponse {
    /// Converts to a snapshot with "Pro" and "Flash" windows.
    pub fn to_snapshot(&self) -> UsageSnapshot {
        let windows = ["Pro", "Flash"]
            .into_iter()
            .filter_map(|family| self.family_window(family))
            .collect();
        UsageSnapshot::new(ProviderKind::Gemini).with_windows(windows)
    }

    fn family_window(&self, family: &str) -> Option<RateWindow> {
        let needle = family.to_lowercase();
        let bucket = self
            .buckets
            .iter()
            .filter(|b| {
                b.model_id
                    .as_deref()
                    .is_some_and(|id| id.to_lowercase().contains(&needle))
            })
            .filter(|b| b.remaining_fraction.is_some())
            .min_by(|a, b| {
                a.remaining_fraction
                    .unwrap_or(1.0)
                    .total_cmp(&b.remaining_fraction.unwrap_or(1.0))
            })?;

        let remaining = bucket.remaining_fraction.unwrap_or(1.0);
        Some(
            RateWindow::new(family, (1.0 - remaining) * 100.0)
                .with_reset_at(parse_rfc3339(bucket.reset_time.as_deref())),
        )
    }
}
