//! Copilot user response parser.
//!
//! ```json
//! {
//!   "copilot_plan": "individual",
//!   "quota_reset_date": "2025-02-01",
//!   "quota_snapshots": {
//!     "premium_interactions": {"entitlement": 300, "remaining": 150, "percent_remaining": 50.0, "unlimited": false},
//!     "chat": {"entitlement": 0, "remaining": 0, "unlimited": true}
//!   }
//! }
//! ```

use chrono::{NaiveDate, TimeZone, Utc};
use quotabar_core::{ProviderKind, RateWindow, UsageSnapshot};
use serde::Deserialize;

use crate::common::{parse_rfc3339, percent_of};

/// Response from the Copilot user endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CopilotUserResponse {
    /// Plan name.
    #[serde(default, alias = "copilotPlan")]
    pub copilot_plan: Option<String>,
    /// Date the monthly quota resets (`YYYY-MM-DD` or RFC 3339).
    #[serde(default, alias = "quotaResetDate")]
    pub quota_reset_date: Option<String>,
    /// Quota snapshots by category.
    #[serde(default, alias = "quotaSnapshots")]
    pub quota_snapshots: Option<CopilotQuotaSnapshots>,
}

/// Quota categories.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CopilotQuotaSnapshots {
    /// Premium model requests.
    #[serde(default, alias = "premiumInteractions")]
    pub premium_interactions: Option<CopilotQuota>,
    /// Chat messages.
    #[serde(default)]
    pub chat: Option<CopilotQuota>,
}

/// One quota category.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CopilotQuota {
    /// Monthly allowance.
    #[serde(default)]
    pub entitlement: Option<f64>,
    /// Amount left.
    #[serde(default)]
    pub remaining: Option<f64>,
    /// Percent left, when reported.
    #[serde(default, alias = "percentRemaining")]
    pub percent_remaining: Option<f64>,
    /// No limit applies.
    #[serde(default)]
    pub unlimited: bool,
}

impl CopilotQuota {
    fn used_percent(&self) -> Option<f64> {
        if self.unlimited {
            return None;
        }
        if let Some(left) = self.percent_remaining {
            return Some(100.0 - left);
        }
        let entitlement = self.entitlement?;
        let remaining = self.remaining?;
        percent_of(entitlement - remaining, entitlement)
    }
}

impl CopilotUserResponse {
    /// Converts to a snapshot with "Premium" and "Chat" windows. Unlimited
    /// categories produce no window.
    pub fn to_snapshot(&self) -> UsageSnapshot {
        let reset_at = self.quota_reset_date.as_deref().and_then(|raw| {
            parse_rfc3339(Some(raw)).or_else(|| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|dt| Utc.from_utc_datetime(&dt))
            })
        });

        let mut windows = Vec::new();
        if let Some(quotas) = &self.quota_snapshots {
            for (label, quota) in [
                ("Premium", &quotas.premium_interactions),
                ("Chat", &quotas.chat),
            ] {
                if let Some(used) = quota.as_ref().and_then(CopilotQuota::used_percent) {
                    windows.push(RateWindow::new(label, used).with_reset_at(reset_at));
                }
            }
        }

        let mut snapshot = UsageSnapshot::new(ProviderKind::Copilot).with_windows(windows);
        if let Some(plan) = &self.copilot_plan {
            snapshot = snapshot.with_extra("plan", serde_json::Value::String(plan.clone()));
        }
        snapshot
    }
}
