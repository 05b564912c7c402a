//! z.ai quota response parser.
//!
//! # Response Format
//!
//! ```json
//! {
//!   "code": 200, "msg": "Operation successful", "success": true,
//!   "data": {"limits": [
//!     {"type": "TOKENS_LIMIT", "percentage": 12, "nextResetTime": 1735732800000},
//!     {"type": "TIME_LIMIT", "usage": 1000, "currentValue": 250, "percentage": 25}
//!   ]}
//! }
//! ```

use chrono::{TimeZone, Utc};
use quotabar_core::{ProviderKind, RateWindow, UsageSnapshot};
use quotabar_fetch::FetchError;
use serde::Deserialize;

use crate::common::percent_of;

/// Envelope returned by the quota monitor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZaiQuotaResponse {
    /// Application status code.
    #[serde(default)]
    pub code: Option<i64>,
    /// Status message.
    #[serde(default)]
    pub msg: Option<String>,
    /// Whether the call succeeded.
    #[serde(default)]
    pub success: Option<bool>,
    /// Payload.
    #[serde(default)]
    pub data: Option<ZaiQuotaData>,
}

/// Quota payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZaiQuotaData {
    /// Individual limits.
    #[serde(default)]
    pub limits: Vec<ZaiLimit>,
}

/// One quota limit.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZaiLimit {
    /// `TOKENS_LIMIT` or `TIME_LIMIT`.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Allowance.
    #[serde(default)]
    pub usage: Option<f64>,
    /// Amount consumed.
    #[serde(default)]
    pub current_value: Option<f64>,
    /// Percentage consumed.
    #[serde(default)]
    pub percentage: Option<f64>,
    /// Reset time in epoch milliseconds.
    #[serde(default)]
    pub next_reset_time: Option<i64>,
}

impl ZaiLimit {
    fn label(&self) -> &str {
        match self.kind.as_deref() {
            Some("TOKENS_LIMIT") => "Tokens",
            Some("TIME_LIMIT") => "Month",
            Some(other) => other,
            None => "Quota",
        }
    }

    fn used_percent(&self) -> Option<f64> {
        self.percentage.or_else(|| {
            let limit = self.usage?;
            percent_of(self.current_value?, limit)
        })
    }
}

impl ZaiQuotaResponse {
    /// Converts to a snapshot, rejecting unsuccessful envelopes.
    pub fn into_snapshot(self) -> Result<UsageSnapshot, FetchError> {
        if self.success == Some(false) {
            let message = self.msg.unwrap_or_else(|| "request rejected".to_string());
            return match self.code {
                Some(code @ (401 | 403)) => Err(FetchError::HttpStatus {
                    status: u16::try_from(code).unwrap_or(401),
                    message,
                }),
                _ => Err(FetchError::InvalidResponse(message)),
            };
        }

        let limits = self.data.map(|d| d.limits).unwrap_or_default();
        let windows = limits
            .iter()
            .filter_map(|limit| {
                let used = limit.used_percent()?;
                let reset_at = limit
                    .next_reset_time
                    .and_then(|ms| Utc.timestamp_millis_opt(ms).single());
                Some(RateWindow::new(limit.label(), used).with_reset_at(reset_at))
            })
            .collect();

        Ok(UsageSnapshot::new(ProviderKind::Zai).with_windows(windows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_limits() {
        let json = r#"{
            "code": 200, "msg": "ok", "success": true,
            "data": {"limits": [
                {"type": "TOKENS_LIMIT", "percentage": 12, "nextResetTime": 1735732800000},
                {"type": "TIME_LIMIT", "usage": 1000, "currentValue": 250}
            ]}
        }"#;
        let response: ZaiQuotaResponse = serde_json::from_str(json).unwrap();
        let snapshot = response.into_snapshot().unwrap();

        assert_eq!(snapshot.windows.len(), 2);
        assert_eq!(snapshot.windows[0].label, "Tokens");
        assert_eq!(snapshot.windows[0].used_percent, 12.0);
        assert_eq!(
            snapshot.windows[0].reset_at.map(|t| t.timestamp()),
            Some(1_735_732_800)
        );
        assert_eq!(snapshot.windows[1].label, "Month");
        assert_eq!(snapshot.windows[1].used_percent, 25.0);
    }

    #[test]
    fn test_rejected_envelope() {
        let json = r#"{"code": 401, "msg": "token expired", "success": false}"#;
        let response: ZaiQuotaResponse = serde_json::from_str(json).unwrap();
        let err = response.into_snapshot().unwrap_err();
        assert!(matches!(err, FetchError::HttpStatus { status: 401, .. }));

        let json = r#"{"code": 500, "msg": "boom", "success": false}"#;
        let response: ZaiQuotaResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            response.into_snapshot(),
            Err(FetchError::InvalidResponse(_))
        ));
    }
}
