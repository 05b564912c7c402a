//! Helpers shared by provider adapters.

use chrono::{DateTime, TimeZone, Utc};
use quotabar_core::{Credentials, ProviderKind, ProviderStatus, UsageSnapshot};
use quotabar_fetch::{FetchContext, FetchError};
use tracing::{debug, warn};

/// Returns the provider's token or a `MissingCredentials` error.
pub(crate) fn require_token(
    credentials: &Credentials,
    kind: ProviderKind,
) -> Result<&str, FetchError> {
    credentials
        .token(kind)
        .ok_or_else(|| FetchError::MissingCredentials(format!("no token for {kind}")))
}

/// Converts an adapter result into a snapshot, capturing errors as data.
pub(crate) fn into_snapshot(
    kind: ProviderKind,
    result: Result<UsageSnapshot, FetchError>,
) -> UsageSnapshot {
    match result {
        Ok(mut snapshot) => {
            snapshot.sanitize();
            debug!(provider = %kind, windows = snapshot.windows.len(), "Usage fetched");
            snapshot
        }
        Err(e) => {
            let error = e.to_usage_error();
            if error.is_expected_missing() {
                debug!(provider = %kind, error = %e, "Provider not configured");
            } else {
                warn!(provider = %kind, error = %e, "Usage fetch failed");
            }
            UsageSnapshot::from_error(kind, error)
        }
    }
}

/// Reads a statuspage.io endpoint, swallowing failures.
pub(crate) async fn poll_status(
    ctx: &FetchContext,
    kind: ProviderKind,
    url: &str,
) -> Option<ProviderStatus> {
    match ctx.status.fetch_status(url).await {
        Ok(status) => Some(status),
        Err(e) => {
            debug!(provider = %kind, error = %e, "Status unavailable");
            None
        }
    }
}

/// Parses an RFC 3339 timestamp.
pub(crate) fn parse_rfc3339(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parses a unix timestamp in seconds.
pub(crate) fn from_unix_secs(secs: Option<i64>) -> Option<DateTime<Utc>> {
    secs.and_then(|s| Utc.timestamp_opt(s, 0).single())
}

/// Returns `used / limit` as a percentage, if the limit is positive.
pub(crate) fn percent_of(used: f64, limit: f64) -> Option<f64> {
    (limit > 0.0).then(|| used / limit * 100.0)
}

/// Human label for a window length in minutes, e.g. "5h", "Week".
pub(crate) fn window_label(minutes: i64) -> String {
    match minutes {
        10_080 => "Week".to_string(),
        1_440 => "Day".to_string(),
        m if m >= 43_200 => "Month".to_string(),
        m if m >= 60 && m % 60 == 0 => format!("{}h", m / 60),
        m => format!("{m}m"),
    }
}

// ============================================================================
// Tests
// ============================================================================
