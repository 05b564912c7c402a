//! Kiro CLI output parser.
//!
//! Accepts the JSON report:
//!
//! ```json
//! {"planName": "Pro", "creditsUsed": 120, "creditsTotal": 1000, "resetsAt": "2025-02-01T00:00:00Z"}
//! ```
//!
//! or the text summary:
//!
//! ```text
//! Plan: Pro
//! Credits: 120/1000 (resets in 12 days)
//! ```

use quotabar_core::{ProviderKind, RateWindow, UsageSnapshot};
use quotabar_fetch::FetchError;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

use crate::common::{parse_rfc3339, percent_of};

// ============================================================================
// Patterns
// ============================================================================

/// ANSI escape sequences.
static ANSI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]").expect("Invalid regex")
});

/// "Credits: 120/1000" or "credits used 120 / 1,000"
static CREDITS_RATIO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)credits?[^\d\n]*([\d,]+(?:\.\d+)?)\s*/\s*([\d,]+(?:\.\d+)?)")
        .expect("Invalid regex")
});

/// "Credits: 12% used"
static CREDITS_PERCENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)credits?[^\d\n]*(\d+(?:\.\d+)?)\s*%").expect("Invalid regex")
});

/// "resets in 12 days" / "resets on Feb 1"
static RESET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)resets?\s+((?:in|on|at)\s+[^)\n]+)").expect("Invalid regex")
});

/// "Plan: Pro"
static PLAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)plan\s*:\s*([\w+ -]+)").expect("Invalid regex"));

// ============================================================================
// JSON Report
// ============================================================================

/// JSON usage report printed by newer CLI versions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KiroUsageReport {
    /// Plan name.
    #[serde(default)]
    pub plan_name: Option<String>,
    /// Credits used.
    #[serde(default)]
    pub credits_used: Option<f64>,
    /// Credit allowance.
    #[serde(default)]
    pub credits_total: Option<f64>,
    /// Reset time (ISO 8601).
    #[serde(default)]
    pub resets_at: Option<String>,
}

impl KiroUsageReport {
    fn to_snapshot(&self) -> Result<UsageSnapshot, FetchError> {
        let used = self
            .credits_used
            .zip(self.credits_total)
            .and_then(|(used, total)| percent_of(used, total))
            .ok_or_else(|| FetchError::InvalidResponse("no credit totals in report".into()))?;

        let window = RateWindow::new("Credits", used)
            .with_reset_at(parse_rfc3339(self.resets_at.as_deref()));
        Ok(with_plan(
            UsageSnapshot::new(ProviderKind::Kiro).with_windows(vec![window]),
            self.plan_name.as_deref(),
        ))
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses `kiro-cli /usage` output into a snapshot with a "Credits" window.
pub fn parse_usage_output(raw: &str) -> Result<UsageSnapshot, FetchError> {
    let text = ANSI_RE.replace_all(raw, "");
    let lower = text.to_lowercase();

    if lower.contains("not logged in") || lower.contains("login required") {
        return Err(FetchError::NotLoggedIn("kiro-cli reports no session".into()));
    }

    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        let report: KiroUsageReport = serde_json::from_str(trimmed)?;
        return report.to_snapshot();
    }

    let used = if let Some(caps) = CREDITS_RATIO_RE.captures(&text) {
        let used = parse_number(&caps[1]);
        let total = parse_number(&caps[2]);
        used.zip(total).and_then(|(u, t)| percent_of(u, t))
    } else {
        CREDITS_PERCENT_RE
            .captures(&text)
            .and_then(|caps| parse_number(&caps[1]))
    }
    .ok_or_else(|| FetchError::InvalidResponse("no credits in kiro-cli output".into()))?;

    let mut window = RateWindow::new("Credits", used);
    if let Some(caps) = RESET_RE.captures(&text) {
        window = window.with_reset_description(caps[1].trim());
    }

    let plan = PLAN_RE.captures(&text).map(|caps| caps[1].trim().to_string());
    Ok(with_plan(
        UsageSnapshot::new(ProviderKind::Kiro).with_windows(vec![window]),
        plan.as_deref(),
    ))
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse().ok()
}

fn with_plan(snapshot: UsageSnapshot, plan: Option<&str>) -> UsageSnapshot {
    match plan {
        Some(plan) => snapshot.with_extra("plan", serde_json::Value::String(plan.to_string())),
        None => snapshot,
    }
}

// ============================================================================
// Tests
// ============================================================================
