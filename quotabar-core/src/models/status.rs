//! Provider status types.
//!
//! - [`ProviderStatus`] - Service health information
//! - [`StatusIndicator`] - Status levels

use serde::{Deserialize, Serialize};

// ============================================================================
// Provider Status
// ============================================================================

/// Provider service status, independent of the user's own quota.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    /// Status indicator level.
    pub indicator: StatusIndicator,
    /// Human-readable status description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ProviderStatus {
    /// Creates an operational status.
    pub fn operational() -> Self {
        Self {
            indicator: StatusIndicator::None,
            description: None,
        }
    }

    /// Creates a new status with the given indicator and description.
    pub fn new(indicator: StatusIndicator, description: impl Into<String>) -> Self {
        Self {
            indicator,
            description: Some(description.into()),
        }
    }

    /// The degraded status shown next to stale numbers after a failed fetch.
    pub fn fetch_failed() -> Self {
        Self::new(StatusIndicator::Minor, "Fetch failed")
    }

    /// Returns true if the service is fully operational.
    pub fn is_operational(&self) -> bool {
        self.indicator == StatusIndicator::None
    }

    /// Returns true if there's any degradation or outage.
    pub fn has_issues(&self) -> bool {
        !matches!(self.indicator, StatusIndicator::None | StatusIndicator::Unknown)
    }
}

impl Default for ProviderStatus {
    fn default() -> Self {
        Self::operational()
    }
}

// ============================================================================
// Status Indicator
// ============================================================================

/// Status indicator levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatusIndicator {
    /// Operational - no issues.
    #[default]
    None,
    /// Minor issues - degraded performance.
    Minor,
    /// Major issues - partial outage.
    Major,
    /// Critical issues - major outage.
    Critical,
    /// Under scheduled maintenance.
    Maintenance,
    /// Status unknown.
    Unknown,
}

impl StatusIndicator {
    /// Returns a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "Operational",
            Self::Minor => "Degraded",
            Self::Major => "Partial Outage",
            Self::Critical => "Major Outage",
            Self::Maintenance => "Under Maintenance",
            Self::Unknown => "Unknown",
        }
    }

    /// Parses a statuspage.io indicator string; unrecognized values map to `Unknown`.
    pub fn from_statuspage(indicator: &str) -> Self {
        match indicator.to_lowercase().as_str() {
            "none" => Self::None,
            "minor" => Self::Minor,
            "major" => Self::Major,
            "critical" => Self::Critical,
            "maintenance" => Self::Maintenance,
            _ => Self::Unknown,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
