//! JSON output formatting.

use anyhow::Result;
use chrono::{DateTime, Utc};
use quotabar_core::{ModelInfo, ProviderKind, UsageSnapshot};
use quotabar_store::{CachedUsage, UsageUpdate};
use serde::Serialize;

use super::ProviderRow;

// ============================================================================
// Output Types
// ============================================================================

/// One controller update.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutput<'a> {
    pub provider: Option<ProviderKind>,
    pub usage: Option<&'a UsageSnapshot>,
}

/// One orchestrator result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryOutput {
    pub provider: ProviderKind,
    pub from_cache: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub fetched_at: DateTime<Utc>,
    #[serde(
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub status_fetched_at: Option<DateTime<Utc>>,
    pub usage: UsageSnapshot,
}

/// Provider info output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfoOutput {
    pub id: ProviderKind,
    pub display_name: String,
    pub cli_name: String,
    pub aliases: Vec<String>,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_credentials: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_page_url: Option<String>,
}

/// Detection result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionOutput<'a> {
    pub model: &'a ModelInfo,
    pub provider: Option<ProviderKind>,
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize + ?Sized>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats a controller update.
    pub fn format_update(&self, update: &UsageUpdate) -> Result<String> {
        self.format(&UpdateOutput {
            provider: update.provider,
            usage: update.usage.as_ref(),
        })
    }

    /// Formats orchestrator results, keeping their order.
    pub fn format_entries(&self, results: &[CachedUsage]) -> Result<String> {
        let outputs: Vec<EntryOutput> = results.iter().map(entry_output).collect();
        self.format(&outputs)
    }

    /// Formats the provider list.
    pub fn format_providers(&self, rows: &[ProviderRow]) -> Result<String> {
        let outputs: Vec<ProviderInfoOutput> = rows
            .iter()
            .map(|row| ProviderInfoOutput {
                id: row.descriptor.id,
                display_name: row.descriptor.display_name().to_string(),
                cli_name: row.descriptor.cli_name().to_string(),
                aliases: row
                    .descriptor
                    .cli
                    .aliases
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
                enabled: row.enabled,
                has_credentials: row.has_credentials,
                token_env: row.token_env.clone(),
                status_page_url: row.descriptor.status_url.map(str::to_string),
            })
            .collect();
        self.format(&outputs)
    }

    /// Formats a detection result.
    pub fn format_detection(&self, model: &ModelInfo, provider: Option<ProviderKind>) -> Result<String> {
        self.format(&DetectionOutput { model, provider })
    }
}

fn entry_output(result: &CachedUsage) -> EntryOutput {
    EntryOutput {
        provider: result.entry.usage.provider,
        from_cache: result.from_cache,
        fetched_at: result.entry.fetched_at,
        status_fetched_at: result.entry.status_fetched_at,
        usage: result.entry.merged_usage(),
    }
}
