//! Text output formatting with progress bars and colors.

use chrono::{DateTime, Duration, Local, Utc};
use quotabar_core::{ProviderStatus, RateWindow, UsageError, UsageSnapshot};
use serde_json::Value;

use super::ProviderRow;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

// Progress bar characters
const BAR_FULL: char = '█';
const BAR_EMPTY: char = '░';

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
    bar_width: usize,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self {
            use_colors,
            bar_width: 10,
        }
    }

    /// Formats a provider's usage.
    pub fn format_usage(&self, snapshot: &UsageSnapshot) -> String {
        let mut lines = Vec::new();

        let mut header = self.bold(&snapshot.display_name);
        if let Some(status) = snapshot.status.as_ref().filter(|s| !s.is_operational()) {
            header.push_str(&format!(" {}", self.format_status(status)));
        }
        lines.push(header);

        for window in &snapshot.windows {
            lines.push(self.format_window(window, Utc::now()));
        }

        for (key, value) in &snapshot.extra {
            if let Some(text) = scalar(value) {
                lines.push(format!("{:<10} {}", format!("{}:", title_case(key)), self.cyan(&text)));
            }
        }

        if let Some(error) = &snapshot.error {
            lines.push(self.format_error(error, snapshot.has_windows()));
        }

        lines.join("\n")
    }

    /// Formats a usage window with progress bar.
    pub fn format_window(&self, window: &RateWindow, now: DateTime<Utc>) -> String {
        let used = window.clamped_percent();
        let bar = self.progress_bar(used);
        let pct = self.color_for_percent(used, &format!("{used:.0}% used"));

        let mut result = format!("{:<10} {} {}", format!("{}:", window.label), bar, pct);

        if let Some(reset_at) = window.reset_at {
            let reset = format_reset_time(reset_at, now);
            result.push_str(&format!("\n{:<10} Resets {}", "", self.dim(&reset)));
        } else if let Some(desc) = &window.reset_description {
            result.push_str(&format!("\n{:<10} Resets {}", "", self.dim(desc)));
        }

        result
    }

    /// Formats a progress bar filled to the used percentage.
    pub fn progress_bar(&self, percent_used: f64) -> String {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let filled = ((percent_used.clamp(0.0, 100.0) / 100.0) * self.bar_width as f64).round() as usize;
        let empty = self.bar_width.saturating_sub(filled);

        let bar = format!(
            "{}{}",
            BAR_FULL.to_string().repeat(filled),
            BAR_EMPTY.to_string().repeat(empty)
        );

        self.color_for_percent(percent_used, &bar)
    }

    /// Formats a provider status.
    pub fn format_status(&self, status: &ProviderStatus) -> String {
        let text = status
            .description
            .clone()
            .unwrap_or_else(|| status.indicator.label().to_string());
        if status.has_issues() {
            self.yellow(&format!("({text})"))
        } else {
            self.dim(&format!("({text})"))
        }
    }

    /// Formats an error. Errors shown next to real numbers are dimmed.
    pub fn format_error(&self, error: &UsageError, stale: bool) -> String {
        if error.is_expected_missing() {
            return self.dim(&format!("Not configured: {}", error.message));
        }
        if stale {
            self.dim(&format!("Last refresh failed: {}", error.message))
        } else {
            format!("{} {}", self.red("Error:"), error.message)
        }
    }

    /// Line appended to cached results.
    pub fn format_cache_note(&self, from_cache: bool, fetched_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
        let age = format_age(now - fetched_at);
        if from_cache {
            self.dim(&format!("cached, fetched {age}"))
        } else {
            self.dim(&format!("fetched {age}"))
        }
    }

    /// Formats the idle state.
    pub fn format_idle(&self) -> String {
        self.dim("No provider selected. Pin one with --provider or set a default.")
    }

    /// Formats provider list header.
    pub fn format_providers_header(&self) -> String {
        format!(
            "{:<16} {:<9} {:<9} {:<12} {}",
            self.bold("Provider"),
            self.bold("CLI"),
            self.bold("Enabled"),
            self.bold("Credentials"),
            self.bold("Token variable")
        )
    }

    /// Formats a single provider line.
    pub fn format_provider_line(&self, row: &ProviderRow) -> String {
        let enabled = if row.enabled {
            self.green("✓")
        } else {
            self.dim("−")
        };
        let credentials = match row.has_credentials {
            Some(true) => self.green("found"),
            Some(false) => self.dim("missing"),
            None => self.dim("n/a"),
        };

        format!(
            "{:<16} {:<9} {:<9} {:<12} {}",
            row.descriptor.display_name(),
            row.descriptor.cli_name(),
            enabled,
            credentials,
            row.token_env.as_deref().unwrap_or("−")
        )
    }

    // ========================================================================
    // Color/style helpers
    // ========================================================================

    fn color_for_percent(&self, used: f64, text: &str) -> String {
        if !self.use_colors {
            return text.to_string();
        }

        if used >= 90.0 {
            self.red(text)
        } else if used >= 70.0 {
            self.yellow(text)
        } else {
            self.green(text)
        }
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_colors {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }
}

// ============================================================================
// Time helpers
// ============================================================================

/// Formats a reset time as a countdown within a day, otherwise absolute.
pub fn format_reset_time(reset_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    if reset_at <= now {
        return "now".to_string();
    }

    let diff = reset_at - now;
    if diff < Duration::hours(1) {
        let mins = diff.num_minutes().max(1);
        format!("in {} minute{}", mins, if mins == 1 { "" } else { "s" })
    } else if diff < Duration::hours(24) {
        let hours = diff.num_hours();
        let mins = diff.num_minutes() % 60;
        if mins > 0 {
            format!("in {hours}h {mins}m")
        } else {
            format!("in {} hour{}", hours, if hours == 1 { "" } else { "s" })
        }
    } else {
        let local = reset_at.with_timezone(&Local);
        local.format("%a %b %-d at %-I:%M %p").to_string()
    }
}

/// Formats an elapsed duration as "just now", "5m ago", "2h ago".
pub fn format_age(age: Duration) -> String {
    let secs = age.num_seconds().max(0);
    match secs {
        0..60 => "just now".to_string(),
        60..3600 => format!("{}m ago", secs / 60),
        3600..86_400 => format!("{}h ago", secs / 3600),
        _ => format!("{}d ago", secs / 86_400),
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn title_case(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
