//! Output formatting for CLI.

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

use anyhow::Result;
use quotabar_providers::ProviderDescriptor;

use crate::{Cli, OutputFormat};

/// A provider as listed by `quotabar providers`.
pub struct ProviderRow {
    pub descriptor: &'static ProviderDescriptor,
    pub enabled: bool,
    pub has_credentials: Option<bool>,
    pub token_env: Option<String>,
}

/// Prints with the formatter matching `--format`.
pub fn emit<T, J>(cli: &Cli, text: T, json: J) -> Result<()>
where
    T: FnOnce(&TextFormatter) -> String,
    J: FnOnce(&JsonFormatter) -> Result<String>,
{
    let output = match cli.format {
        OutputFormat::Text => text(&TextFormatter::new(!cli.no_color)),
        OutputFormat::Json => json(&JsonFormatter::new(cli.pretty))?,
    };
    println!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests;
