//! Providers command - list providers with enablement and credentials.

use anyhow::Result;
use quotabar_providers::ProviderRegistry;
use tracing::info;

use crate::output::{ProviderRow, emit};
use crate::session::Session;
use crate::{Cli, ExitCode};

/// Runs the providers command.
pub async fn run(cli: &Cli) -> Result<ExitCode> {
    info!("Listing providers");

    let session = Session::open(cli).await;
    let settings = session.settings.get().await;

    let mut rows = Vec::with_capacity(ProviderRegistry::count());
    for descriptor in ProviderRegistry::all() {
        let has_credentials = session
            .orchestrator
            .provider(descriptor.id)
            .and_then(|p| p.has_credentials(&session.credentials));
        rows.push(ProviderRow {
            descriptor,
            enabled: session.orchestrator.is_enabled(descriptor.id).await,
            has_credentials,
            token_env: settings.credential_env(descriptor.id),
        });
    }

    emit(
        cli,
        |text| {
            let mut lines = vec![text.format_providers_header(), "─".repeat(64)];
            lines.extend(rows.iter().map(|row| text.format_provider_line(row)));
            lines.push(String::new());
            lines.push(format!(
                "Total: {} providers ({} enabled)",
                rows.len(),
                rows.iter().filter(|r| r.enabled).count()
            ));
            lines.join("\n")
        },
        |json| json.format_providers(&rows),
    )?;

    Ok(ExitCode::Success)
}
