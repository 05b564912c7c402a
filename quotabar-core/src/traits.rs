//! Trait definitions for Quotabar.
//!
//! This module defines the capability every provider adapter must satisfy.

use async_trait::async_trait;

use crate::models::{Credentials, ProviderKind, ProviderStatus, UsageSnapshot};

/// Capability for providers that can report usage quotas.
///
/// Implementors are responsible for:
/// - Reading the token they need from [`Credentials`]
/// - Fetching current usage from the provider's API or CLI
/// - Normalizing the response into a [`UsageSnapshot`]
///
/// `fetch_usage` never fails: every failure path is converted into a
/// snapshot whose `error` field is populated. Construction of a provider
/// must not perform I/O.
#[async_trait]
pub trait UsageProvider: Send + Sync {
    /// Returns the kind of provider this implementation handles.
    fn kind(&self) -> ProviderKind;

    /// Returns the display name for this provider.
    fn display_name(&self) -> &str {
        self.kind().display_name()
    }

    /// Fetches current usage for the account described by `credentials`.
    async fn fetch_usage(&self, credentials: &Credentials) -> UsageSnapshot;

    /// Returns true if this provider exposes a service status page.
    fn supports_status(&self) -> bool {
        false
    }

    /// Fetches the provider's service status.
    ///
    /// Returns `None` when the provider has no status page or the page
    /// could not be read.
    async fn fetch_status(&self) -> Option<ProviderStatus> {
        None
    }

    /// Cheap, synchronous probe for whether credentials are present.
    ///
    /// Returns `None` when the provider has no such probe.
    fn has_credentials(&self, _credentials: &Credentials) -> Option<bool> {
        None
    }
}
