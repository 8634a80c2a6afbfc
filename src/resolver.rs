//! Ordered fallback chain over a set of providers.

use crate::fetcher::Fetch;
use crate::providers::ProviderSpec;
use crate::result::{ErrorKind, LookupResult};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Tries providers in their declared priority order and returns the first
/// normalized success.
///
/// Order encodes trust, so it is never changed at runtime. Each provider is
/// attempted at most once per call and attempts run one after another, never
/// concurrently.
pub struct FallbackResolver<T> {
    label: String,
    providers: Vec<ProviderSpec<T>>,
    fetcher: Arc<dyn Fetch>,
}

impl<T> FallbackResolver<T> {
    /// Create a resolver. `label` names the chain in logs and messages
    /// (e.g. "location").
    pub fn new(
        label: impl Into<String>,
        providers: Vec<ProviderSpec<T>>,
        fetcher: Arc<dyn Fetch>,
    ) -> Self {
        Self {
            label: label.into(),
            providers,
            fetcher,
        }
    }

    pub fn providers(&self) -> &[ProviderSpec<T>] {
        &self.providers
    }

    /// Resolve `ip` through the chain.
    ///
    /// Every per-provider failure is logged at warn level and treated the
    /// same way: move on to the next provider. Which provider failed for which
    /// reason is only visible in the log; the exhausted result just says
    /// `AllProvidersFailed`.
    pub async fn resolve(&self, ip: &IpAddr) -> LookupResult<T> {
        info!(chain = %self.label, ip = %ip, "Resolving");

        for provider in &self.providers {
            let url = provider.url_for(Some(ip));
            debug!(chain = %self.label, provider = provider.name(), url = %url, "Trying provider");

            let outcome = match self.fetcher.get_json(&url).await {
                Ok(raw) => provider.normalize(&raw),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(record) => {
                    info!(chain = %self.label, provider = provider.name(), ip = %ip, "Lookup succeeded");
                    return LookupResult::success(record, provider.name());
                }
                Err(e) => {
                    warn!(
                        chain = %self.label,
                        provider = provider.name(),
                        ip = %ip,
                        error = %e,
                        "Provider lookup failed"
                    );
                }
            }
        }

        error!(chain = %self.label, ip = %ip, "All providers failed");
        LookupResult::error(
            ErrorKind::AllProvidersFailed,
            format!("All {} providers failed", self.label),
        )
    }
}
