//! Location + security composite lookup.

use crate::canonical::{CanonicalLocation, CanonicalSecurity};
use crate::resolver::FallbackResolver;
use crate::result::LookupResult;
use serde::Serialize;
use std::net::IpAddr;
use tracing::{info, warn};

/// `provider_used` of every aggregate result.
pub const AGGREGATE_PROVIDER: &str = "aggregate";

/// Recorded for a half whose whole chain failed.
pub const UNKNOWN_PROVIDER: &str = "unknown";

/// Which provider served each half.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApisUsed {
    pub location: String,
    pub security: String,
}

/// Composite record. Either half may be `None`; callers must look at the
/// halves, not only at the envelope status.
#[derive(Debug, Clone, Serialize)]
pub struct ComprehensiveInfo {
    pub ip_address: IpAddr,
    pub location: Option<CanonicalLocation>,
    pub security: Option<CanonicalSecurity>,
    pub apis_used: ApisUsed,
    /// Both halves failed; no aggregate data was obtainable.
    pub degraded: bool,
}

/// Runs the location and security chains for one address.
pub struct Aggregator {
    location: FallbackResolver<CanonicalLocation>,
    security: FallbackResolver<CanonicalSecurity>,
}

impl Aggregator {
    pub fn new(
        location: FallbackResolver<CanonicalLocation>,
        security: FallbackResolver<CanonicalSecurity>,
    ) -> Self {
        Self { location, security }
    }

    pub fn location(&self) -> &FallbackResolver<CanonicalLocation> {
        &self.location
    }

    pub fn security(&self) -> &FallbackResolver<CanonicalSecurity> {
        &self.security
    }

    /// Resolve both halves, location first.
    ///
    /// Always returns a success envelope, even when both halves failed. In
    /// that case both are `None` and `degraded` is set.
    pub async fn resolve(&self, ip: &IpAddr) -> LookupResult<ComprehensiveInfo> {
        let location = self.location.resolve(ip).await;
        let security = self.security.resolve(ip).await;

        let apis_used = ApisUsed {
            location: location
                .provider_used()
                .unwrap_or(UNKNOWN_PROVIDER)
                .to_string(),
            security: security
                .provider_used()
                .unwrap_or(UNKNOWN_PROVIDER)
                .to_string(),
        };

        let location = location.into_data();
        let security = security.into_data();
        let degraded = location.is_none() && security.is_none();

        if degraded {
            warn!(ip = %ip, "No aggregate data obtainable");
        } else {
            info!(
                ip = %ip,
                location = %apis_used.location,
                security = %apis_used.security,
                "Aggregate lookup complete"
            );
        }

        LookupResult::success(
            ComprehensiveInfo {
                ip_address: *ip,
                location,
                security,
                apis_used,
                degraded,
            },
            AGGREGATE_PROVIDER,
        )
    }
}
