//! find-my-ip agent: the operation surface consumed by the hosting runtime.

use crate::aggregator::{Aggregator, ComprehensiveInfo};
use crate::canonical::{CanonicalLocation, CanonicalSecurity, CurrentAddress};
use crate::config::Config;
use crate::fetcher::{ConnectivityReport, Fetch, HttpFetcher};
use crate::providers::{ipify, location, security, ProviderSpec};
use crate::resolver::FallbackResolver;
use crate::result::{ErrorKind, LookupResult};
use crate::retry::{retry, RetryPolicy};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::net::IpAddr;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

const RETRY_LABEL: &str = "retrieve IP address";

/// Current address plus optional location.
#[derive(Debug, Clone, Serialize)]
pub struct IpInfo {
    pub ip_address: IpAddr,
    /// Provider that supplied `ip_address`, or `"caller"` if it was given.
    pub source: String,
    pub location_info: Option<CanonicalLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_warning: Option<String>,
}

/// Advisory request statistics.
#[derive(Debug, Clone, Serialize)]
pub struct RequestMetadata {
    pub request_count: u64,
    pub last_request_time: Option<DateTime<Utc>>,
    pub started_at: DateTime<Utc>,
}

/// Counter for observability only. Races are tolerated; nothing depends on
/// exact values.
#[derive(Debug, Default)]
struct RequestStats {
    count: AtomicU64,
    last_request_ms: AtomicI64,
}

impl RequestStats {
    fn record(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.last_request_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    fn last_request(&self) -> Option<DateTime<Utc>> {
        match self.last_request_ms.load(Ordering::Relaxed) {
            0 => None,
            ms => DateTime::from_timestamp_millis(ms),
        }
    }
}

/// IP lookup agent.
pub struct FindMyIpAgent {
    fetcher: Arc<dyn Fetch>,
    http: Option<HttpFetcher>,
    current: ProviderSpec<IpAddr>,
    aggregator: Aggregator,
    retry_policy: RetryPolicy,
    stats: RequestStats,
    started_at: DateTime<Utc>,
}

impl FindMyIpAgent {
    /// Create an agent that talks to the configured providers over HTTP.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        config.validate()?;
        let http = HttpFetcher::new(config.settings.timeout(), &config.settings.user_agent)?;
        let fetcher: Arc<dyn Fetch> = Arc::new(http.clone());

        let mut agent = Self::with_fetcher(&config, fetcher)?;
        agent.http = Some(http);
        Ok(agent)
    }

    /// Create an agent over an arbitrary fetcher.
    ///
    /// The configuration is validated first, so every provider the agent can
    /// report in `provider_used` has a non-empty name and no chain is empty.
    pub fn with_fetcher(config: &Config, fetcher: Arc<dyn Fetch>) -> anyhow::Result<Self> {
        config.validate()?;

        let location = FallbackResolver::new(
            "location",
            location::chain(&config.location_providers),
            fetcher.clone(),
        );
        let security = FallbackResolver::new(
            "security",
            security::chain(&config.security_providers),
            fetcher.clone(),
        );

        info!(
            location_providers = location.providers().len(),
            security_providers = security.providers().len(),
            current_ip = %config.current_ip.name,
            "find-my-ip agent initialized"
        );

        Ok(Self {
            fetcher,
            http: None,
            current: ipify::spec(&config.current_ip.name, &config.current_ip.endpoint),
            aggregator: Aggregator::new(location, security),
            retry_policy: config.retry_policy(),
            stats: RequestStats::default(),
            started_at: Utc::now(),
        })
    }

    /// Current public address, with an optional retry budget.
    ///
    /// `None` makes exactly one attempt.
    pub async fn current_ip(&self, max_retries: Option<u32>) -> LookupResult<CurrentAddress> {
        self.stats.record();
        match max_retries {
            Some(attempts) => self.fetch_current_with_retry(attempts).await,
            None => self.fetch_current().await,
        }
    }

    /// Current public address, retried up to `max_attempts` times with
    /// exponential backoff.
    pub async fn current_ip_with_retry(&self, max_attempts: u32) -> LookupResult<CurrentAddress> {
        self.stats.record();
        self.fetch_current_with_retry(max_attempts).await
    }

    /// Address info. Without `ip`, the current address is discovered first.
    ///
    /// A failed location lookup does not fail the call; it is reported in
    /// `location_warning`.
    pub async fn ip_info(&self, ip: Option<&str>, include_location: bool) -> LookupResult<IpInfo> {
        self.stats.record();

        let (ip, source) = match ip {
            Some(raw) => match parse_ip(raw) {
                Ok(ip) => (ip, "caller".to_string()),
                Err(e) => return e,
            },
            None => {
                let current = self.fetch_current().await;
                match (current.data(), current.provider_used()) {
                    (Some(address), Some(provider)) => (address.ip_address, provider.to_string()),
                    _ => {
                        return current.cast_error().unwrap_or_else(|| {
                            LookupResult::error(
                                ErrorKind::MalformedBodyError,
                                "current address lookup returned no data",
                            )
                        })
                    }
                }
            }
        };

        let mut info = IpInfo {
            ip_address: ip,
            source: source.clone(),
            location_info: None,
            location_warning: None,
        };

        if include_location {
            let location = self.aggregator.location().resolve(&ip).await;
            match location.message().map(str::to_string) {
                Some(message) => {
                    warn!(ip = %ip, error = %message, "Failed to get location info");
                    info.location_warning = Some(message);
                }
                None => info.location_info = location.into_data(),
            }
        }

        LookupResult::success(info, source)
    }

    /// Location and security for `ip`. Never an error envelope for a valid
    /// address, see [`Aggregator::resolve`].
    pub async fn comprehensive_info(&self, ip: &str) -> LookupResult<ComprehensiveInfo> {
        self.stats.record();
        match parse_ip(ip) {
            Ok(ip) => self.aggregator.resolve(&ip).await,
            Err(e) => e,
        }
    }

    /// Security classification through the security chain.
    pub async fn security_info(&self, ip: &str) -> LookupResult<CanonicalSecurity> {
        self.stats.record();
        match parse_ip(ip) {
            Ok(ip) => self.aggregator.security().resolve(&ip).await,
            Err(e) => e,
        }
    }

    /// Geolocation through the location chain.
    pub async fn location(&self, ip: &str) -> LookupResult<CanonicalLocation> {
        self.stats.record();
        match parse_ip(ip) {
            Ok(ip) => self.aggregator.location().resolve(&ip).await,
            Err(e) => e,
        }
    }

    /// Connectivity check against an arbitrary endpoint.
    ///
    /// Returns `None` for agents built with [`FindMyIpAgent::with_fetcher`].
    pub async fn probe(&self, url: &str) -> Option<ConnectivityReport> {
        match &self.http {
            Some(http) => Some(http.probe(url).await),
            None => None,
        }
    }

    pub fn request_metadata(&self) -> RequestMetadata {
        RequestMetadata {
            request_count: self.stats.count(),
            last_request_time: self.stats.last_request(),
            started_at: self.started_at,
        }
    }

    /// Log lifetime statistics. The agent holds no other resources.
    pub fn shutdown(&self) {
        info!(
            requests = self.stats.count(),
            started_at = %self.started_at,
            "find-my-ip agent shutting down"
        );
    }

    async fn fetch_current(&self) -> LookupResult<CurrentAddress> {
        let url = self.current.url_for(None);

        let outcome = match self.fetcher.get_json(&url).await {
            Ok(raw) => self.current.normalize(&raw),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(ip_address) => {
                info!(ip = %ip_address, provider = self.current.name(), "Retrieved current IP");
                LookupResult::success(
                    CurrentAddress {
                        ip_address,
                        api_url: url,
                    },
                    self.current.name(),
                )
            }
            Err(e) => {
                warn!(provider = self.current.name(), error = %e, "Current IP lookup failed");
                LookupResult::error(e.kind(), e.to_string())
            }
        }
    }

    async fn fetch_current_with_retry(&self, max_attempts: u32) -> LookupResult<CurrentAddress> {
        let policy = self.retry_policy.with_max_attempts(max_attempts);
        retry(&policy, RETRY_LABEL, |_| self.fetch_current()).await
    }
}

fn parse_ip<T>(raw: &str) -> Result<IpAddr, LookupResult<T>> {
    raw.trim().parse().map_err(|_| {
        LookupResult::error(
            ErrorKind::InvalidAddress,
            format!("Invalid IP address: {:?}", raw),
        )
    })
}
