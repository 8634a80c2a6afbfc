//! Configuration types for the find-my-ip agent.

use crate::fetcher::DEFAULT_USER_AGENT;
use crate::providers::location::LocationSchema;
use crate::providers::security::SecuritySchema;
use crate::providers::{ipify, IP_PLACEHOLDER};
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// HTTP settings shared by every provider call.
    #[serde(default)]
    pub settings: Settings,

    /// Retry policy for current-address discovery.
    #[serde(default)]
    pub retry: RetryConfig,

    /// The single current-address source.
    #[serde(default)]
    pub current_ip: CurrentIpConfig,

    /// Location providers, highest priority first.
    #[serde(default = "default_location_providers")]
    pub location_providers: Vec<ProviderConfig<LocationSchema>>,

    /// Security providers, highest priority first.
    #[serde(default = "default_security_providers")]
    pub security_providers: Vec<ProviderConfig<SecuritySchema>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            retry: RetryConfig::default(),
            current_ip: CurrentIpConfig::default(),
            location_providers: default_location_providers(),
            security_providers: default_security_providers(),
        }
    }
}

/// Global HTTP settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    /// Client marker sent as `User-Agent` on every call.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Settings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_timeout() -> u64 {
    10_000
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Attempts before giving up (>= 1).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff unit in milliseconds; attempt `i` waits `unit * 2^i`.
    #[serde(default = "default_backoff_unit")]
    pub backoff_unit_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_unit_ms: default_backoff_unit(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.backoff_unit_ms))
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_unit() -> u64 {
    1000
}

/// Current-address source.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CurrentIpConfig {
    #[serde(default = "default_current_name")]
    pub name: String,

    #[serde(default = "default_current_endpoint")]
    pub endpoint: String,
}

impl Default for CurrentIpConfig {
    fn default() -> Self {
        Self {
            name: default_current_name(),
            endpoint: default_current_endpoint(),
        }
    }
}

fn default_current_name() -> String {
    ipify::NAME.to_string()
}

fn default_current_endpoint() -> String {
    ipify::DEFAULT_ENDPOINT.to_string()
}

/// One entry of a fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProviderConfig<S> {
    /// Unique within its chain; reported as `provider_used`.
    pub name: String,

    /// URL template; `{ip}` is replaced by the target address.
    pub endpoint: String,

    /// Response schema, selects the mapper.
    pub schema: S,
}

impl<S> ProviderConfig<S> {
    pub fn new(name: &str, endpoint: &str, schema: S) -> Self {
        Self {
            name: name.to_string(),
            endpoint: endpoint.to_string(),
            schema,
        }
    }
}

fn default_location_providers() -> Vec<ProviderConfig<LocationSchema>> {
    vec![
        ProviderConfig::new("ipapi.co", "https://ipapi.co/{ip}/json/", LocationSchema::IpapiCo),
        ProviderConfig::new("ip-api.com", "http://ip-api.com/json/{ip}", LocationSchema::IpApiCom),
        ProviderConfig::new("ipinfo.io", "https://ipinfo.io/{ip}/json", LocationSchema::IpinfoIo),
        ProviderConfig::new("ipwhois.io", "https://ipwhois.app/json/{ip}", LocationSchema::Ipwhois),
    ]
}

fn default_security_providers() -> Vec<ProviderConfig<SecuritySchema>> {
    vec![
        ProviderConfig::new("ipwhois.io", "https://ipwhois.app/json/{ip}", SecuritySchema::Ipwhois),
        ProviderConfig::new("ip-api.com", "http://ip-api.com/json/{ip}", SecuritySchema::IpApiCom),
    ]
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate YAML, expanding `${VAR}` references first.
    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let expanded = expand_env_vars(content);
        let config: Config = serde_yaml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.settings.timeout_ms == 0 {
            anyhow::bail!("settings.timeout_ms must be > 0");
        }

        if self.settings.user_agent.trim().is_empty() {
            anyhow::bail!("settings.user_agent must not be empty");
        }

        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be >= 1");
        }

        if self.current_ip.name.trim().is_empty() || self.current_ip.endpoint.trim().is_empty() {
            anyhow::bail!("current_ip needs a name and an endpoint");
        }

        validate_chain("location_providers", &self.location_providers)?;
        validate_chain("security_providers", &self.security_providers)?;

        Ok(())
    }

    /// Retry policy for current-address discovery.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.policy()
    }

    /// Generate example configuration YAML.
    pub fn example() -> String {
        r#"# find-my-ip configuration

settings:
  timeout_ms: 10000            # per-request timeout
  user_agent: "find-my-ip/0.1.0"

# Retry policy for current-address discovery (single source)
retry:
  max_attempts: 3
  backoff_unit_ms: 1000        # waits 1s, 2s, 4s, ...

current_ip:
  name: ipify
  endpoint: "https://api.ipify.org?format=json"

# Tried top to bottom, first success wins.
# schema: ipapi_co, ip_api_com, ipinfo_io, ipwhois or canonical
location_providers:
  - name: ipapi.co
    endpoint: "https://ipapi.co/{ip}/json/"
    schema: ipapi_co
  - name: ip-api.com
    endpoint: "http://ip-api.com/json/{ip}"
    schema: ip_api_com
  - name: ipinfo.io
    endpoint: "https://ipinfo.io/{ip}/json?token=${IPINFO_TOKEN}"
    schema: ipinfo_io
  - name: ipwhois.io
    endpoint: "https://ipwhois.app/json/{ip}"
    schema: ipwhois

# schema: ipwhois, ip_api_com or canonical
security_providers:
  - name: ipwhois.io
    endpoint: "https://ipwhois.app/json/{ip}"
    schema: ipwhois
  - name: ip-api.com
    endpoint: "http://ip-api.com/json/{ip}?fields=66846719"
    schema: ip_api_com
"#
        .to_string()
    }
}

fn validate_chain<S>(field: &str, providers: &[ProviderConfig<S>]) -> anyhow::Result<()> {
    if providers.is_empty() {
        anyhow::bail!("{} must list at least one provider", field);
    }

    let mut seen = HashSet::new();
    for provider in providers {
        if provider.name.trim().is_empty() {
            anyhow::bail!("{}: provider name must not be empty", field);
        }
        if !seen.insert(provider.name.as_str()) {
            anyhow::bail!("{}: duplicate provider name '{}'", field, provider.name);
        }
        if !provider.endpoint.contains(IP_PLACEHOLDER) {
            anyhow::bail!(
                "{}: endpoint of '{}' has no {} placeholder: {}",
                field,
                provider.name,
                IP_PLACEHOLDER,
                provider.endpoint
            );
        }
    }

    Ok(())
}

/// Expand environment variables in the format ${VAR_NAME}.
fn expand_env_vars(content: &str) -> String {
    let re = match regex::Regex::new(r"\$\{([^}]+)\}") {
        Ok(re) => re,
        Err(_) => return content.to_string(),
    };

    re.replace_all(content, |caps: &regex::Captures| {
        std::env::var(&caps[1]).unwrap_or_default()
    })
    .into_owned()
}
