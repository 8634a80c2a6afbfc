//! Provider descriptors and the per-provider response mappers.
//!
//! A provider is plain data: a name, an endpoint template and a function
//! pointer that maps the raw JSON body to a canonical record. An ordered
//! `Vec<ProviderSpec<T>>` is the whole plugin mechanism.

pub mod ipify;
pub mod location;
pub mod security;

use crate::result::ErrorKind;
use serde_json::Value;
use std::net::IpAddr;
use thiserror::Error;

/// Placeholder substituted with the target address in endpoint templates.
pub const IP_PLACEHOLDER: &str = "{ip}";

/// Failure of a single provider call.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Connection, DNS or timeout failure.
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response. The body is never interpreted.
    #[error("HTTP error {code}")]
    HttpStatus { code: u16 },

    /// Body was not JSON, or was JSON the mapper could not use.
    #[error("Invalid response: {0}")]
    MalformedBody(String),
}

impl ProviderError {
    /// Result-level classification of this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::Network(_) => ErrorKind::NetworkError,
            ProviderError::HttpStatus { .. } => ErrorKind::HttpStatusError,
            ProviderError::MalformedBody(_) => ErrorKind::MalformedBodyError,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Network(format!("request timed out: {}", e))
        } else if let Some(status) = e.status() {
            ProviderError::HttpStatus {
                code: status.as_u16(),
            }
        } else if e.is_decode() {
            ProviderError::MalformedBody(e.to_string())
        } else {
            ProviderError::Network(e.to_string())
        }
    }
}

/// Pure mapping from a provider's raw body to a canonical record.
pub type Normalizer<T> = fn(&Value) -> Result<T, ProviderError>;

/// Static descriptor of one external data source.
pub struct ProviderSpec<T> {
    name: String,
    endpoint_template: String,
    normalize: Normalizer<T>,
}

impl<T> ProviderSpec<T> {
    pub fn new(
        name: impl Into<String>,
        endpoint_template: impl Into<String>,
        normalize: Normalizer<T>,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint_template: endpoint_template.into(),
            normalize,
        }
    }

    /// Provider name for logging and `provider_used`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build the request URL, substituting the address if one is given.
    pub fn url_for(&self, ip: Option<&IpAddr>) -> String {
        match ip {
            Some(ip) => self.endpoint_template.replace(IP_PLACEHOLDER, &ip.to_string()),
            None => self.endpoint_template.clone(),
        }
    }

    /// Map a raw body to the canonical record.
    pub fn normalize(&self, raw: &Value) -> Result<T, ProviderError> {
        (self.normalize)(raw)
    }
}

impl<T> Clone for ProviderSpec<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            endpoint_template: self.endpoint_template.clone(),
            normalize: self.normalize,
        }
    }
}

impl<T> std::fmt::Debug for ProviderSpec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSpec")
            .field("name", &self.name)
            .field("endpoint_template", &self.endpoint_template)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo(raw: &Value) -> Result<String, ProviderError> {
        raw.get("v")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ProviderError::MalformedBody("no v".to_string()))
    }

    #[test]
    fn test_url_for_substitutes_address() {
        let spec = ProviderSpec::new("test", "https://example.test/{ip}/json/", echo);
        let ip: IpAddr = "8.8.8.8".parse().unwrap();
        assert_eq!(spec.url_for(Some(&ip)), "https://example.test/8.8.8.8/json/");

        let ip6: IpAddr = "2001:4860:4860::8888".parse().unwrap();
        assert_eq!(
            spec.url_for(Some(&ip6)),
            "https://example.test/2001:4860:4860::8888/json/"
        );
    }

    #[test]
    fn test_url_for_self_lookup() {
        let spec = ProviderSpec::new("ipify", "https://api.ipify.org?format=json", echo);
        assert_eq!(spec.url_for(None), "https://api.ipify.org?format=json");
    }

    #[test]
    fn test_normalize_delegates() {
        let spec = ProviderSpec::new("test", "x", echo);
        assert_eq!(spec.normalize(&json!({"v": "ok"})).unwrap(), "ok");
        assert!(spec.normalize(&json!({})).is_err());
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ProviderError::Network("x".into()).kind(),
            ErrorKind::NetworkError
        );
        assert_eq!(
            ProviderError::HttpStatus { code: 500 }.kind(),
            ErrorKind::HttpStatusError
        );
        assert_eq!(
            ProviderError::MalformedBody("x".into()).kind(),
            ErrorKind::MalformedBodyError
        );
        assert_eq!(
            ProviderError::HttpStatus { code: 503 }.to_string(),
            "HTTP error 503"
        );
    }
}
