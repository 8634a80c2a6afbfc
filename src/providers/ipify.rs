//! Current public address discovery.
//!
//! There is exactly one source for this, so it is wrapped by the retry
//! wrapper instead of a fallback chain.

use super::{ProviderError, ProviderSpec};
use crate::normalize::{object, str_field};
use serde_json::Value;
use std::net::IpAddr;

/// Name reported as `provider_used`.
pub const NAME: &str = "ipify";

/// Default endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.ipify.org?format=json";

/// Build the current-address provider for `endpoint`.
pub fn spec(name: &str, endpoint: &str) -> ProviderSpec<IpAddr> {
    ProviderSpec::new(name, endpoint, parse)
}

/// Extract the `ip` field, which must be a valid address.
pub fn parse(raw: &Value) -> Result<IpAddr, ProviderError> {
    object(raw)?;
    let ip = str_field(raw, "ip").ok_or_else(|| {
        ProviderError::MalformedBody("No IP address found in API response".to_string())
    })?;
    ip.trim()
        .parse()
        .map_err(|_| ProviderError::MalformedBody(format!("not an IP address: {:?}", ip)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_v4_and_v6() {
        assert_eq!(
            parse(&json!({"ip": "203.0.113.7"})).unwrap(),
            "203.0.113.7".parse::<IpAddr>().unwrap()
        );
        assert_eq!(
            parse(&json!({"ip": "2001:db8::1"})).unwrap(),
            "2001:db8::1".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_parse_missing_ip() {
        let err = parse(&json!({})).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedBody(_)));
    }

    #[test]
    fn test_parse_garbage_ip() {
        assert!(parse(&json!({"ip": "not-an-ip"})).is_err());
        assert!(parse(&json!({"ip": "999.1.1.1"})).is_err());
    }

    #[test]
    fn test_spec_has_no_placeholder() {
        let spec = spec(NAME, DEFAULT_ENDPOINT);
        assert_eq!(spec.url_for(None), DEFAULT_ENDPOINT);
        assert_eq!(spec.name(), "ipify");
    }
}
