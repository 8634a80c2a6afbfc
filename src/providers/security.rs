//! Network classification providers.
//!
//! Flags a provider does not report are left `false`; see
//! [`CanonicalSecurity`] for what that does and does not mean.

use super::location::{check_ip_api_status, check_ipwhois_success};
use super::{Normalizer, ProviderError, ProviderSpec};
use crate::canonical::CanonicalSecurity;
use crate::config::ProviderConfig;
use crate::normalize::{bool_field, nested, object, str_field};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response schema of a security provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SecuritySchema {
    /// `https://ipwhois.app/json/{ip}`, nested `connection` and `security`.
    Ipwhois,
    /// `http://ip-api.com/json/{ip}`, flat. Only reports proxy/hosting when
    /// those fields are requested.
    IpApiCom,
    /// Already canonical.
    Canonical,
}

impl SecuritySchema {
    pub fn normalizer(self) -> Normalizer<CanonicalSecurity> {
        match self {
            SecuritySchema::Ipwhois => parse_ipwhois,
            SecuritySchema::IpApiCom => parse_ip_api_com,
            SecuritySchema::Canonical => parse_canonical,
        }
    }
}

/// Build the ordered security chain from configuration.
pub fn chain(
    providers: &[ProviderConfig<SecuritySchema>],
) -> Vec<ProviderSpec<CanonicalSecurity>> {
    providers
        .iter()
        .map(|p| ProviderSpec::new(&p.name, &p.endpoint, p.schema.normalizer()))
        .collect()
}

fn parse_ipwhois(raw: &Value) -> Result<CanonicalSecurity, ProviderError> {
    check_ipwhois_success(raw)?;

    let empty = Value::Null;
    let connection = nested(raw, "connection").unwrap_or(&empty);
    let security = nested(raw, "security").unwrap_or(&empty);

    Ok(CanonicalSecurity {
        asn: str_field(connection, "asn"),
        isp: str_field(connection, "isp"),
        org: str_field(connection, "org"),
        is_proxy: bool_field(security, "proxy"),
        is_vpn: bool_field(security, "vpn"),
        is_tor: bool_field(security, "tor"),
        is_crawler: bool_field(security, "crawler"),
    })
}

fn parse_ip_api_com(raw: &Value) -> Result<CanonicalSecurity, ProviderError> {
    check_ip_api_status(raw)?;

    Ok(CanonicalSecurity {
        asn: str_field(raw, "as"),
        isp: str_field(raw, "isp"),
        org: str_field(raw, "org"),
        is_proxy: bool_field(raw, "proxy"),
        is_vpn: false,
        is_tor: false,
        is_crawler: false,
    })
}

fn parse_canonical(raw: &Value) -> Result<CanonicalSecurity, ProviderError> {
    object(raw)?;

    Ok(CanonicalSecurity {
        asn: str_field(raw, "asn"),
        isp: str_field(raw, "isp"),
        org: str_field(raw, "org"),
        is_proxy: bool_field(raw, "is_proxy"),
        is_vpn: bool_field(raw, "is_vpn"),
        is_tor: bool_field(raw, "is_tor"),
        is_crawler: bool_field(raw, "is_crawler"),
    })
}
