//! Canonical records that every provider response is normalized into.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Geolocation of an address.
///
/// Every field is optional and absent fields are omitted when serialized, so
/// two records can be compared by which keys they carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asn: Option<String>,
}

/// Network and anonymity classification of an address.
///
/// The boolean flags default to `false` when a provider does not report the
/// signal. A `false` here therefore means "not reported as such", not "known
/// not to be": callers must not read it as a confirmed negative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalSecurity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
    #[serde(default)]
    pub is_proxy: bool,
    #[serde(default)]
    pub is_vpn: bool,
    #[serde(default)]
    pub is_tor: bool,
    #[serde(default)]
    pub is_crawler: bool,
}

/// The caller's own public address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentAddress {
    pub ip_address: IpAddr,
    /// Endpoint that reported the address.
    pub api_url: String,
}
