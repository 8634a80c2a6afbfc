//! Geolocation providers.

use super::{Normalizer, ProviderError, ProviderSpec};
use crate::canonical::CanonicalLocation;
use crate::config::ProviderConfig;
use crate::normalize::{
    f64_field, first_f64, first_str, nested, object, split_coordinates, str_field,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response schema of a location provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSchema {
    /// `https://ipapi.co/{ip}/json/`
    IpapiCo,
    /// `http://ip-api.com/json/{ip}`
    IpApiCom,
    /// `https://ipinfo.io/{ip}/json`, coordinates as one `loc` string.
    IpinfoIo,
    /// `https://ipwhois.app/json/{ip}`, network data nested under `connection`.
    Ipwhois,
    /// Already canonical, or close to it. Accepts common key aliases.
    Canonical,
}

impl LocationSchema {
    pub fn normalizer(self) -> Normalizer<CanonicalLocation> {
        match self {
            LocationSchema::IpapiCo => parse_ipapi_co,
            LocationSchema::IpApiCom => parse_ip_api_com,
            LocationSchema::IpinfoIo => parse_ipinfo_io,
            LocationSchema::Ipwhois => parse_ipwhois,
            LocationSchema::Canonical => parse_canonical,
        }
    }
}

/// Build the ordered location chain from configuration.
pub fn chain(
    providers: &[ProviderConfig<LocationSchema>],
) -> Vec<ProviderSpec<CanonicalLocation>> {
    providers
        .iter()
        .map(|p| ProviderSpec::new(&p.name, &p.endpoint, p.schema.normalizer()))
        .collect()
}

fn parse_ipapi_co(raw: &Value) -> Result<CanonicalLocation, ProviderError> {
    object(raw)?;
    if raw.get("error").and_then(Value::as_bool).unwrap_or(false) {
        let reason = first_str(raw, &["reason", "message"]).unwrap_or_default();
        return Err(ProviderError::MalformedBody(format!(
            "ipapi.co reported an error: {}",
            reason
        )));
    }

    Ok(CanonicalLocation {
        country: str_field(raw, "country_name"),
        region: str_field(raw, "region"),
        city: str_field(raw, "city"),
        latitude: f64_field(raw, "latitude"),
        longitude: f64_field(raw, "longitude"),
        timezone: str_field(raw, "timezone"),
        isp: str_field(raw, "org"),
        postal_code: str_field(raw, "postal"),
        asn: str_field(raw, "asn"),
    })
}

fn parse_ip_api_com(raw: &Value) -> Result<CanonicalLocation, ProviderError> {
    check_ip_api_status(raw)?;

    Ok(CanonicalLocation {
        country: str_field(raw, "country"),
        region: str_field(raw, "regionName"),
        city: str_field(raw, "city"),
        latitude: f64_field(raw, "lat"),
        longitude: f64_field(raw, "lon"),
        timezone: str_field(raw, "timezone"),
        isp: str_field(raw, "isp"),
        postal_code: str_field(raw, "zip"),
        asn: str_field(raw, "as"),
    })
}

fn parse_ipinfo_io(raw: &Value) -> Result<CanonicalLocation, ProviderError> {
    object(raw)?;
    if raw.get("bogon").and_then(Value::as_bool).unwrap_or(false) {
        return Err(ProviderError::MalformedBody(
            "ipinfo.io has no data for bogon addresses".to_string(),
        ));
    }

    let coordinates = str_field(raw, "loc").and_then(|loc| split_coordinates(&loc));

    Ok(CanonicalLocation {
        country: str_field(raw, "country"),
        region: str_field(raw, "region"),
        city: str_field(raw, "city"),
        latitude: coordinates.map(|(lat, _)| lat),
        longitude: coordinates.map(|(_, lon)| lon),
        timezone: str_field(raw, "timezone"),
        isp: str_field(raw, "org"),
        postal_code: str_field(raw, "postal"),
        asn: None,
    })
}

fn parse_ipwhois(raw: &Value) -> Result<CanonicalLocation, ProviderError> {
    check_ipwhois_success(raw)?;

    // Older responses carry a plain string, newer ones an object with `id`.
    let timezone = match raw.get("timezone") {
        Some(Value::Object(_)) => raw.get("timezone").and_then(|tz| str_field(tz, "id")),
        _ => str_field(raw, "timezone"),
    };
    let connection = nested(raw, "connection");

    Ok(CanonicalLocation {
        country: str_field(raw, "country"),
        region: str_field(raw, "region"),
        city: str_field(raw, "city"),
        latitude: f64_field(raw, "latitude"),
        longitude: f64_field(raw, "longitude"),
        timezone,
        isp: connection.and_then(|c| str_field(c, "isp")),
        postal_code: str_field(raw, "postal"),
        asn: connection.and_then(|c| str_field(c, "asn")),
    })
}

/// Alias-tolerant mapper. Canonical keys win over aliases, so a canonical
/// record maps onto itself.
pub fn parse_canonical(raw: &Value) -> Result<CanonicalLocation, ProviderError> {
    object(raw)?;

    Ok(CanonicalLocation {
        country: first_str(raw, &["country", "country_name"]),
        region: first_str(raw, &["region", "regionName"]),
        city: str_field(raw, "city"),
        latitude: first_f64(raw, &["latitude", "lat"]),
        longitude: first_f64(raw, &["longitude", "lon"]),
        timezone: str_field(raw, "timezone"),
        isp: first_str(raw, &["isp", "org"]),
        postal_code: first_str(raw, &["postal_code", "postal", "zip"]),
        asn: first_str(raw, &["asn", "as"]),
    })
}

/// ip-api.com answers 200 with `"status": "fail"` for reserved ranges.
pub(super) fn check_ip_api_status(raw: &Value) -> Result<(), ProviderError> {
    object(raw)?;
    match raw.get("status").and_then(Value::as_str) {
        Some("fail") => Err(ProviderError::MalformedBody(format!(
            "ip-api.com reported failure: {}",
            str_field(raw, "message").unwrap_or_default()
        ))),
        _ => Ok(()),
    }
}

/// ipwhois answers 200 with `"success": false` on errors.
pub(super) fn check_ipwhois_success(raw: &Value) -> Result<(), ProviderError> {
    object(raw)?;
    match raw.get("success").and_then(Value::as_bool) {
        Some(false) => Err(ProviderError::MalformedBody(format!(
            "ipwhois reported failure: {}",
            str_field(raw, "message").unwrap_or_default()
        ))),
        _ => Ok(()),
    }
}
