//! Missing-key tolerant accessors for raw provider payloads.
//!
//! Providers drift: keys disappear, numbers become strings, objects become
//! flat values. Every accessor here returns `None` (or `false`) instead of
//! failing, so absence in the payload becomes absence in the canonical record.

use crate::providers::ProviderError;
use serde_json::{Map, Value};

/// Require the payload to be a JSON object.
pub fn object(raw: &Value) -> Result<&Map<String, Value>, ProviderError> {
    raw.as_object().ok_or_else(|| {
        ProviderError::MalformedBody(format!("expected a JSON object, got {}", type_name(raw)))
    })
}

/// Sub-object under `key`, if present and an object.
pub fn nested<'a>(raw: &'a Value, key: &str) -> Option<&'a Value> {
    raw.get(key).filter(|v| v.is_object())
}

/// String value of `key`. Numbers are rendered as decimal strings; empty
/// strings count as absent.
pub fn str_field(raw: &Value, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First present string among alias keys.
pub fn first_str(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| str_field(raw, key))
}

/// Numeric value of `key`, accepting numbers and numeric strings.
pub fn f64_field(raw: &Value, key: &str) -> Option<f64> {
    match raw.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_f64(s),
        _ => None,
    }
}

/// First present number among alias keys.
pub fn first_f64(raw: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| f64_field(raw, key))
}

/// Boolean value of `key`; unreported or non-boolean signals read as `false`.
pub fn bool_field(raw: &Value, key: &str) -> bool {
    raw.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Split a `"lat,lon"` string into its two coordinates.
///
/// Yields both or neither: anything other than exactly two numeric parts
/// returns `None`.
pub fn split_coordinates(loc: &str) -> Option<(f64, f64)> {
    let mut parts = loc.split(',');
    let (lat, lon) = (parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    Some((parse_f64(lat)?, parse_f64(lon)?))
}

fn parse_f64(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_coordinates() {
        assert_eq!(split_coordinates("37.4,-122.1"), Some((37.4, -122.1)));
        assert_eq!(split_coordinates(" 52.52 , 13.40 "), Some((52.52, 13.40)));
    }

    #[test]
    fn test_split_coordinates_wrong_arity() {
        assert_eq!(split_coordinates("37.4"), None);
        assert_eq!(split_coordinates(""), None);
        assert_eq!(split_coordinates("37.4,-122.1,5"), None);
        assert_eq!(split_coordinates("1,2,3,4"), None);
    }

    #[test]
    fn test_split_coordinates_garbage_part() {
        // Never one valid and one garbage coordinate.
        assert_eq!(split_coordinates("37.4,west"), None);
        assert_eq!(split_coordinates("north,-122.1"), None);
        assert_eq!(split_coordinates("37.4,"), None);
    }

    #[test]
    fn test_str_field() {
        let raw = json!({"a": "x", "b": 15169, "c": "", "d": null, "e": true});
        assert_eq!(str_field(&raw, "a"), Some("x".to_string()));
        assert_eq!(str_field(&raw, "b"), Some("15169".to_string()));
        assert_eq!(str_field(&raw, "c"), None);
        assert_eq!(str_field(&raw, "d"), None);
        assert_eq!(str_field(&raw, "e"), None);
        assert_eq!(str_field(&raw, "missing"), None);
    }

    #[test]
    fn test_first_str_prefers_earlier_alias() {
        let raw = json!({"country_name": "Germany", "country": "DE"});
        assert_eq!(
            first_str(&raw, &["country_name", "country"]),
            Some("Germany".to_string())
        );
        assert_eq!(first_str(&raw, &["nope", "country"]), Some("DE".to_string()));
    }

    #[test]
    fn test_f64_field() {
        let raw = json!({"n": 37.4, "s": "-122.1", "bad": "abc", "int": 3});
        assert_eq!(f64_field(&raw, "n"), Some(37.4));
        assert_eq!(f64_field(&raw, "s"), Some(-122.1));
        assert_eq!(f64_field(&raw, "bad"), None);
        assert_eq!(f64_field(&raw, "int"), Some(3.0));
    }

    #[test]
    fn test_bool_field_defaults_false() {
        let raw = json!({"proxy": true, "vpn": "yes"});
        assert!(bool_field(&raw, "proxy"));
        assert!(!bool_field(&raw, "vpn"));
        assert!(!bool_field(&raw, "tor"));
    }

    #[test]
    fn test_nested_and_object() {
        let raw = json!({"connection": {"isp": "Google"}, "security": "n/a"});
        assert!(nested(&raw, "connection").is_some());
        assert!(nested(&raw, "security").is_none());
        assert!(object(&raw).is_ok());
        assert!(matches!(
            object(&json!([1, 2])),
            Err(ProviderError::MalformedBody(_))
        ));
    }
}
