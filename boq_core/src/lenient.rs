//! Lenient serde helpers for payloads written by the web front end.
//!
//! Form fields arrive as numbers, numeric strings, empty strings or `null`
//! depending on which wizard step saved them. These helpers read all of them
//! the way the front end reads them back: anything that is not a usable
//! number becomes `0`.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::calculations::wall::WallType;
use crate::units::{Feet, Percent};

fn value_to_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    }
}

/// Number, numeric string or null → f64 (unparseable → 0)
pub fn f64_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_f64(&value))
}

/// Optional percent: missing or null stays `None`, anything else is read leniently
pub fn optional_percent<'de, D>(deserializer: D) -> Result<Option<Percent>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(None),
        other => Ok(Some(Percent(value_to_f64(&other)))),
    }
}

/// Optional length: missing or null stays `None`, anything else is read leniently
pub fn optional_feet<'de, D>(deserializer: D) -> Result<Option<Feet>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(None),
        other => Ok(Some(Feet(value_to_f64(&other)))),
    }
}

/// Percent that defaults to zero when missing or unparseable
pub fn percent_or_zero<'de, D>(deserializer: D) -> Result<Percent, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(Percent(value_to_f64(&value)))
}

/// Wall type where a blank selector or `null` means "not chosen yet".
///
/// Unknown names are still rejected.
pub fn optional_wall_type<'de, D>(deserializer: D) -> Result<Option<WallType>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => WallType::from_str_flexible(&s).map(Some).map_err(D::Error::custom),
        other => Err(D::Error::custom(format!("expected a wall type name, got {}", other))),
    }
}

/// Identifier stored either as a string or a number (front end uses `Date.now()` ids)
pub fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Form {
        #[serde(default, deserialize_with = "f64_or_zero")]
        qty: f64,
        #[serde(default, deserialize_with = "optional_percent")]
        pct: Option<Percent>,
        #[serde(default, deserialize_with = "id_string")]
        id: String,
        #[serde(default, deserialize_with = "optional_feet")]
        length: Option<Feet>,
        #[serde(default, deserialize_with = "optional_wall_type")]
        wall: Option<WallType>,
    }

    fn form(json: &str) -> Form {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_numbers_and_strings() {
        assert_eq!(form(r#"{"qty": 12.5}"#).qty, 12.5);
        assert_eq!(form(r#"{"qty": " 40 "}"#).qty, 40.0);
        assert_eq!(form(r#"{"qty": ""}"#).qty, 0.0);
        assert_eq!(form(r#"{"qty": "abc"}"#).qty, 0.0);
        assert_eq!(form(r#"{"qty": null}"#).qty, 0.0);
        assert_eq!(form(r#"{}"#).qty, 0.0);
    }

    #[test]
    fn test_optional_percent() {
        assert_eq!(form(r#"{}"#).pct, None);
        assert_eq!(form(r#"{"pct": null}"#).pct, None);
        assert_eq!(form(r#"{"pct": "7.5"}"#).pct, Some(Percent(7.5)));
        assert_eq!(form(r#"{"pct": 0}"#).pct, Some(Percent(0.0)));
    }

    #[test]
    fn test_optional_feet() {
        assert_eq!(form(r#"{}"#).length, None);
        assert_eq!(form(r#"{"length": "12"}"#).length, Some(Feet(12.0)));
        assert_eq!(form(r#"{"length": ""}"#).length, Some(Feet(0.0)));
    }

    #[test]
    fn test_ids() {
        assert_eq!(form(r#"{"id": "m-1"}"#).id, "m-1");
        assert_eq!(form(r#"{"id": 1717171717171}"#).id, "1717171717171");
    }

    #[test]
    fn test_optional_wall_type() {
        assert_eq!(form(r#"{}"#).wall, None);
        assert_eq!(form(r#"{"wall": null}"#).wall, None);
        assert_eq!(form(r#"{"wall": ""}"#).wall, None);
        assert_eq!(form(r#"{"wall": "  "}"#).wall, None);
        assert_eq!(form(r#"{"wall": "gypsum-glass"}"#).wall, Some(WallType::GypsumGlass));
        assert!(serde_json::from_str::<Form>(r#"{"wall": "timber"}"#).is_err());
        assert!(serde_json::from_str::<Form>(r#"{"wall": 3}"#).is_err());
    }
}
