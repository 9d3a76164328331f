//! Typed rendering of arbitrary document fields.
//!
//! Every JSON value maps to exactly one [`FieldKind`]; each kind has a
//! formatter ([`FieldValue::display`]) and a parser ([`FieldKind::parse`]).

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{json, Map, Number, Value};

use crate::error::{FactdeskError, Result};
use crate::models::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Boolean,
    Number,
    Timestamp,
    GeoPoint,
    Array,
    Object,
    String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Boolean(bool),
    Number(Number),
    Timestamp(DateTime<Utc>),
    GeoPoint { latitude: f64, longitude: f64 },
    Array(Vec<FieldValue>),
    Object(Map<String, Value>),
    String(String),
}

fn is_exact_pair(map: &Map<String, Value>, a: &str, b: &str) -> bool {
    map.len() == 2
        && map.get(a).is_some_and(Value::is_number)
        && map.get(b).is_some_and(Value::is_number)
}

impl FieldValue {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::String(String::new()),
            Value::Bool(b) => Self::Boolean(*b),
            Value::Number(n) => Self::Number(n.clone()),
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => Self::Array(items.iter().map(Self::from_json).collect()),
            Value::Object(map) if is_exact_pair(map, "seconds", "nanoseconds") => {
                let ts = Timestamp {
                    seconds: map["seconds"].as_i64().unwrap_or(0),
                    nanoseconds: map["nanoseconds"].as_u64().unwrap_or(0) as u32,
                };
                Self::Timestamp(ts.to_datetime())
            }
            Value::Object(map) if is_exact_pair(map, "latitude", "longitude") => Self::GeoPoint {
                latitude: map["latitude"].as_f64().unwrap_or(0.0),
                longitude: map["longitude"].as_f64().unwrap_or(0.0),
            },
            Value::Object(map) => Self::Object(map.clone()),
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Boolean(_) => FieldKind::Boolean,
            Self::Number(_) => FieldKind::Number,
            Self::Timestamp(_) => FieldKind::Timestamp,
            Self::GeoPoint { .. } => FieldKind::GeoPoint,
            Self::Array(_) => FieldKind::Array,
            Self::Object(_) => FieldKind::Object,
            Self::String(_) => FieldKind::String,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Self::Boolean(b) => b.to_string(),
            Self::Number(n) => n.to_string(),
            Self::Timestamp(dt) => dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            Self::GeoPoint {
                latitude,
                longitude,
            } => format!("{latitude},{longitude}"),
            Self::Array(items) => items
                .iter()
                .map(FieldValue::display)
                .collect::<Vec<_>>()
                .join(","),
            Self::Object(map) => Value::Object(map.clone()).to_string(),
            Self::String(s) => s.clone(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Boolean(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::Timestamp(dt) => serde_json::to_value(Timestamp::from_datetime(*dt))
                .unwrap_or(Value::Null),
            Self::GeoPoint {
                latitude,
                longitude,
            } => json!({"latitude": latitude, "longitude": longitude}),
            Self::Array(items) => Value::Array(items.iter().map(FieldValue::to_json).collect()),
            Self::Object(map) => Value::Object(map.clone()),
            Self::String(s) => Value::String(s.clone()),
        }
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> FactdeskError {
    FactdeskError::InvalidField {
        field: field.to_string(),
        reason: reason.into(),
    }
}

/// Parse a date from RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC) or `YYYY-MM-DD`.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

impl FieldKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Timestamp => "timestamp",
            Self::GeoPoint => "geopoint",
            Self::Array => "array",
            Self::Object => "object",
            Self::String => "string",
        }
    }

    /// Parse user-entered text as this kind. `field` only labels errors.
    pub fn parse(self, field: &str, text: &str) -> Result<FieldValue> {
        let trimmed = text.trim();
        match self {
            Self::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "true" => Ok(FieldValue::Boolean(true)),
                "false" => Ok(FieldValue::Boolean(false)),
                _ => Err(invalid(field, format!("expected true or false, got {trimmed:?}"))),
            },
            Self::Number => {
                let number = if let Ok(i) = trimmed.parse::<i64>() {
                    Number::from(i)
                } else {
                    trimmed
                        .parse::<f64>()
                        .ok()
                        .and_then(Number::from_f64)
                        .ok_or_else(|| invalid(field, format!("{trimmed:?} is not a number")))?
                };
                Ok(FieldValue::Number(number))
            }
            Self::Timestamp => parse_datetime(trimmed)
                .map(FieldValue::Timestamp)
                .ok_or_else(|| invalid(field, format!("{trimmed:?} is not a date"))),
            Self::GeoPoint => {
                let (lat, lng) = trimmed
                    .split_once(',')
                    .ok_or_else(|| invalid(field, "expected latitude,longitude"))?;
                let latitude: f64 = lat.trim().parse().map_err(|_| invalid(field, "bad latitude"))?;
                let longitude: f64 = lng.trim().parse().map_err(|_| invalid(field, "bad longitude"))?;
                if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
                    return Err(invalid(field, "coordinates out of range"));
                }
                Ok(FieldValue::GeoPoint {
                    latitude,
                    longitude,
                })
            }
            Self::Array => Ok(FieldValue::Array(
                trimmed
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| FieldValue::String(s.to_string()))
                    .collect(),
            )),
            Self::Object => match serde_json::from_str::<Value>(trimmed) {
                Ok(Value::Object(map)) => Ok(FieldValue::Object(map)),
                _ => Err(invalid(field, "expected a JSON object")),
            },
            Self::String => Ok(FieldValue::String(text.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_classifies_every_kind() {
        let cases = [
            (json!(true), FieldKind::Boolean),
            (json!(3), FieldKind::Number),
            (json!({"seconds": 1, "nanoseconds": 0}), FieldKind::Timestamp),
            (json!({"latitude": 1.5, "longitude": 2.5}), FieldKind::GeoPoint),
            (json!(["a"]), FieldKind::Array),
            (json!({"seconds": 1}), FieldKind::Object),
            (json!("x"), FieldKind::String),
            (Value::Null, FieldKind::String),
        ];
        for (value, kind) in cases {
            assert_eq!(FieldValue::from_json(&value).kind(), kind, "{value}");
        }
    }

    #[test]
    fn test_display_formats() {
        let ts = json!({"seconds": 1704067200, "nanoseconds": 0});
        assert_eq!(FieldValue::from_json(&ts).display(), "2024-01-01T00:00:00.000Z");
        assert_eq!(FieldValue::from_json(&json!(["a", "b"])).display(), "a,b");
        assert_eq!(FieldValue::from_json(&json!(2.5)).display(), "2.5");
        assert_eq!(FieldValue::from_json(&json!({"k": 1})).display(), "{\"k\":1}");
    }

    #[test]
    fn test_parse_boolean() {
        assert_eq!(FieldKind::Boolean.parse("read", " TRUE ").unwrap(), FieldValue::Boolean(true));
        assert!(FieldKind::Boolean.parse("read", "yes").is_err());
    }

    #[test]
    fn test_parse_number_keeps_integers() {
        let v = FieldKind::Number.parse("n", "42").unwrap();
        assert_eq!(v.to_json(), json!(42));
        let v = FieldKind::Number.parse("n", "4.5").unwrap();
        assert_eq!(v.to_json(), json!(4.5));
        assert!(FieldKind::Number.parse("n", "four").is_err());
    }

    #[test]
    fn test_parse_timestamp_variants() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        for raw in ["2024-03-05", "2024-03-05T00:00:00Z", "2024-03-05 00:00:00"] {
            assert_eq!(
                FieldKind::Timestamp.parse("createdDate", raw).unwrap(),
                FieldValue::Timestamp(expected),
                "{raw}"
            );
        }
        let json = FieldValue::Timestamp(expected).to_json();
        assert_eq!(json, json!({"seconds": expected.timestamp(), "nanoseconds": 0}));
    }

    #[test]
    fn test_parse_geopoint() {
        let v = FieldKind::GeoPoint.parse("loc", "40.1, -82.9").unwrap();
        assert_eq!(v.to_json(), json!({"latitude": 40.1, "longitude": -82.9}));
        assert!(FieldKind::GeoPoint.parse("loc", "91,0").is_err());
    }

    #[test]
    fn test_parse_array_splits_and_trims() {
        let v = FieldKind::Array.parse("images", "a.png, b.png,,").unwrap();
        assert_eq!(v.to_json(), json!(["a.png", "b.png"]));
    }

    #[test]
    fn test_parse_object_requires_object() {
        assert!(FieldKind::Object.parse("meta", "{\"a\":1}").is_ok());
        assert!(FieldKind::Object.parse("meta", "[1]").is_err());
    }
}
