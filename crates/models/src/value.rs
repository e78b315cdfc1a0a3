//! Constrained values for free-form document fields.
//!
//! Holiday attributes and task `params` are maps of scalar values. Nested
//! objects, arrays and `null` are rejected so merges stay key-by-key.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::ModelError;

/// A single scalar field value.
///
/// Variant order matters for deserialization: an RFC 3339 string becomes a
/// `Timestamp`, any other string stays `Text`. Both encode back to the exact
/// text they were read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Integer(i64),
    Number(f64),
    Timestamp(Timestamp),
    Text(String),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// An RFC 3339 instant that keeps the caller's spelling (offset, precision).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp {
    raw: String,
    at: DateTime<FixedOffset>,
}

impl Timestamp {
    pub fn parse(raw: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(raw).ok().map(|at| Self { raw: raw.to_string(), at })
    }

    pub fn instant(&self) -> DateTime<FixedOffset> { self.at }

    pub fn as_str(&self) -> &str { &self.raw }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> { s.serialize_str(&self.raw) }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        Timestamp::parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("not an RFC 3339 timestamp: {raw}")))
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self { FieldValue::Text(s.to_string()) }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self { FieldValue::Text(s) }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self { FieldValue::Bool(b) }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self { FieldValue::Integer(n) }
}

/// Document body keyed by field name.
pub type Fields = BTreeMap<String, FieldValue>;

/// Encode fields for a JSONB column.
pub fn fields_to_json(fields: &Fields) -> serde_json::Value {
    serde_json::Value::Object(
        fields
            .iter()
            .map(|(k, v)| (k.clone(), field_to_json(v)))
            .collect(),
    )
}

fn field_to_json(v: &FieldValue) -> serde_json::Value {
    match v {
        FieldValue::Bool(b) => serde_json::Value::Bool(*b),
        FieldValue::Integer(n) => serde_json::Value::from(*n),
        FieldValue::Number(n) => serde_json::Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        FieldValue::Timestamp(t) => serde_json::Value::String(t.as_str().to_string()),
        FieldValue::Text(s) => serde_json::Value::String(s.clone()),
    }
}

/// Decode a JSON object into fields, rejecting non-scalar values.
pub fn fields_from_json(value: serde_json::Value) -> Result<Fields, ModelError> {
    match value {
        serde_json::Value::Object(_) => serde_json::from_value(value)
            .map_err(|e| ModelError::Validation(format!("unsupported field value: {e}"))),
        other => Err(ModelError::Validation(format!("expected a JSON object, got {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_pick_the_narrowest_variant() {
        let fields = fields_from_json(json!({
            "name": "New Year",
            "off": true,
            "days": 2,
            "factor": 1.5,
            "observed_at": "2025-01-01T00:00:00Z",
            "date_only": "2025-01-01"
        }))
        .unwrap();
        assert_eq!(fields["name"], FieldValue::Text("New Year".into()));
        assert_eq!(fields["off"], FieldValue::Bool(true));
        assert_eq!(fields["days"], FieldValue::Integer(2));
        assert_eq!(fields["factor"], FieldValue::Number(1.5));
        assert!(matches!(fields["observed_at"], FieldValue::Timestamp(_)));
        assert_eq!(fields["date_only"], FieldValue::Text("2025-01-01".into()));
    }

    #[test]
    fn nested_and_null_values_are_rejected() {
        assert!(fields_from_json(json!({"a": {"b": 1}})).is_err());
        assert!(fields_from_json(json!({"a": [1, 2]})).is_err());
        assert!(fields_from_json(json!({"a": null})).is_err());
        assert!(fields_from_json(json!([1])).is_err());
    }

    #[test]
    fn timestamps_keep_their_offset_and_spelling() {
        for raw in ["2025-01-01T08:00:00+08:00", "2024-05-01T08:30:00Z", "2024-05-01T08:30:00.5-03:30"] {
            let fields = fields_from_json(json!({ "at": raw })).unwrap();
            let FieldValue::Timestamp(t) = &fields["at"] else { panic!("expected timestamp for {raw}") };
            assert_eq!(t.as_str(), raw);
            assert_eq!(fields_to_json(&fields), json!({ "at": raw }));
            assert_eq!(serde_json::to_value(&fields).unwrap(), json!({ "at": raw }));
        }
    }

    #[test]
    fn equal_instants_with_different_offsets_stay_distinct() {
        let a = Timestamp::parse("2025-01-01T08:00:00+08:00").unwrap();
        let b = Timestamp::parse("2025-01-01T00:00:00Z").unwrap();
        assert_eq!(a.instant(), b.instant());
        assert_ne!(a, b);
    }
}
