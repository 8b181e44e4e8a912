//! Typed document field values.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};

use crate::DocumentPath;

pub type Fields = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    Reference(DocumentPath),
    Array(Vec<FieldValue>),
    Map(Fields),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&DocumentPath> {
        match self {
            Self::Reference(path) => Some(path),
            _ => None,
        }
    }

    /// Plain JSON rendering for API responses. References render as
    /// `collection/id`, timestamps as RFC 3339.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Boolean(b) => Value::Bool(*b),
            Self::Integer(i) => Value::from(*i),
            Self::Double(d) => Number::from_f64(*d).map_or(Value::Null, Value::Number),
            Self::String(s) => Value::String(s.clone()),
            Self::Timestamp(t) => Value::String(t.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Self::Reference(path) => Value::String(path.to_string()),
            Self::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(fields) => Value::Object(fields_to_json(fields)),
        }
    }

    /// Inverse of [`FieldValue::to_json`] for data arriving as plain JSON.
    /// Strings stay strings: references and timestamps are never inferred.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Boolean(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Double(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from_json).collect()),
            Value::Object(map) => Self::Map(fields_from_json(map)),
        }
    }
}

pub fn fields_to_json(fields: &Fields) -> Map<String, Value> {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), value.to_json()))
        .collect()
}

pub fn fields_from_json(map: Map<String, Value>) -> Fields {
    map.into_iter()
        .map(|(name, value)| (name, FieldValue::from_json(value)))
        .collect()
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<DocumentPath> for FieldValue {
    fn from(value: DocumentPath) -> Self {
        Self::Reference(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}
