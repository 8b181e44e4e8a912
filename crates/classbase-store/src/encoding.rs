//! Firestore v1 REST `Value` encoding.
//!
//! Each value is an object with exactly one kind key, e.g.
//! `{"stringValue": "x"}` or `{"integerValue": "42"}`. Integers travel as
//! decimal strings. References carry the full resource name
//! `projects/<p>/databases/<d>/documents/<collection>/<id>`, so encoding
//! needs the database root.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value, json};

use crate::{DocumentPath, FieldValue, Fields, StoreError};

pub fn encode_value(value: &FieldValue, root: &str) -> Value {
    match value {
        FieldValue::Null => json!({ "nullValue": null }),
        FieldValue::Boolean(b) => json!({ "booleanValue": b }),
        FieldValue::Integer(i) => json!({ "integerValue": i.to_string() }),
        FieldValue::Double(d) => json!({ "doubleValue": d }),
        FieldValue::String(s) => json!({ "stringValue": s }),
        FieldValue::Timestamp(t) => {
            json!({ "timestampValue": t.to_rfc3339_opts(SecondsFormat::Micros, true) })
        }
        FieldValue::Reference(path) => json!({ "referenceValue": format!("{root}/{path}") }),
        FieldValue::Array(items) if items.is_empty() => json!({ "arrayValue": {} }),
        FieldValue::Array(items) => {
            let values: Vec<Value> = items.iter().map(|v| encode_value(v, root)).collect();
            json!({ "arrayValue": { "values": values } })
        }
        FieldValue::Map(fields) => json!({ "mapValue": { "fields": encode_fields(fields, root) } }),
    }
}

pub fn encode_fields(fields: &Fields, root: &str) -> Map<String, Value> {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), encode_value(value, root)))
        .collect()
}

pub fn decode_value(value: &Value, root: &str) -> Result<FieldValue, StoreError> {
    let object = value
        .as_object()
        .ok_or_else(|| StoreError::Decode(format!("expected a value object, got {value}")))?;
    let (kind, inner) = object
        .iter()
        .next()
        .ok_or_else(|| StoreError::Decode("empty value object".to_string()))?;

    let decoded = match kind.as_str() {
        "nullValue" => FieldValue::Null,
        "booleanValue" => FieldValue::Boolean(inner.as_bool().ok_or_else(|| mismatch(kind, inner))?),
        "integerValue" => FieldValue::Integer(decode_integer(inner).ok_or_else(|| mismatch(kind, inner))?),
        "doubleValue" => FieldValue::Double(inner.as_f64().ok_or_else(|| mismatch(kind, inner))?),
        "stringValue" => FieldValue::String(string_of(kind, inner)?.to_string()),
        // Bytes are surfaced as their base64 text.
        "bytesValue" => FieldValue::String(string_of(kind, inner)?.to_string()),
        "timestampValue" => {
            let raw = string_of(kind, inner)?;
            let parsed = DateTime::parse_from_rfc3339(raw).map_err(|_| mismatch(kind, inner))?;
            FieldValue::Timestamp(parsed.with_timezone(&Utc))
        }
        "referenceValue" => FieldValue::Reference(decode_reference(string_of(kind, inner)?, root)?),
        "geoPointValue" => FieldValue::Map(
            inner
                .as_object()
                .map(|point| {
                    point
                        .iter()
                        .map(|(k, v)| (k.clone(), FieldValue::Double(v.as_f64().unwrap_or_default())))
                        .collect()
                })
                .unwrap_or_default(),
        ),
        "arrayValue" => {
            let items = match inner.get("values") {
                Some(Value::Array(values)) => values
                    .iter()
                    .map(|v| decode_value(v, root))
                    .collect::<Result<Vec<_>, _>>()?,
                _ => Vec::new(),
            };
            FieldValue::Array(items)
        }
        "mapValue" => FieldValue::Map(match inner.get("fields") {
            Some(fields) => decode_fields(fields, root)?,
            None => Fields::new(),
        }),
        other => return Err(StoreError::Decode(format!("unsupported value kind {other}"))),
    };
    Ok(decoded)
}

pub fn decode_fields(fields: &Value, root: &str) -> Result<Fields, StoreError> {
    let object = fields
        .as_object()
        .ok_or_else(|| StoreError::Decode("document fields must be an object".to_string()))?;
    object
        .iter()
        .map(|(name, value)| Ok((name.clone(), decode_value(value, root)?)))
        .collect()
}

/// Turns a full resource name back into `collection/id`.
pub fn decode_reference(name: &str, root: &str) -> Result<DocumentPath, StoreError> {
    let relative = name
        .strip_prefix(root)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(name);
    DocumentPath::parse(relative)
        .ok_or_else(|| StoreError::Decode(format!("not a document name: {name}")))
}

fn decode_integer(value: &Value) -> Option<i64> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

fn string_of<'a>(kind: &str, value: &'a Value) -> Result<&'a str, StoreError> {
    value.as_str().ok_or_else(|| mismatch(kind, value))
}

fn mismatch(kind: &str, value: &Value) -> StoreError {
    StoreError::Decode(format!("{kind} holds unexpected {value}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ROOT: &str = "projects/demo/databases/(default)/documents";

    #[test]
    fn test_encode_scalars() {
        assert_eq!(
            encode_value(&FieldValue::Integer(42), ROOT),
            json!({ "integerValue": "42" })
        );
        assert_eq!(
            encode_value(&FieldValue::from("admin"), ROOT),
            json!({ "stringValue": "admin" })
        );
        assert_eq!(
            encode_value(&FieldValue::Null, ROOT),
            json!({ "nullValue": null })
        );
    }

    #[test]
    fn test_encode_reference_uses_resource_name() {
        let value = FieldValue::Reference(DocumentPath::new("classes", "c1"));
        assert_eq!(
            encode_value(&value, ROOT),
            json!({ "referenceValue": "projects/demo/databases/(default)/documents/classes/c1" })
        );
    }

    #[test]
    fn test_decode_document_fields() {
        let wire = json!({
            "email": { "stringValue": "a@example.com" },
            "class": { "referenceValue": "projects/demo/databases/(default)/documents/classes/c1" },
            "grade": { "integerValue": "7" },
            "average": { "doubleValue": 3.5 },
            "active": { "booleanValue": true },
            "tags": { "arrayValue": { "values": [{ "stringValue": "a" }] } },
            "empty": { "arrayValue": {} },
            "meta": { "mapValue": { "fields": { "n": { "nullValue": null } } } },
            "seen": { "timestampValue": "2024-09-01T08:00:00.123456Z" }
        });

        let fields = decode_fields(&wire, ROOT).unwrap();
        assert_eq!(fields["email"], FieldValue::from("a@example.com"));
        assert_eq!(
            fields["class"],
            FieldValue::Reference(DocumentPath::new("classes", "c1"))
        );
        assert_eq!(fields["grade"], FieldValue::Integer(7));
        assert_eq!(fields["average"], FieldValue::Double(3.5));
        assert_eq!(fields["active"], FieldValue::Boolean(true));
        assert_eq!(fields["tags"], FieldValue::Array(vec!["a".into()]));
        assert_eq!(fields["empty"], FieldValue::Array(vec![]));
        assert!(matches!(&fields["meta"], FieldValue::Map(m) if m["n"] == FieldValue::Null));
        assert_eq!(
            fields["seen"],
            FieldValue::Timestamp(
                Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap()
                    + chrono::Duration::microseconds(123_456)
            )
        );
    }

    #[test]
    fn test_nested_values_survive_encoding() {
        let mut inner = Fields::new();
        inner.insert("room".into(), FieldValue::Integer(12));
        inner.insert("class".into(), DocumentPath::new("classes", "c9").into());
        let value = FieldValue::Array(vec![FieldValue::Map(inner), FieldValue::Boolean(false)]);

        let wire = encode_value(&value, ROOT);
        assert_eq!(decode_value(&wire, ROOT).unwrap(), value);
    }

    #[test]
    fn test_decode_rejects_unknown_kind() {
        assert!(matches!(
            decode_value(&json!({ "vectorValue": {} }), ROOT),
            Err(StoreError::Decode(_))
        ));
        assert!(decode_value(&json!({ "integerValue": "seven" }), ROOT).is_err());
    }
}
