//! Firestore typed-value JSON encoding
//!
//! The REST API wraps every value in a single-key object naming its type,
//! e.g. `{"stringValue": "x"}` or `{"integerValue": "42"}`.

use crate::error::{BackendError, BackendResult};
use chrono::{DateTime, SecondsFormat, Utc};
use dkh_core::{Fields, Record, Value};
use serde_json::{Map, json};
use tracing::warn;

/// Decode one typed value
pub fn decode_value(raw: &serde_json::Value) -> BackendResult<Value> {
    let object = raw
        .as_object()
        .ok_or_else(|| BackendError::protocol("typed value is not an object"))?;
    let (kind, inner) = object
        .iter()
        .next()
        .ok_or_else(|| BackendError::protocol("typed value is empty"))?;

    let value = match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" => Value::Bool(inner.as_bool().unwrap_or_default()),
        "integerValue" => {
            // Sent as a decimal string, but accept a bare number too.
            let parsed = match inner {
                serde_json::Value::String(s) => s.parse::<i64>().ok(),
                other => other.as_i64(),
            };
            Value::Integer(
                parsed.ok_or_else(|| BackendError::protocol(format!("bad integerValue {inner}")))?,
            )
        }
        "doubleValue" => match inner {
            serde_json::Value::String(s) => Value::Double(parse_special_double(s)?),
            other => Value::Double(other.as_f64().unwrap_or_default()),
        },
        "timestampValue" => {
            let text = inner
                .as_str()
                .ok_or_else(|| BackendError::protocol("timestampValue is not a string"))?;
            let parsed = DateTime::parse_from_rfc3339(text)
                .map_err(|e| BackendError::protocol(format!("bad timestampValue {text}: {e}")))?;
            Value::Timestamp(parsed.with_timezone(&Utc))
        }
        "stringValue" | "bytesValue" | "referenceValue" => {
            Value::String(inner.as_str().unwrap_or_default().to_string())
        }
        "geoPointValue" => {
            let mut fields = Fields::new();
            for key in ["latitude", "longitude"] {
                let coordinate = inner.get(key).and_then(serde_json::Value::as_f64);
                fields.insert(key.to_string(), Value::Double(coordinate.unwrap_or_default()));
            }
            Value::Map(fields)
        }
        "arrayValue" => {
            let values = inner
                .get("values")
                .and_then(serde_json::Value::as_array)
                .map(|values| values.iter().map(decode_value).collect::<BackendResult<Vec<_>>>())
                .transpose()?
                .unwrap_or_default();
            Value::Array(values)
        }
        "mapValue" => Value::Map(decode_fields(inner.get("fields"))?),
        other => {
            // Keep the document readable; show the payload as plain JSON.
            warn!("Unknown Firestore value type {}, decoding as plain JSON", other);
            Value::from(inner.clone())
        }
    };

    Ok(value)
}

fn parse_special_double(text: &str) -> BackendResult<f64> {
    match text {
        "NaN" => Ok(f64::NAN),
        "Infinity" => Ok(f64::INFINITY),
        "-Infinity" => Ok(f64::NEG_INFINITY),
        other => other
            .parse()
            .map_err(|_| BackendError::protocol(format!("bad doubleValue {other}"))),
    }
}

/// Decode a `fields` object; a missing object is an empty document
pub fn decode_fields(raw: Option<&serde_json::Value>) -> BackendResult<Fields> {
    let mut fields = Fields::new();
    if let Some(object) = raw.and_then(serde_json::Value::as_object) {
        for (name, value) in object {
            fields.insert(name.clone(), decode_value(value)?);
        }
    }
    Ok(fields)
}

/// Decode a document resource into a record keyed by the last path segment
pub fn decode_document(raw: &serde_json::Value) -> BackendResult<Record> {
    let name = raw
        .get("name")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| BackendError::protocol("document has no name"))?;
    let id = name
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| BackendError::protocol(format!("bad document name {name}")))?;

    Ok(Record::new(id, decode_fields(raw.get("fields"))?))
}

/// Encode one value in typed form
pub fn encode_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Integer(n) => json!({ "integerValue": n.to_string() }),
        Value::Double(d) if d.is_nan() => json!({ "doubleValue": "NaN" }),
        Value::Double(d) if d.is_infinite() => {
            json!({ "doubleValue": if d.is_sign_positive() { "Infinity" } else { "-Infinity" } })
        }
        Value::Double(d) => json!({ "doubleValue": d }),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Timestamp(ts) => {
            json!({ "timestampValue": ts.to_rfc3339_opts(SecondsFormat::AutoSi, true) })
        }
        Value::Array(values) => {
            json!({ "arrayValue": { "values": values.iter().map(encode_value).collect::<Vec<_>>() } })
        }
        Value::Map(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

/// Encode a field map as a `fields` object
pub fn encode_fields(fields: &Fields) -> serde_json::Value {
    let object: Map<String, serde_json::Value> = fields
        .iter()
        .map(|(name, value)| (name.clone(), encode_value(value)))
        .collect();
    serde_json::Value::Object(object)
}
