//! Dynamically typed document field values

use chrono::{DateTime, TimeZone, Utc};
use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Ordered mapping from field name to value, as stored on a document
pub type Fields = IndexMap<String, Value>;

/// A single field value of a schemaless document
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Explicit null
    Null,
    /// Boolean
    Bool(bool),
    /// 64-bit integer
    Integer(i64),
    /// Double precision float
    Double(f64),
    /// UTF-8 string
    String(String),
    /// Point in time with nanosecond precision
    Timestamp(DateTime<Utc>),
    /// Ordered list of values
    Array(Vec<Value>),
    /// Nested mapping
    Map(Fields),
}

impl Value {
    /// Borrow the string payload, if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret this value as a point in time.
    ///
    /// Native timestamps qualify, and so does a mapping carrying numeric
    /// `seconds` and `nanoseconds` fields, which is how timestamps look once
    /// they have passed through plain JSON.
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            Self::Map(fields) => {
                let seconds = fields.get("seconds")?.as_whole_number()?;
                let nanos = fields.get("nanoseconds")?.as_whole_number()?;
                let nanos = u32::try_from(nanos).ok()?;
                Utc.timestamp_opt(seconds, nanos).single()
            }
            _ => None,
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
    fn as_whole_number(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Double(d) if d.is_finite() && d.trunc() == *d => Some(*d as i64),
            _ => None,
        }
    }

    /// Whether this value is `Null`
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Build a timestamp value from seconds and nanoseconds since the epoch
    pub fn timestamp(seconds: i64, nanos: u32) -> Option<Self> {
        Utc.timestamp_opt(seconds, nanos).single().map(Self::Timestamp)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Integer(n) => serializer.serialize_i64(*n),
            Self::Double(d) => serializer.serialize_f64(*d),
            Self::String(s) => serializer.serialize_str(s),
            // Same shape the store's client SDKs produce when a timestamp is
            // stringified.
            Self::Timestamp(ts) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("seconds", &ts.timestamp())?;
                map.serialize_entry("nanoseconds", &ts.timestamp_subsec_nanos())?;
                map.end()
            }
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (key, value) in fields {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Double(n.as_f64().unwrap_or(f64::NAN)), Self::Integer),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Timestamp(ts)
    }
}
