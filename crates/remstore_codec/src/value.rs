//! Dynamic attribute value type and wire timestamp conversion.

use crate::error::{CodecError, CodecResult};
use chrono::{DateTime, TimeZone, Utc};

/// A decoded remote document: the key-value payload the remote service
/// returns for a single record.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// A dynamic attribute value.
///
/// This is the local-side representation of every mapped attribute. The
/// scalar set mirrors what the remote service's field grammar can express;
/// anything richer has no mapping and therefore no `Value` variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Null / absent value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer (also carries option-set members).
    Integer(i64),
    /// Text string (UTF-8).
    Text(String),
    /// UTC timestamp.
    Timestamp(DateTime<Utc>),
    /// Reference to another synchronized entity, by remote id.
    Reference(String),
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get this value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as an integer, if it is one.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as a string, if it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as a timestamp, if it is one.
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Get the referenced remote id, if this value is a reference.
    pub fn as_reference(&self) -> Option<&str> {
        match self {
            Value::Reference(id) => Some(id),
            _ => None,
        }
    }

    /// The kind of this value, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Text(_) => "text",
            Value::Timestamp(_) => "timestamp",
            Value::Reference(_) => "reference",
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Timestamp(t)
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Value::Null
    }
}

/// Parses a remote wire timestamp (`/Date(<millis>)/`, always UTC).
pub fn parse_wire_timestamp(raw: &str) -> CodecResult<DateTime<Utc>> {
    let millis = raw
        .strip_prefix("/Date(")
        .and_then(|rest| rest.strip_suffix(")/"))
        .and_then(|inner| inner.parse::<i64>().ok())
        .ok_or_else(|| CodecError::invalid_timestamp(raw))?;

    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| CodecError::invalid_timestamp(raw))
}

/// Formats a timestamp in the remote wire format.
pub fn format_wire_timestamp(value: DateTime<Utc>) -> String {
    format!("/Date({})/", value.timestamp_millis())
}
