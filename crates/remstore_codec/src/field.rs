//! Per-field bidirectional codecs and the field mapping record.

use crate::error::{CodecError, CodecResult};
use crate::value::{format_wire_timestamp, parse_wire_timestamp, Value};
use serde_json::json;

/// Bidirectional codec between a local [`Value`] and the remote JSON shape
/// of one field.
///
/// Non-nullable text and boolean fields normalize remote nulls to `""` and
/// `false` on decode, because the remote service omits blank values while
/// the local store expects a concrete value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldCodec {
    /// Text string.
    Text {
        /// Whether remote nulls decode to `Null` rather than `""`.
        nullable: bool,
    },
    /// Signed integer.
    Integer,
    /// Boolean.
    Boolean {
        /// Whether remote nulls decode to `Null` rather than `false`.
        nullable: bool,
    },
    /// UTC timestamp, carried as `/Date(<millis>)/` on the wire.
    Timestamp,
    /// Reference to another synchronized entity, carried as `{"Id": ...}`.
    Reference {
        /// The referenced entity type name.
        entity: String,
    },
    /// Option-set member, carried as `{"Value": <int>}`.
    OptionSet,
}

impl FieldCodec {
    /// Text codec that decodes remote nulls to the empty string.
    pub fn text() -> Self {
        FieldCodec::Text { nullable: false }
    }

    /// Text codec that preserves remote nulls.
    pub fn nullable_text() -> Self {
        FieldCodec::Text { nullable: true }
    }

    /// Boolean codec that decodes remote nulls to `false`.
    pub fn boolean() -> Self {
        FieldCodec::Boolean { nullable: false }
    }

    /// Boolean codec that preserves remote nulls.
    pub fn nullable_boolean() -> Self {
        FieldCodec::Boolean { nullable: true }
    }

    /// Reference codec targeting the given entity type.
    pub fn reference(entity: impl Into<String>) -> Self {
        FieldCodec::Reference {
            entity: entity.into(),
        }
    }

    /// Returns the referenced entity type, if this is a reference codec.
    pub fn reference_entity(&self) -> Option<&str> {
        match self {
            FieldCodec::Reference { entity } => Some(entity),
            _ => None,
        }
    }

    /// Encodes a local value into the remote JSON shape for this field.
    ///
    /// `Null` always encodes to JSON null; the remote service treats that
    /// as clearing the field.
    pub fn encode(&self, value: &Value) -> CodecResult<serde_json::Value> {
        if value.is_null() {
            return Ok(serde_json::Value::Null);
        }

        match (self, value) {
            (FieldCodec::Text { .. }, Value::Text(s)) => Ok(json!(s)),
            (FieldCodec::Integer, Value::Integer(n)) => Ok(json!(n)),
            (FieldCodec::Boolean { .. }, Value::Bool(b)) => Ok(json!(b)),
            (FieldCodec::Timestamp, Value::Timestamp(t)) => {
                Ok(json!(format_wire_timestamp(*t)))
            }
            (FieldCodec::Reference { .. }, Value::Reference(id)) => {
                Ok(json!({ "Id": id }))
            }
            (FieldCodec::OptionSet, Value::Integer(n)) => Ok(json!({ "Value": n })),
            _ => Err(CodecError::TypeMismatch {
                expected: self.expected_kind(),
                found: value.kind(),
            }),
        }
    }

    /// Decodes a remote JSON value into a local value.
    pub fn decode(&self, raw: &serde_json::Value) -> CodecResult<Value> {
        match self {
            FieldCodec::Text { nullable } => match raw {
                serde_json::Value::Null => Ok(if *nullable {
                    Value::Null
                } else {
                    Value::Text(String::new())
                }),
                serde_json::Value::String(s) => Ok(Value::Text(s.clone())),
                other => Err(self.shape_error(other)),
            },
            FieldCodec::Integer => match raw {
                serde_json::Value::Null => Ok(Value::Null),
                serde_json::Value::Number(n) => n
                    .as_i64()
                    .map(Value::Integer)
                    .ok_or_else(|| self.shape_error(raw)),
                other => Err(self.shape_error(other)),
            },
            FieldCodec::Boolean { nullable } => match raw {
                serde_json::Value::Null => Ok(if *nullable {
                    Value::Null
                } else {
                    Value::Bool(false)
                }),
                serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
                other => Err(self.shape_error(other)),
            },
            FieldCodec::Timestamp => match raw {
                serde_json::Value::Null => Ok(Value::Null),
                serde_json::Value::String(s) => {
                    parse_wire_timestamp(s).map(Value::Timestamp)
                }
                other => Err(self.shape_error(other)),
            },
            FieldCodec::Reference { .. } => match raw {
                serde_json::Value::Null => Ok(Value::Null),
                serde_json::Value::Object(obj) => match obj.get("Id") {
                    Some(serde_json::Value::String(id)) => {
                        Ok(Value::Reference(id.clone()))
                    }
                    // A reference wrapper with a null id means "no target"
                    Some(serde_json::Value::Null) | None => Ok(Value::Null),
                    Some(other) => Err(self.shape_error(other)),
                },
                other => Err(self.shape_error(other)),
            },
            FieldCodec::OptionSet => match raw {
                serde_json::Value::Null => Ok(Value::Null),
                serde_json::Value::Object(obj) => match obj.get("Value") {
                    Some(serde_json::Value::Number(n)) => n
                        .as_i64()
                        .map(Value::Integer)
                        .ok_or_else(|| self.shape_error(raw)),
                    Some(serde_json::Value::Null) | None => Ok(Value::Null),
                    Some(other) => Err(self.shape_error(other)),
                },
                other => Err(self.shape_error(other)),
            },
        }
    }

    fn expected_kind(&self) -> &'static str {
        match self {
            FieldCodec::Text { .. } => "text",
            FieldCodec::Integer => "integer",
            FieldCodec::Boolean { .. } => "boolean",
            FieldCodec::Timestamp => "timestamp",
            FieldCodec::Reference { .. } => "reference",
            FieldCodec::OptionSet => "integer",
        }
    }

    fn shape_error(&self, raw: &serde_json::Value) -> CodecError {
        CodecError::decode(
            self.expected_kind(),
            format!("unexpected JSON shape: {raw}"),
        )
    }
}

/// The declarative correspondence between one local attribute and one remote
/// field.
#[derive(Debug, Clone)]
pub struct FieldMapping {
    /// Local attribute name.
    pub local_name: String,
    /// Remote field name.
    pub remote_name: String,
    /// Value codec for this field.
    pub codec: FieldCodec,
}

impl FieldMapping {
    /// Creates a new field mapping.
    pub fn new(
        local_name: impl Into<String>,
        remote_name: impl Into<String>,
        codec: FieldCodec,
    ) -> Self {
        Self {
            local_name: local_name.into(),
            remote_name: remote_name.into(),
            codec,
        }
    }

    /// Returns true if this field references another synchronized entity.
    pub fn is_reference(&self) -> bool {
        matches!(self.codec, FieldCodec::Reference { .. })
    }
}
