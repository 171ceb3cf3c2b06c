//! Error types for the codec and mapping layer.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while mapping values between the two stores.
#[derive(Debug, Error)]
pub enum CodecError {
    /// No field mapping exists for a local attribute.
    ///
    /// This is an expected internal signal: the query translator probes
    /// mappings with it to detect unsupported filter and ordering
    /// attributes, and `to_remote`/`from_remote` skip unmapped attributes.
    #[error("no mapping for field {field}")]
    NotMapped {
        /// The local attribute name that has no mapping.
        field: String,
    },

    /// No entity mapping is registered under the given name.
    #[error("no entity mapping registered for {entity}")]
    UnknownEntity {
        /// The entity type name.
        entity: String,
    },

    /// The local record is ahead of the remote one.
    ///
    /// A prior write was not propagated to the remote store. This is a hard
    /// consistency fault: it is never retried or silently resolved.
    #[error("local record is {} ms ahead of the remote record", -delta_ms)]
    OutOfSync {
        /// Remote modification time minus local modification time, in
        /// milliseconds. Always negative for this error.
        delta_ms: i64,
    },

    /// A wire timestamp string could not be parsed.
    #[error("invalid wire timestamp: {raw}")]
    InvalidTimestamp {
        /// The offending raw string.
        raw: String,
    },

    /// A remote document field had an unexpected JSON shape.
    #[error("cannot decode remote field {field}: {message}")]
    Decode {
        /// The remote field name.
        field: String,
        /// Description of the shape mismatch.
        message: String,
    },

    /// A local value cannot be encoded by the field's codec.
    #[error("cannot encode {found} value with a {expected} codec")]
    TypeMismatch {
        /// The codec's expected value kind.
        expected: &'static str,
        /// The kind of value that was supplied.
        found: &'static str,
    },

    /// A remote document is missing a field the mapping requires.
    #[error("remote document is missing field {field}")]
    MissingField {
        /// The remote field name.
        field: String,
    },
}

impl CodecError {
    /// Creates a not-mapped error for a local attribute.
    pub fn not_mapped(field: impl Into<String>) -> Self {
        Self::NotMapped {
            field: field.into(),
        }
    }

    /// Creates an unknown-entity error.
    pub fn unknown_entity(entity: impl Into<String>) -> Self {
        Self::UnknownEntity {
            entity: entity.into(),
        }
    }

    /// Creates an invalid-timestamp error.
    pub fn invalid_timestamp(raw: impl Into<String>) -> Self {
        Self::InvalidTimestamp { raw: raw.into() }
    }

    /// Creates a decode error for a remote field.
    pub fn decode(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a missing-field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Returns true if this is the internal not-mapped signal.
    pub fn is_not_mapped(&self) -> bool {
        matches!(self, CodecError::NotMapped { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_mapped_signal() {
        let err = CodecError::not_mapped("nickname");
        assert!(err.is_not_mapped());
        assert_eq!(err.to_string(), "no mapping for field nickname");
    }

    #[test]
    fn out_of_sync_display_reports_lead() {
        let err = CodecError::OutOfSync { delta_ms: -42_500 };
        assert!(!err.is_not_mapped());
        assert!(err.to_string().contains("42500 ms ahead"));
    }
}
