//! Error types for query translation.

use remstore_codec::CodecError;
use thiserror::Error;

/// Result type for query translation.
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors that can occur while translating a predicate or ordering.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The query shape cannot be expressed in the remote filter grammar.
    ///
    /// Raised for unmapped attributes, null comparison values, non-equality
    /// comparisons on references and similar deliberately unsupported
    /// shapes. Correctness over completeness: nothing degrades silently.
    #[error("unsupported query shape: {0}")]
    Unsupported(String),

    /// Codec or mapping failure while encoding a comparison value.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

impl QueryError {
    /// Creates an unsupported-shape error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }
}
