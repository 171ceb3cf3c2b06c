//! Error type for the synchronization engine.

use remstore_codec::CodecError;
use remstore_query::QueryError;
use remstore_remote::RemoteError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by the synchronization engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Field mapping or value codec failure, including the fatal
    /// out-of-sync fault.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Predicate or ordering translation failure.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Remote entity service failure.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// No local row with this id.
    #[error("no {entity} record with local id {local_id}")]
    RecordNotFound {
        /// Entity type name.
        entity: String,
        /// The local id that was requested.
        local_id: u64,
    },

    /// An exactly-one lookup matched nothing.
    #[error("no {entity} record matches")]
    NoMatch {
        /// Entity type name.
        entity: String,
    },

    /// An exactly-one lookup matched more than one record.
    #[error("{count} {entity} records match, expected exactly one")]
    MultipleMatches {
        /// Entity type name.
        entity: String,
        /// How many records matched.
        count: usize,
    },

    /// The operation needs a remote id but the record was never written
    /// through to the remote store.
    #[error("{entity} record {local_id} has no remote id")]
    MissingRemoteId {
        /// Entity type name.
        entity: String,
        /// The local id of the record.
        local_id: u64,
    },

    /// No record with this remote id exists in either store.
    #[error("no {entity} record with remote id {remote_id}")]
    UnknownRemoteId {
        /// Entity type name.
        entity: String,
        /// The remote id that was requested.
        remote_id: String,
    },

    /// The operation has no sound synchronized semantics and is refused
    /// outright.
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

impl EngineError {
    /// Creates a record-not-found error.
    pub fn record_not_found(entity: impl Into<String>, local_id: u64) -> Self {
        Self::RecordNotFound {
            entity: entity.into(),
            local_id,
        }
    }

    /// Creates a missing-remote-id error.
    pub fn missing_remote_id(entity: impl Into<String>, local_id: u64) -> Self {
        Self::MissingRemoteId {
            entity: entity.into(),
            local_id,
        }
    }

    /// Creates an unknown-remote-id error.
    pub fn unknown_remote_id(
        entity: impl Into<String>,
        remote_id: impl Into<String>,
    ) -> Self {
        Self::UnknownRemoteId {
            entity: entity.into(),
            remote_id: remote_id.into(),
        }
    }

    /// Creates an unsupported-operation error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    /// Returns true if this error is the fatal out-of-sync fault.
    pub fn is_out_of_sync(&self) -> bool {
        matches!(self, EngineError::Codec(CodecError::OutOfSync { .. }))
    }
}
