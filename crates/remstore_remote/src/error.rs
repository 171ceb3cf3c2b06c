//! Error taxonomy for the remote entity service.

use thiserror::Error;

/// Result type for remote store operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors surfaced by a remote store client.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The remote record does not exist (HTTP 404). Propagated, not masked.
    #[error("remote record not found: {service}/{remote_id}")]
    NotFound {
        /// The remote collection name.
        service: String,
        /// The remote id that was requested.
        remote_id: String,
    },

    /// Authentication failed (HTTP 401) and the client's single transparent
    /// re-authentication attempt did not recover it.
    #[error("unauthorized: {message}")]
    Unauthorized {
        /// Error detail from the service.
        message: String,
    },

    /// The service rejected the payload shape or field names.
    ///
    /// The structured error body is preserved verbatim so callers can show
    /// field-level errors.
    #[error("remote validation failed: {message}")]
    Validation {
        /// Human-readable summary.
        message: String,
        /// The service's structured error body.
        body: serde_json::Value,
    },

    /// Network or HTTP transport failure.
    #[error("transport error: {message}")]
    Transport {
        /// Error detail.
        message: String,
    },

    /// The response payload could not be interpreted.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl RemoteError {
    /// Creates a not-found error.
    pub fn not_found(service: impl Into<String>, remote_id: impl Into<String>) -> Self {
        Self::NotFound {
            service: service.into(),
            remote_id: remote_id.into(),
        }
    }

    /// Creates an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a validation error carrying the service's error body.
    pub fn validation(message: impl Into<String>, body: serde_json::Value) -> Self {
        Self::Validation {
            message: message.into(),
            body,
        }
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Returns true if this error is a remote 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound { .. })
    }
}
