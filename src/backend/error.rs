//! Error type shared by both backend handles.

use thiserror::Error;

/// Errors raised by a backend handle.
///
/// Not-found and empty results are not errors; they are returned as
/// [`Lookup::NotFound`](super::Lookup) and
/// [`SchemaSample::Empty`](super::SchemaSample).
#[derive(Debug, Error)]
pub enum BackendError {
    /// Failed to establish the client (bad URI, unreachable host, auth failure).
    #[error("Connection failed to {backend}: {message}")]
    Connection {
        backend: &'static str,
        message: String,
    },

    /// A read operation failed after the client was established.
    #[error("{backend} {operation} failed: {message}")]
    Query {
        backend: &'static str,
        operation: &'static str,
        message: String,
    },

    /// The backend answered with an unexpected HTTP status.
    #[error("{backend} returned {status}: {message}")]
    Upstream {
        backend: &'static str,
        status: u16,
        message: String,
    },

    /// The request could not be translated into a backend call.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl BackendError {
    pub fn connection(backend: &'static str, err: impl std::fmt::Display) -> Self {
        BackendError::Connection {
            backend,
            message: err.to_string(),
        }
    }

    pub fn query(
        backend: &'static str,
        operation: &'static str,
        err: impl std::fmt::Display,
    ) -> Self {
        BackendError::Query {
            backend,
            operation,
            message: err.to_string(),
        }
    }

    /// Get error type string for structured logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            BackendError::Connection { .. } => "connection_error",
            BackendError::Query { .. } => "query_error",
            BackendError::Upstream { .. } => "upstream_error",
            BackendError::InvalidRequest(_) => "invalid_request",
        }
    }
}
