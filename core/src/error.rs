//! Error types for the QuickBooks entity client.
//!
//! # Design
//! Configuration problems are caught before any request leaves the process.
//! Every non-2xx response lands in `RemoteRequest` with the raw status code
//! and body; transport failures keep their original error as the source.

use thiserror::Error;

/// A specialized `Result` type for client operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Boxed error produced by an `HttpTransport` implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by `EntityClient` and its collaborators.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required credential or the entity name is missing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The server answered with a non-2xx status.
    #[error("received error [{body}] with status code [{status}] when sending request")]
    RemoteRequest { status: u16, body: String },

    /// The transport failed before a response was received.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body is not a JSON object.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The signer could not produce an Authorization header.
    #[error("signing failed: {0}")]
    Signing(String),
}

impl ApiError {
    pub(crate) fn missing(field: &str) -> Self {
        ApiError::Configuration(format!("{field} must not be empty"))
    }

    /// Status code of a `RemoteRequest` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::RemoteRequest { status, .. } => Some(*status),
            _ => None,
        }
    }
}
