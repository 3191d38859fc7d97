//! Error types for the transport layer.

/// Errors that can occur while talking to the backend.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The server answered 401 and the session could not be recovered
    /// by a token refresh (or there was no credential to refresh).
    #[error("unauthorized request to {path}")]
    Unauthorized { path: String },

    /// The server answered with any other non-2xx status.
    #[error("request to {path} failed with status {status}: {message}")]
    Status {
        status: u16,
        path: String,
        message: String,
    },

    /// The request never produced a response (DNS, connect, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// The request body could not be serialized.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// The response body did not match the expected shape.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The client configuration is unusable.
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl TransportError {
    /// Returns `true` if this error means the session is no longer
    /// authenticated.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Returns the HTTP status code, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
