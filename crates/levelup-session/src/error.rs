//! Error types for the session layer.

use levelup_transport::TransportError;

/// Errors that can occur while acquiring or persisting a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The backend rejected the credentials, or answered without a token.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// A required login field was empty. Raised before any request.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The persistent store could not be read or written.
    #[error("credential storage failed: {0}")]
    Storage(String),

    /// Any other failure talking to the backend.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
