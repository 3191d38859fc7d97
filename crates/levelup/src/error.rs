//! Unified error type for the Levelup client.

use levelup_session::SessionError;
use levelup_store::{FailureKind, StoreError};
use levelup_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum LevelupError {
    /// A transport-level error (network, status, configuration).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A session-level error (login, persistence).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A cache-level error (validation, auth, remote).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The tracing subscriber could not be installed.
    #[error("failed to initialize tracing: {0}")]
    Telemetry(String),
}

impl LevelupError {
    /// Returns `true` if the user has to log in again.
    pub fn requires_login(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_unauthorized(),
            Self::Session(SessionError::AuthFailed(_)) => true,
            Self::Session(SessionError::Transport(e)) => e.is_unauthorized(),
            Self::Store(e) => e.kind() == FailureKind::Auth,
            _ => false,
        }
    }
}
