//! Error types for the cache layer.

use levelup_transport::TransportError;

/// Which part of the failure taxonomy an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The session is gone; the user has to log in again.
    Auth,
    /// Bad input, rejected before any request was sent.
    Validation,
    /// Anything else the backend or the network reported.
    Remote,
}

/// Errors returned by cache operations.
///
/// Every error is also written to the cache's `error` field before it is
/// returned.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Input rejected locally.
    #[error("{0}")]
    Validation(String),

    /// The backend answered 401 and refresh could not recover it.
    #[error("session expired: {0}")]
    Auth(#[source] TransportError),

    /// Any other backend or network failure.
    #[error(transparent)]
    Remote(TransportError),
}

impl StoreError {
    /// Classifies this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Validation(_) => FailureKind::Validation,
            Self::Auth(_) => FailureKind::Auth,
            Self::Remote(_) => FailureKind::Remote,
        }
    }
}

impl From<TransportError> for StoreError {
    fn from(err: TransportError) -> Self {
        if err.is_unauthorized() {
            Self::Auth(err)
        } else {
            Self::Remote(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_unauthorized_is_auth() {
        let err: StoreError = TransportError::Unauthorized {
            path: "/users".into(),
        }
        .into();
        assert_eq!(err.kind(), FailureKind::Auth);
    }

    #[test]
    fn test_from_transport_status_is_remote() {
        let err: StoreError = TransportError::Status {
            status: 400,
            path: "/rewards".into(),
            message: "bad".into(),
        }
        .into();
        assert_eq!(err.kind(), FailureKind::Remote);
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn test_validation_message_is_displayed_verbatim() {
        let err = StoreError::Validation("name is required".into());
        assert_eq!(err.to_string(), "name is required");
        assert_eq!(err.kind(), FailureKind::Validation);
    }
}
