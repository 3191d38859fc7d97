//! The credential a logged-in client holds.

use std::fmt;

/// Proof of an authenticated session.
///
/// At most one credential is live per [`Session`](crate::Session). It is
/// created on login, persisted immediately, and destroyed on logout or
/// when a refresh fails.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Subject identifier, also used as the display label.
    pub username: String,
    /// Bearer token sent with every request.
    pub token: String,
    /// Separate refresh token, when the backend issues one.
    pub refresh_token: Option<String>,
}

impl Credential {
    /// Creates a credential without a refresh token.
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
            refresh_token: None,
        }
    }

    /// Attaches a refresh token.
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// The value to present to `/refresh`.
    ///
    /// The backend accepts the access token itself when no dedicated
    /// refresh token was issued.
    pub fn refresh_input(&self) -> &str {
        self.refresh_token.as_deref().unwrap_or(&self.token)
    }
}

// Tokens never show up in logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_input_falls_back_to_access_token() {
        let cred = Credential::new("admin", "T1");
        assert_eq!(cred.refresh_input(), "T1");
    }

    #[test]
    fn test_refresh_input_prefers_refresh_token() {
        let cred = Credential::new("admin", "T1").with_refresh_token("R1");
        assert_eq!(cred.refresh_input(), "R1");
    }

    #[test]
    fn test_debug_redacts_token() {
        let cred = Credential::new("admin", "secret-token");
        let printed = format!("{cred:?}");
        assert!(printed.contains("admin"));
        assert!(!printed.contains("secret-token"));
    }
}
