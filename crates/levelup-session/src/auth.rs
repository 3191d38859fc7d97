//! Credential exchange: turning a username and password into a session.

use std::sync::Arc;

use levelup_transport::{ApiClient, Exchange, TransportError};
use serde::{Deserialize, Serialize};

use crate::{Credential, Session, SessionError};

/// Path of the login endpoint.
const LOGIN_PATH: &str = "/login";

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Drives login and logout against the backend for one [`Session`].
///
/// The client passed in must have been built around the same session
/// (it's the session that tags the client's requests).
pub struct Authenticator<E> {
    client: ApiClient<E>,
    session: Arc<Session>,
}

impl<E> Clone for Authenticator<E> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            session: Arc::clone(&self.session),
        }
    }
}

impl<E: Exchange> Authenticator<E> {
    /// Creates an authenticator for `session`.
    pub fn new(client: ApiClient<E>, session: Arc<Session>) -> Self {
        Self { client, session }
    }

    /// The session this authenticator manages.
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Exchanges credentials for a token and installs it.
    ///
    /// Concurrent logins are not deduplicated; the last response to
    /// arrive decides the stored credential.
    ///
    /// # Errors
    /// - [`SessionError::Validation`] — empty username or password, no
    ///   request sent
    /// - [`SessionError::AuthFailed`] — rejected credentials, or a response
    ///   without `access_token`
    /// - [`SessionError::Transport`] — any other backend failure
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Credential, SessionError> {
        if username.trim().is_empty() || password.is_empty() {
            let err = SessionError::Validation(
                "username and password are required".into(),
            );
            self.session.fail_login(err.to_string());
            return Err(err);
        }

        self.session.begin_login();
        tracing::debug!(username, "logging in");

        let request = LoginRequest { username, password };
        let result = self
            .client
            .post_without_refresh::<_, LoginResponse>(LOGIN_PATH, &request)
            .await
            .map_err(|e| match e {
                TransportError::Unauthorized { .. } => SessionError::AuthFailed(
                    "invalid username or password".into(),
                ),
                other => SessionError::Transport(other),
            })
            .and_then(|response| {
                let token = response.access_token.ok_or_else(|| {
                    SessionError::AuthFailed("no token received".into())
                })?;
                let mut credential = Credential::new(
                    response.username.unwrap_or_else(|| username.to_string()),
                    token,
                );
                credential.refresh_token = response.refresh_token;
                Ok(credential)
            });

        match result {
            Ok(credential) => {
                self.session.complete_login(credential.clone());
                Ok(credential)
            }
            Err(e) => {
                self.session.fail_login(e.to_string());
                Err(e)
            }
        }
    }

    /// Ends the session. Synchronous and idempotent.
    pub fn logout(&self) {
        self.session.logout();
    }
}
