//! The session state machine and its in-memory credential.
//!
//! A [`Session`] is the client's record of who is logged in. It tracks:
//! - WHAT state the client is in (anonymous, authenticating, authenticated)
//! - WHICH credential is live (at most one)
//! - the last login failure, for display
//!
//! Persistence is write-through: every change to the credential is mirrored
//! into the injected [`KeyValueStore`]. A store failure is logged and never
//! changes the in-memory state, so the process keeps working with a session
//! that simply won't survive a restart.

use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use levelup_transport::CredentialSource;

use crate::storage::{KeyValueStore, REFRESH_TOKEN_KEY, TOKEN_KEY, USERNAME_KEY};
use crate::Credential;

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The lifecycle state of the client session.
///
/// ```text
///   Anonymous ──(login)──→ Authenticating ──(ok)──→ Authenticated
///       ↑                        │                       │
///       └────────(failure)───────┘                       │
///       └──────────────(logout / refresh failure)────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticating,
    Authenticated,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => write!(f, "Anonymous"),
            Self::Authenticating => write!(f, "Authenticating"),
            Self::Authenticated => write!(f, "Authenticated"),
        }
    }
}

/// Outcome of the route guard for a protected view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// A credential is present; render the view.
    Permit,
    /// No credential; send the user to the login view.
    RedirectToLogin,
}

/// A point-in-time copy of the auth state, for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub username: Option<String>,
    /// `true` while a login request is in flight.
    pub loading: bool,
    pub last_error: Option<String>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct SessionInner {
    state: SessionState,
    credential: Option<Credential>,
    loading: bool,
    last_error: Option<String>,
}

/// The single authentication session of a client process.
///
/// Shared as `Arc<Session>` between the [`Authenticator`](crate::Authenticator)
/// and the transport (through [`CredentialSource`]). The internal lock is
/// only held for field updates, never across an `.await`.
pub struct Session {
    store: Box<dyn KeyValueStore>,
    inner: RwLock<SessionInner>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("inner", &*self.read())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Rebuilds the session from `store`.
    ///
    /// If a token is stored the session starts Authenticated. The token is
    /// not validated here; an expired one is discovered on the first
    /// protected request.
    pub fn restore(store: impl KeyValueStore + 'static) -> Self {
        let credential = store.get(TOKEN_KEY).map(|token| Credential {
            username: store.get(USERNAME_KEY).unwrap_or_default(),
            token,
            refresh_token: store.get(REFRESH_TOKEN_KEY),
        });

        let state = if credential.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        };
        tracing::info!(%state, "session restored");

        Self {
            store: Box::new(store),
            inner: RwLock::new(SessionInner {
                state,
                credential,
                loading: false,
                last_error: None,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.read().state
    }

    /// The live credential, if any.
    pub fn credential(&self) -> Option<Credential> {
        self.read().credential.clone()
    }

    /// Display label of the logged-in user.
    pub fn username(&self) -> Option<String> {
        self.read().credential.as_ref().map(|c| c.username.clone())
    }

    /// Returns `true` if a credential is present.
    pub fn is_authenticated(&self) -> bool {
        self.read().credential.is_some()
    }

    /// Route guard for protected views.
    ///
    /// Synchronous, and based only on credential presence: a stale token
    /// still permits the view, and the first request it makes will sort
    /// out validity.
    pub fn guard(&self) -> RouteDecision {
        if self.is_authenticated() {
            RouteDecision::Permit
        } else {
            RouteDecision::RedirectToLogin
        }
    }

    /// A copy of the current auth state.
    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.read();
        SessionSnapshot {
            state: inner.state,
            username: inner.credential.as_ref().map(|c| c.username.clone()),
            loading: inner.loading,
            last_error: inner.last_error.clone(),
        }
    }

    /// Marks a login request as in flight.
    pub(crate) fn begin_login(&self) {
        let mut inner = self.write();
        inner.state = SessionState::Authenticating;
        inner.loading = true;
        inner.last_error = None;
    }

    /// Installs and persists a freshly issued credential.
    ///
    /// With concurrent logins the last one to complete wins.
    pub(crate) fn complete_login(&self, credential: Credential) {
        self.persist(&credential);
        let username = credential.username.clone();
        {
            let mut inner = self.write();
            inner.credential = Some(credential);
            inner.state = SessionState::Authenticated;
            inner.loading = false;
            inner.last_error = None;
        }
        tracing::info!(%username, "session authenticated");
    }

    /// Records a failed login.
    ///
    /// A credential from an earlier login stays in place, so the state
    /// falls back to Authenticated if one exists and Anonymous otherwise.
    pub(crate) fn fail_login(&self, message: impl Into<String>) {
        let message = message.into();
        let mut inner = self.write();
        inner.state = if inner.credential.is_some() {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        };
        inner.loading = false;
        tracing::warn!(error = %message, state = %inner.state, "login failed");
        inner.last_error = Some(message);
    }

    /// Ends the session and clears persisted credentials.
    ///
    /// Synchronous and idempotent.
    pub fn logout(&self) {
        self.end(None);
    }

    /// Clears the credential, or only the credential holding `token`
    /// when one is given. Returns `false` if nothing matched.
    fn end(&self, token: Option<&str>) -> bool {
        let had_credential = {
            let mut inner = self.write();
            if let (Some(token), Some(live)) = (token, inner.credential.as_ref()) {
                if live.token != token {
                    return false;
                }
            }
            inner.state = SessionState::Anonymous;
            inner.loading = false;
            inner.credential.take().is_some()
        };
        for key in [TOKEN_KEY, USERNAME_KEY, REFRESH_TOKEN_KEY] {
            if let Err(e) = self.store.remove(key) {
                tracing::warn!(key, error = %e, "failed to clear persisted credential");
            }
        }
        if had_credential {
            tracing::info!("session ended");
        }
        true
    }

    fn persist(&self, credential: &Credential) {
        let mut writes = vec![
            self.store.set(TOKEN_KEY, &credential.token),
            self.store.set(USERNAME_KEY, &credential.username),
        ];
        writes.push(match &credential.refresh_token {
            Some(refresh) => self.store.set(REFRESH_TOKEN_KEY, refresh),
            None => self.store.remove(REFRESH_TOKEN_KEY),
        });
        for result in writes {
            if let Err(e) = result {
                tracing::warn!(error = %e, "failed to persist credential");
            }
        }
    }
}

impl CredentialSource for Session {
    fn bearer_token(&self) -> Option<String> {
        self.read().credential.as_ref().map(|c| c.token.clone())
    }

    fn refresh_input(&self) -> Option<String> {
        self.read()
            .credential
            .as_ref()
            .map(|c| c.refresh_input().to_string())
    }

    fn replace_token(&self, rejected: &str, access_token: &str) {
        {
            let mut inner = self.write();
            let Some(credential) = inner.credential.as_mut() else {
                tracing::debug!("refreshed token discarded, session already ended");
                return;
            };
            if credential.token != rejected {
                // A newer login replaced the credential the refresh was for.
                tracing::debug!("refreshed token discarded, credential changed");
                return;
            }
            credential.token = access_token.to_string();
        }
        if let Err(e) = self.store.set(TOKEN_KEY, access_token) {
            tracing::warn!(error = %e, "failed to persist refreshed token");
        }
    }

    fn invalidate(&self, rejected: &str) {
        if !self.end(Some(rejected)) {
            tracing::debug!("stale rejection ignored, credential changed");
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
