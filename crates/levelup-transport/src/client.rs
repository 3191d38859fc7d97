//! The API client: bearer tagging and the one-shot refresh path.
//!
//! # Request lifecycle
//!
//! ```text
//! send() ──→ execute(bearer) ──→ 2xx ──→ Ok(body)
//!                  │
//!                  └──→ 401 ──→ POST /refresh ──→ ok ──→ replace_token()
//!                                    │                        │
//!                                    ▼                        ▼
//!                               invalidate()        execute(new bearer) ──→ 2xx / error
//!                                    │                        │
//!                                    ▼                        └──→ 401 ──→ invalidate()
//!                             Err(Unauthorized)
//! ```
//!
//! The refresh call and the retry are awaited one after the other, so the
//! retry is always issued strictly after the refresh has resolved. There is
//! no loop: a request is refreshed at most once.
//!
//! Every credential update names the token the server rejected. If the
//! session moved on while a request was in flight, the 401 is answered with
//! the live token instead of a second refresh, and a stale refresh result
//! or failure never touches the newer credential.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{Exchange, HttpRequest, HttpResponse, Method, TransportError};

/// Path of the token refresh endpoint.
const REFRESH_PATH: &str = "/refresh";

// ---------------------------------------------------------------------------
// CredentialSource
// ---------------------------------------------------------------------------

/// The transport's view of the session.
///
/// The session layer implements this so the client can tag requests and
/// swap tokens without knowing anything about storage.
pub trait CredentialSource: Send + Sync {
    /// The token to send as `Authorization: Bearer <token>`, if any.
    fn bearer_token(&self) -> Option<String>;

    /// The value to send as `refresh_token` to `/refresh`, if any.
    fn refresh_input(&self) -> Option<String>;

    /// Stores a freshly issued access token in place of `rejected`.
    ///
    /// Ignored if the live credential no longer holds `rejected`.
    fn replace_token(&self, rejected: &str, access_token: &str);

    /// Ends the session after an unrecoverable 401 on `rejected`.
    ///
    /// Ignored if the live credential no longer holds `rejected`.
    fn invalidate(&self, rejected: &str);
}

/// A [`CredentialSource`] that never has a credential.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialSource for NoCredentials {
    fn bearer_token(&self) -> Option<String> {
        None
    }

    fn refresh_input(&self) -> Option<String> {
        None
    }

    fn replace_token(&self, _rejected: &str, _access_token: &str) {}

    fn invalidate(&self, _rejected: &str) {}
}

// ---------------------------------------------------------------------------
// ApiClient
// ---------------------------------------------------------------------------

/// Whether a 401 may trigger the refresh path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshPolicy {
    OnUnauthorized,
    Never,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
}

struct ApiClientInner<E> {
    exchange: E,
    credentials: Arc<dyn CredentialSource>,
}

/// JSON client for the portal backend.
///
/// Cheap to clone; all clones share one exchange and one credential
/// source.
pub struct ApiClient<E> {
    inner: Arc<ApiClientInner<E>>,
}

impl<E> Clone for ApiClient<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Exchange> ApiClient<E> {
    /// Creates a client that reads credentials from `credentials`.
    pub fn new(exchange: E, credentials: Arc<dyn CredentialSource>) -> Self {
        Self {
            inner: Arc::new(ApiClientInner {
                exchange,
                credentials,
            }),
        }
    }

    /// Returns the underlying exchange.
    pub fn exchange(&self) -> &E {
        &self.inner.exchange
    }

    /// Sends a request and returns the JSON response body.
    ///
    /// A 401 triggers at most one refresh and one retry.
    ///
    /// # Errors
    /// - [`TransportError::Unauthorized`] — 401 not recoverable by refresh
    /// - [`TransportError::Status`] — any other non-2xx response
    /// - [`TransportError::Network`] — no response received
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, TransportError> {
        self.dispatch(method, path, body, RefreshPolicy::OnUnauthorized)
            .await
    }

    /// Like [`send`](Self::send) but a 401 is returned as-is.
    ///
    /// Used for the credential exchange itself, where a 401 means
    /// "wrong password" rather than "token expired".
    pub async fn send_without_refresh(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, TransportError> {
        self.dispatch(method, path, body, RefreshPolicy::Never).await
    }

    /// `GET path`, decoding the response into `T`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, TransportError> {
        let value = self.send(Method::Get, path, None).await?;
        decode(value)
    }

    /// `POST path` with a JSON body, decoding the response into `T`.
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, TransportError> {
        let value = self.send(Method::Post, path, Some(encode(body)?)).await?;
        decode(value)
    }

    /// `PUT path` with a JSON body, decoding the response into `T`.
    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, TransportError> {
        let value = self.send(Method::Put, path, Some(encode(body)?)).await?;
        decode(value)
    }

    /// `POST path` with refresh disabled.
    pub async fn post_without_refresh<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, TransportError> {
        let value = self
            .send_without_refresh(Method::Post, path, Some(encode(body)?))
            .await?;
        decode(value)
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        bearer: Option<String>,
    ) -> Result<HttpResponse, TransportError> {
        let request = HttpRequest {
            method,
            path: path.to_string(),
            body,
            bearer,
        };
        tracing::debug!(
            %method,
            path,
            authenticated = request.bearer.is_some(),
            "sending request"
        );
        self.inner.exchange.execute(request).await
    }

    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        policy: RefreshPolicy,
    ) -> Result<Value, TransportError> {
        let credentials = &self.inner.credentials;
        let sent = credentials.bearer_token();
        let response = self
            .execute(method, path, body.clone(), sent.clone())
            .await?;

        if !response.is_unauthorized() || policy == RefreshPolicy::Never {
            return into_result(path, response);
        }

        let current = credentials.bearer_token();
        if current != sent {
            // Refreshed, replaced or ended while this request was in flight.
            let Some(token) = current else {
                tracing::debug!(path, "401 after the session ended");
                return Err(unauthorized(path));
            };
            tracing::debug!(path, "credential changed in flight, retrying without refresh");
            return self.retry(method, path, body, token).await;
        }

        let (Some(rejected), Some(refresh_input)) = (sent, credentials.refresh_input()) else {
            tracing::debug!(path, "401 with no credential to refresh");
            return Err(unauthorized(path));
        };

        tracing::warn!(path, "access token rejected, attempting refresh");
        let token = match self.refresh(refresh_input).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(path, error = %e, "token refresh failed, ending session");
                credentials.invalidate(&rejected);
                return Err(unauthorized(path));
            }
        };
        credentials.replace_token(&rejected, &token);

        // A login that landed during the refresh keeps its own token.
        let Some(token) = credentials.bearer_token() else {
            tracing::debug!(path, "session ended during refresh");
            return Err(unauthorized(path));
        };
        tracing::info!(path, "token refreshed, retrying request");
        self.retry(method, path, body, token).await
    }

    /// Re-issues a request once with `token`. A second 401 ends the
    /// session holding that token.
    async fn retry(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        token: String,
    ) -> Result<Value, TransportError> {
        let retried = self.execute(method, path, body, Some(token.clone())).await?;
        if retried.is_unauthorized() {
            tracing::warn!(path, "retry rejected, ending session");
            self.inner.credentials.invalidate(&token);
        }
        into_result(path, retried)
    }

    /// Exchanges the stored credential for a new access token.
    async fn refresh(&self, refresh_input: String) -> Result<String, TransportError> {
        let body = json!({ "refresh_token": refresh_input });
        let response = self
            .execute(Method::Post, REFRESH_PATH, Some(body), None)
            .await?;
        let value = into_result(REFRESH_PATH, response)?;
        let refreshed: RefreshResponse = decode(value)?;
        Ok(refreshed.access_token)
    }
}

fn unauthorized(path: &str) -> TransportError {
    TransportError::Unauthorized {
        path: path.to_string(),
    }
}

fn into_result(path: &str, response: HttpResponse) -> Result<Value, TransportError> {
    if response.is_success() {
        Ok(response.body)
    } else if response.is_unauthorized() {
        Err(unauthorized(path))
    } else {
        Err(TransportError::Status {
            status: response.status,
            path: path.to_string(),
            message: response.error_message(),
        })
    }
}

fn encode<B: Serialize>(body: &B) -> Result<Value, TransportError> {
    serde_json::to_value(body).map_err(TransportError::Encode)
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, TransportError> {
    serde_json::from_value(value).map_err(TransportError::Decode)
}

// =========================================================================
// Tests
// =========================================================================
