//! The raw request/response seam beneath [`ApiClient`](crate::ApiClient).
//!
//! An [`Exchange`] performs exactly one HTTP round trip. It knows nothing
//! about sessions or refresh: non-2xx statuses come back as ordinary
//! [`HttpResponse`]s, and only failures that produced no response at all
//! are errors. That keeps the 401 handling in one place (the client) and
//! lets tests swap in a scripted exchange.

use std::fmt;

use serde_json::Value;

use crate::TransportError;

// ---------------------------------------------------------------------------
// Method
// ---------------------------------------------------------------------------

/// The HTTP methods the portal API uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
        }
    }
}

// ---------------------------------------------------------------------------
// HttpRequest / HttpResponse
// ---------------------------------------------------------------------------

/// One outbound request, relative to the configured base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    /// Path beginning with `/`, e.g. `/users/7/xp`.
    pub path: String,
    /// JSON body, sent with `Content-Type: application/json`.
    pub body: Option<Value>,
    /// Bearer token for the `Authorization` header, if any.
    pub bearer: Option<String>,
}

impl HttpRequest {
    /// Creates a request with no body and no credential.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            bearer: None,
        }
    }

    /// Attaches a JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attaches a bearer token.
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }
}

/// The status and decoded body of one response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    /// Parsed JSON body. An empty body is `Null`; a body that isn't JSON
    /// is kept verbatim as a `String` value.
    pub body: Value,
}

impl HttpResponse {
    /// Creates a response with the given status and body.
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Builds a response from raw body text.
    pub fn from_text(status: u16, text: &str) -> Self {
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(text)
                .unwrap_or_else(|_| Value::String(text.to_string()))
        };
        Self { status, body }
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns `true` for 401.
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Extracts a human-readable error message from the body.
    ///
    /// Looks for an `error`, `message` or `msg` field, then falls back to
    /// a string body, then to a generic `HTTP <status>` label.
    pub fn error_message(&self) -> String {
        for key in ["error", "message", "msg"] {
            if let Some(Value::String(message)) = self.body.get(key) {
                return message.clone();
            }
        }
        match &self.body {
            Value::String(text) if !text.is_empty() => text.clone(),
            _ => format!("HTTP {}", self.status),
        }
    }
}

// ---------------------------------------------------------------------------
// Exchange
// ---------------------------------------------------------------------------

/// Performs a single HTTP round trip.
///
/// # Trait bounds
///
/// - `Send + Sync + 'static` → one exchange is shared by every cache and
///   may be driven from any task.
/// - The returned future is `Send` so callers can `tokio::spawn` work that
///   goes through the client.
pub trait Exchange: Send + Sync + 'static {
    /// Sends the request and returns whatever the server answered.
    ///
    /// # Errors
    /// Returns [`TransportError::Network`] when no response was received.
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl std::future::Future<Output = Result<HttpResponse, TransportError>>
    + Send;
}
