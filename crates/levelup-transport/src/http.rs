//! [`Exchange`] implementation using `reqwest`.

use std::sync::Arc;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};

use crate::{
    ClientConfig, Exchange, HttpRequest, HttpResponse, Method, TransportError,
};

/// Shared client state; cloning the exchange clones the `Arc`.
struct ReqwestExchangeInner {
    http: reqwest::Client,
    config: ClientConfig,
}

/// A [`Exchange`] backed by a single pooled `reqwest::Client`.
///
/// JSON content negotiation is configured once as default headers, so
/// every request advertises `Accept: application/json` and bodies are
/// sent as `application/json`.
#[derive(Clone)]
pub struct ReqwestExchange {
    inner: Arc<ReqwestExchangeInner>,
}

impl std::fmt::Debug for ReqwestExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestExchange")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ReqwestExchange {
    /// Builds the HTTP client for the given configuration.
    ///
    /// # Errors
    /// Returns [`TransportError::InvalidConfig`] if the base URL is not
    /// an http(s) endpoint or the client cannot be constructed.
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let http = reqwest::Client::builder()
            .timeout(config.effective_timeout())
            .user_agent(config.effective_user_agent())
            .default_headers(headers)
            .build()
            .map_err(|e| TransportError::InvalidConfig(e.to_string()))?;

        tracing::debug!(
            base_url = %config.normalized_base_url(),
            timeout_ms = config.effective_timeout().as_millis(),
            "http exchange created"
        );

        Ok(Self {
            inner: Arc::new(ReqwestExchangeInner { http, config }),
        })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.inner.config.normalized_base_url(), path)
    }
}

impl Exchange for ReqwestExchange {
    async fn execute(
        &self,
        request: HttpRequest,
    ) -> Result<HttpResponse, TransportError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
        };

        let mut builder = self.inner.http.request(method, self.url(&request.path));
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(network_error)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(network_error)?;

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status,
            "http exchange completed"
        );

        Ok(HttpResponse::from_text(status, &text))
    }
}

fn network_error(err: reqwest::Error) -> TransportError {
    let message = if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        "connection failed".to_string()
    } else {
        err.to_string()
    };
    TransportError::Network(message)
}
