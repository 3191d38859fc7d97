//! Configuration for the HTTP client.

use std::time::Duration;

use crate::TransportError;

/// Default backend endpoint.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Default timeout for HTTP requests: 30 seconds.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the backend client.
///
/// The timeout is the only deadline anywhere in the stack; nothing above
/// the transport enforces its own.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base endpoint; request paths are appended to it.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: Self::default_user_agent(),
        }
    }
}

impl ClientConfig {
    fn default_user_agent() -> String {
        format!("levelup/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Sets the base endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Returns the effective timeout, using the default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            self.timeout
        }
    }

    /// Returns the effective user agent, using the default if empty.
    pub fn effective_user_agent(&self) -> String {
        if self.user_agent.is_empty() {
            Self::default_user_agent()
        } else {
            self.user_agent.clone()
        }
    }

    /// Returns the base URL without a trailing slash.
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Checks that the base URL is an absolute http(s) endpoint.
    ///
    /// # Errors
    /// Returns [`TransportError::InvalidConfig`] otherwise.
    pub fn validate(&self) -> Result<(), TransportError> {
        let base = self.normalized_base_url();
        let has_scheme =
            base.starts_with("http://") || base.starts_with("https://");
        if !has_scheme {
            return Err(TransportError::InvalidConfig(format!(
                "base url must start with http:// or https://, got {:?}",
                self.base_url
            )));
        }
        Ok(())
    }
}
