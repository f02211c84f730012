//! HTTP client used for readiness checks.

use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// Health-check client settings.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Deadline for a whole request, response body included (default: 2s)
    pub timeout: Duration,
    /// Deadline for the TCP/TLS handshake, never above `timeout`
    pub connect_timeout: Duration,
    /// Sent as `User-Agent`
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(2),
            connect_timeout: Duration::from_secs(2),
            user_agent: concat!("provider-verifier/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    /// Set the request deadline, lowering the connect deadline to match.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.connect_timeout = self.connect_timeout.min(timeout);
        self
    }
}

/// Build a rustls-backed client from `config`.
///
/// Idle connections are never pooled: a service restarted on the same port
/// must not be answered from a stale socket, so every check connects afresh.
///
/// # Errors
///
/// Fails only when the TLS backend cannot be initialised.
///
/// ```
/// use rust_common::{HttpConfig, build_http_client};
/// use std::time::Duration;
///
/// let config = HttpConfig::default().with_timeout(Duration::from_millis(500));
/// assert!(build_http_client(&config).is_ok());
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    ClientBuilder::new()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .user_agent(&config.user_agent)
        .pool_max_idle_per_host(0)
        .use_rustls_tls()
        .build()
}
