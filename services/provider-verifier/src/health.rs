//! Provider health check.

use crate::config::ServiceSpec;
use rust_common::{HttpConfig, PlatformError, build_http_client};

/// Checks `GET {address}{health_path}`.
///
/// Any 2xx is healthy. Everything else, including refused connections and
/// timeouts, is reported as an error for the caller to treat as "not ready".
#[derive(Debug, Clone)]
pub struct HealthCheck {
    client: reqwest::Client,
    url: String,
}

impl HealthCheck {
    /// Build a check for the service's health endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(spec: &ServiceSpec) -> Result<Self, PlatformError> {
        let config = HttpConfig::default().with_timeout(spec.health_timeout);
        Ok(Self {
            client: build_http_client(&config)?,
            url: spec.health_url(),
        })
    }

    /// Checked URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Check once.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Http`] on transport failure and
    /// [`PlatformError::Unavailable`] on a non-2xx status.
    pub async fn check(&self) -> Result<(), PlatformError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(PlatformError::unavailable(format!("health check returned {status}")))
        }
    }
}
