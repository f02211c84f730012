//! Error type shared by the harness libraries.
//!
//! A health check can fail in two very different ways: nothing answers at
//! the address, or something answers and says it is not ready. Pollers
//! treat both as "try again" but log them differently, so the split is
//! exposed through [`PlatformError::is_connection_failure`].

use thiserror::Error;

/// Failure raised by a readiness check.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// The request never produced a response
    #[error("request to service failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A response arrived but the service reported itself not ready
    #[error("service not ready: {0}")]
    Unavailable(String),
}

impl PlatformError {
    /// `true` when nothing could be reached at the target address.
    ///
    /// Refused connections and elapsed deadlines both qualify; a process
    /// that is still booting produces either one depending on how far it
    /// got.
    ///
    /// ```
    /// use rust_common::PlatformError;
    ///
    /// assert!(!PlatformError::unavailable("status 503").is_connection_failure());
    /// ```
    #[must_use]
    pub fn is_connection_failure(&self) -> bool {
        match self {
            Self::Http(err) => err.is_connect() || err.is_timeout(),
            Self::Unavailable(_) => false,
        }
    }

    /// Shorthand for [`PlatformError::Unavailable`].
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_ready_is_not_connection_failure() {
        let err = PlatformError::unavailable("status 503 Service Unavailable");
        assert!(!err.is_connection_failure());
        assert_eq!(err.to_string(), "service not ready: status 503 Service Unavailable");
    }

    #[tokio::test]
    async fn test_refused_connection_is_connection_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = reqwest::get(format!("http://127.0.0.1:{port}/health"))
            .await
            .map(drop)
            .map_err(PlatformError::from)
            .unwrap_err();
        assert!(err.is_connection_failure(), "{err}");
        assert!(err.to_string().starts_with("request to service failed"));
    }
}
