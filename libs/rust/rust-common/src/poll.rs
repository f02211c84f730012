//! Fixed-interval polling with a bounded attempt budget.
//!
//! Readiness checks sleep for the interval, check, and repeat until the check
//! succeeds or the budget runs out. There is no backoff and no jitter: the
//! worst-case wait is `max_attempts * (interval + check time)`.

use std::future::Future;
use std::time::Duration;

/// Polling configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Maximum number of checks
    pub max_attempts: u32,
    /// Sleep before each check
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval: Duration::from_secs(1),
        }
    }
}

impl PollConfig {
    /// Set the maximum number of checks.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the interval between checks.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Returned when every attempt failed.
#[derive(Debug)]
pub struct PollExhausted<E> {
    /// Number of checks performed
    pub attempts: u32,
    /// Error from the final check, if any check ran
    pub last_error: Option<E>,
}

/// Policy that drives a check until it succeeds or the budget is spent.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    config: PollConfig,
}

impl PollPolicy {
    /// Create a new poll policy.
    #[must_use]
    pub const fn new(config: PollConfig) -> Self {
        Self { config }
    }

    /// Run `check` until it returns `Ok`.
    ///
    /// `on_failure` sees every failed attempt (1-based) with its error, which
    /// lets callers log progress without the policy knowing their error type.
    ///
    /// # Errors
    ///
    /// Returns [`PollExhausted`] carrying the last error once `max_attempts`
    /// checks have failed.
    pub async fn until_ready<F, Fut, T, E, L>(
        &self,
        mut check: F,
        mut on_failure: L,
    ) -> Result<T, PollExhausted<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        L: FnMut(u32, &E),
    {
        let mut last_error = None;
        for attempt in 1..=self.config.max_attempts {
            tokio::time::sleep(self.config.interval).await;
            match check().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    on_failure(attempt, &error);
                    last_error = Some(error);
                }
            }
        }

        Err(PollExhausted {
            attempts: self.config.max_attempts,
            last_error,
        })
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(PollConfig::default())
    }
}
