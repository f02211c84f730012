//! Harness-level errors.
//!
//! Only failures that abort a whole run live here. Per-file problems
//! (malformed contracts, mismatches, a verifier that could not run) are
//! recorded in the outcome instead.

use crate::config::ConfigError;
use harness_pact::ContractError;
use rust_common::PlatformError;
use thiserror::Error;

/// Errors that abort a verification run.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// The launched provider never answered its health check
    #[error("Provider at {address} did not become healthy after {attempts} attempt(s)")]
    StartupTimeout {
        /// Address that was polled
        address: String,
        /// Health polls performed
        attempts: u32,
    },

    /// The start command could not be executed
    #[error("Failed to launch provider with `{command}`: {source}")]
    Spawn {
        /// Command line that was attempted
        command: String,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The contract directory could not be listed
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// Health check client could not be built
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startup_timeout_display() {
        let err = HarnessError::StartupTimeout {
            address: "http://localhost:7001".to_string(),
            attempts: 10,
        };
        assert_eq!(
            err.to_string(),
            "Provider at http://localhost:7001 did not become healthy after 10 attempt(s)"
        );
    }

    #[test]
    fn test_config_error_is_transparent() {
        let err = HarnessError::from(ConfigError::InvalidAttempts);
        assert!(err.to_string().contains("STARTUP_MAX_ATTEMPTS"));
    }
}
