//! Pact verifier backends.
//!
//! Matching a provider's responses against a contract is the Pact
//! verifier's job. These backends only hand it a contract file and an
//! address, then translate what it reports into a [`VerifierError`].
//!
//! [`VerifierError`]: harness_pact::VerifierError

pub mod cli;
#[cfg(feature = "pact")]
pub mod native;

pub use cli::CliVerifier;
#[cfg(feature = "pact")]
pub use native::NativeVerifier;

use crate::config::{Config, ConfigError, VerifierBackend};
use harness_pact::ContractVerifier;
use std::sync::Arc;

/// Build the verifier selected by `config`.
///
/// # Errors
///
/// Returns [`ConfigError::BackendUnavailable`] when the native backend is
/// requested from a build without the `pact` feature.
pub fn build_verifier(config: &Config) -> Result<Arc<dyn ContractVerifier>, ConfigError> {
    match config.verifier {
        VerifierBackend::Cli => Ok(Arc::new(
            CliVerifier::new(&config.verifier_bin, &config.provider_name)
                .with_timeout(config.verifier_timeout),
        )),
        #[cfg(feature = "pact")]
        VerifierBackend::Native => Ok(Arc::new(
            NativeVerifier::new(&config.provider_name).with_request_timeout(config.verifier_timeout),
        )),
        #[cfg(not(feature = "pact"))]
        VerifierBackend::Native => Err(ConfigError::BackendUnavailable(
            VerifierBackend::Native.to_string(),
        )),
    }
}
