//! The seam between the harness and the Pact verifier that does the matching.
//!
//! Implementations replay every interaction of one contract file against a
//! running provider and report whether the responses conformed. How a
//! response is matched against its expectation is entirely the
//! implementation's business.

use crate::contract::ContractFile;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Interactions the verifier reported as not matching.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VerificationMismatch {
    /// Descriptions of the failing interactions, in contract order when known
    pub failed_interactions: Vec<String>,
    /// Verifier output explaining the mismatch
    pub detail: String,
}

/// Why a contract did not verify.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifierError {
    /// The provider answered but did not satisfy the contract
    #[error("Verification mismatch: {}", summarize(&.0.failed_interactions))]
    Mismatch(VerificationMismatch),

    /// The verifier itself could not run
    #[error("Verifier unavailable: {0}")]
    Unavailable(String),
}

impl VerifierError {
    /// Create a mismatch error.
    #[must_use]
    pub fn mismatch(failed_interactions: Vec<String>, detail: impl Into<String>) -> Self {
        Self::Mismatch(VerificationMismatch {
            failed_interactions,
            detail: detail.into(),
        })
    }

    /// Create an unavailable error.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }
}

fn summarize(failed: &[String]) -> String {
    if failed.is_empty() {
        "provider did not satisfy the contract".to_string()
    } else {
        failed.join(", ")
    }
}

/// Replays a contract against a provider.
#[async_trait]
pub trait ContractVerifier: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Verify every interaction of `contract` against the provider at
    /// `service_address` (scheme, host, port and optional base path).
    async fn verify(&self, contract: &ContractFile, service_address: &str)
    -> Result<(), VerifierError>;
}
