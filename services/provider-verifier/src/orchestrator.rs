//! Contract verification orchestration.
//!
//! Discovers contract files, loads each one, hands the valid ones to the
//! verifier and folds the per-file results into a [`VerificationOutcome`].
//! Files are verified one at a time in discovery order and no per-file
//! failure stops the loop.

use harness_pact::{
    ContractError, ContractFile, ContractVerifier, FileVerification, VerificationOutcome,
    VerifierError, discover_contract_files, load_contract_summary,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Drives a [`ContractVerifier`] over a contract directory.
#[derive(Clone)]
pub struct VerificationOrchestrator {
    verifier: Arc<dyn ContractVerifier>,
}

impl VerificationOrchestrator {
    /// Create an orchestrator around `verifier`.
    #[must_use]
    pub fn new(verifier: Arc<dyn ContractVerifier>) -> Self {
        Self { verifier }
    }

    /// Verify one contract against the provider at `service_address`.
    ///
    /// # Errors
    ///
    /// Returns the verifier's mismatch or unavailability report.
    pub async fn verify_against(
        &self,
        service_address: &str,
        contract: &ContractFile,
    ) -> Result<(), VerifierError> {
        info!(
            file = %contract.file_name(),
            consumer = %contract.consumer.name,
            provider = %contract.provider.name,
            interactions = contract.interaction_count(),
            verifier = self.verifier.name(),
            "Verifying contract"
        );

        let result = self.verifier.verify(contract, service_address).await;
        match &result {
            Ok(()) => info!(file = %contract.file_name(), "All interactions verified"),
            Err(err) => warn!(file = %contract.file_name(), error = %err, "Verification failed"),
        }
        result
    }

    /// Verify every contract file in `directory`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the directory exists but cannot be listed.
    pub async fn run(
        &self,
        directory: &Path,
        service_address: &str,
    ) -> Result<VerificationOutcome, ContractError> {
        let files = discover_contract_files(directory)?;
        if files.is_empty() {
            warn!(directory = %directory.display(), "No contract files found");
            return Ok(VerificationOutcome::skipped());
        }
        info!(count = files.len(), directory = %directory.display(), "Found contract files");

        let mut outcome = VerificationOutcome::new();
        for path in &files {
            let entry = match load_contract_summary(path) {
                Ok(contract) => {
                    let result = self.verify_against(service_address, &contract).await;
                    FileVerification::from_result(&contract, result)
                }
                Err(err) => {
                    warn!(file = %path.display(), error = %err, "Contract is invalid, not verifying it");
                    FileVerification::invalid(&err)
                }
            };
            outcome.record(entry);
        }

        info!(
            status = ?outcome.status(),
            passed = outcome.passed_count(),
            failed = outcome.failed_count(),
            "Verification finished"
        );
        Ok(outcome)
    }
}

impl std::fmt::Debug for VerificationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationOrchestrator")
            .field("verifier", &self.verifier.name())
            .finish()
    }
}
