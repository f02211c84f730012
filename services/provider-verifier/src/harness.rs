//! A complete verification run: bring the provider up, verify, tear down.

use crate::config::Config;
use crate::error::HarnessError;
use crate::orchestrator::VerificationOrchestrator;
use crate::supervisor::ProcessSupervisor;
use harness_pact::{ContractVerifier, ValidationReport, VerificationOutcome, validate_directory};
use std::sync::Arc;
use tracing::{info, warn};

/// Verify every contract in `config.pacts_dir` against the provider.
///
/// The provider is released on every path once it is running, including
/// when the contract directory cannot be listed.
///
/// # Errors
///
/// Returns an error if the provider cannot be started or the contract
/// directory cannot be listed. Per-file failures are part of the outcome.
pub async fn verify_provider(
    config: &Config,
    verifier: Arc<dyn ContractVerifier>,
) -> Result<VerificationOutcome, HarnessError> {
    let supervisor = ProcessSupervisor::new(config.service.clone())?;
    let mut handle = supervisor.ensure_running().await?;
    info!(address = %handle.address(), ownership = ?handle.ownership(), "Provider ready");

    let orchestrator = VerificationOrchestrator::new(verifier);
    let result = orchestrator.run(&config.pacts_dir, handle.address()).await;

    if matches!(&result, Ok(outcome) if outcome.failed_count() > 0) {
        for line in handle.output_tail().await {
            info!(target: "provider_output", "{line}");
        }
    }

    supervisor.release(&mut handle).await;
    result.map_err(HarnessError::from)
}

/// Check contract structure without a provider and log the findings.
///
/// # Errors
///
/// Returns an error if the contract directory cannot be listed.
pub fn check_contracts(config: &Config) -> Result<ValidationReport, HarnessError> {
    let report = validate_directory(&config.pacts_dir)?;
    if !report.contracts_found() {
        warn!(
            directory = %config.pacts_dir.display(),
            "No contract files found, run consumer tests first to generate them"
        );
        return Ok(report);
    }

    for contract in report.valid() {
        info!(
            file = %contract.file_name(),
            consumer = %contract.consumer.name,
            provider = %contract.provider.name,
            interactions = contract.interaction_count(),
            "Contract is well formed"
        );
        if contract.provider.name != config.provider_name {
            warn!(
                file = %contract.file_name(),
                expected = %config.provider_name,
                actual = %contract.provider.name,
                "Contract names a different provider"
            );
        }
    }
    for error in report.invalid() {
        if error.is_structural() {
            warn!(error = %error, "Contract is malformed");
        } else {
            warn!(error = %error, "Contract could not be read");
        }
    }
    Ok(report)
}
