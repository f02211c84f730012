//! In-process verification with the `pact_verifier` crate.

use async_trait::async_trait;
use harness_pact::{ContractFile, ContractVerifier, VerifierError};
use pact_verifier::callback_executors::{HttpRequestProviderStateExecutor, NullRequestFilterExecutor};
use pact_verifier::{FilterInfo, PactSource, ProviderInfo, VerificationOptions, verify_provider_async};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Verifies contracts with the Pact reference implementation, in-process.
#[derive(Debug, Clone)]
pub struct NativeVerifier {
    provider_name: String,
    request_timeout: Duration,
}

impl NativeVerifier {
    /// Create a verifier for `provider_name`.
    #[must_use]
    pub fn new(provider_name: impl Into<String>) -> Self {
        Self {
            provider_name: provider_name.into(),
            request_timeout: Duration::from_secs(5),
        }
    }

    /// Set the timeout of each replayed request.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[allow(deprecated)]
    fn provider_info(&self, service_address: &str) -> Result<ProviderInfo, VerifierError> {
        let url = Url::parse(service_address).map_err(|e| {
            VerifierError::unavailable(format!("invalid service address '{service_address}': {e}"))
        })?;
        let host = url.host_str().ok_or_else(|| {
            VerifierError::unavailable(format!("service address '{service_address}' has no host"))
        })?;

        Ok(ProviderInfo {
            name: self.provider_name.clone(),
            host: host.to_string(),
            port: url.port_or_known_default(),
            path: url.path().to_string(),
            protocol: url.scheme().to_string(),
            ..Default::default()
        })
    }
}

#[async_trait]
impl ContractVerifier for NativeVerifier {
    fn name(&self) -> &str {
        "pact_verifier"
    }

    async fn verify(
        &self,
        contract: &ContractFile,
        service_address: &str,
    ) -> Result<(), VerifierError> {
        let provider = self.provider_info(service_address)?;
        let source = PactSource::File(contract.path.display().to_string());
        let request_timeout = u64::try_from(self.request_timeout.as_millis()).unwrap_or(u64::MAX);
        debug!(file = %contract.path.display(), "Running in-process Pact verifier");

        // The verifier future is not Send; drive it on a blocking thread.
        let runtime = tokio::runtime::Handle::current();
        let execution = tokio::task::spawn_blocking(move || {
            runtime.block_on(async move {
                let options = VerificationOptions::<NullRequestFilterExecutor> {
                    request_timeout,
                    coloured_output: false,
                    ..Default::default()
                };
                let state_executor = Arc::new(HttpRequestProviderStateExecutor::default());
                verify_provider_async(
                    provider,
                    vec![source],
                    FilterInfo::None,
                    vec![],
                    &options,
                    None,
                    &state_executor,
                    None,
                )
                .await
            })
        })
        .await
        .map_err(|e| VerifierError::unavailable(format!("verifier task failed: {e}")))?
        .map_err(|e| VerifierError::unavailable(e.to_string()))?;

        if execution.result {
            return Ok(());
        }

        let failed = execution
            .errors
            .iter()
            .map(|(description, _)| description.clone())
            .collect();
        Err(VerifierError::mismatch(failed, execution.output.join("\n")))
    }
}
