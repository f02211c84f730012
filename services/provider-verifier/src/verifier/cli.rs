//! Verification through the Pact reference verifier executable.

use async_trait::async_trait;
use harness_pact::{ContractFile, ContractVerifier, VerifierError};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;
use url::Url;

/// Marks the start of the failure section in the verifier's report.
const FAILURES_MARKER: &str = "Failures:";

/// Exit status the verifier uses for "interactions did not match".
const MISMATCH_EXIT_CODE: i32 = 1;

/// Runs `pact_verifier_cli` once per contract file.
#[derive(Debug, Clone)]
pub struct CliVerifier {
    program: String,
    provider_name: String,
    timeout: Duration,
}

impl CliVerifier {
    /// Create a verifier running `program` for `provider_name`.
    #[must_use]
    pub fn new(program: impl Into<String>, provider_name: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            provider_name: provider_name.into(),
            timeout: Duration::from_secs(300),
        }
    }

    /// Set the upper bound on one verifier run.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Command-line arguments for verifying `contract_path` against
    /// `service_address`.
    ///
    /// # Errors
    ///
    /// Returns [`VerifierError::Unavailable`] if the address is not an
    /// absolute http(s) URL with a host.
    pub fn arguments(
        &self,
        contract_path: &Path,
        service_address: &str,
    ) -> Result<Vec<String>, VerifierError> {
        let url = Url::parse(service_address).map_err(|e| {
            VerifierError::unavailable(format!("invalid service address '{service_address}': {e}"))
        })?;
        let host = url.host_str().ok_or_else(|| {
            VerifierError::unavailable(format!("service address '{service_address}' has no host"))
        })?;
        let port = url.port_or_known_default().ok_or_else(|| {
            VerifierError::unavailable(format!("service address '{service_address}' has no port"))
        })?;

        let mut args = vec![
            "--file".to_string(),
            contract_path.display().to_string(),
            "--hostname".to_string(),
            host.to_string(),
            "--port".to_string(),
            port.to_string(),
            "--provider-name".to_string(),
            self.provider_name.clone(),
            // Reports end up in verdict detail and the banner.
            "--no-colour".to_string(),
        ];
        if url.scheme() == "https" {
            args.extend(["--transport".to_string(), "https".to_string()]);
        }
        let base_path = url.path().trim_end_matches('/');
        if !base_path.is_empty() {
            args.extend(["--base-path".to_string(), base_path.to_string()]);
        }
        Ok(args)
    }
}

#[async_trait]
impl ContractVerifier for CliVerifier {
    fn name(&self) -> &str {
        &self.program
    }

    async fn verify(
        &self,
        contract: &ContractFile,
        service_address: &str,
    ) -> Result<(), VerifierError> {
        let args = self.arguments(&contract.path, service_address)?;
        debug!(program = %self.program, ?args, "Running Pact verifier");

        let mut command = Command::new(&self.program);
        command.args(&args).stdin(Stdio::null()).kill_on_drop(true);
        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                VerifierError::unavailable(format!(
                    "{} did not finish within {}s",
                    self.program,
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| VerifierError::unavailable(format!("failed to run {}: {e}", self.program)))?;

        if output.status.success() {
            return Ok(());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        match output.status.code() {
            Some(MISMATCH_EXIT_CODE) => {
                let report = failure_section(&stdout);
                let detail = if report.trim().is_empty() {
                    stderr.trim().to_string()
                } else {
                    report.trim().to_string()
                };
                Err(VerifierError::mismatch(failed_interactions(contract, report), detail))
            }
            _ => Err(VerifierError::unavailable(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                last_line(&stderr).or_else(|| last_line(&stdout)).unwrap_or("no output")
            ))),
        }
    }
}

/// Text from the failure marker on, or the whole report if there is none.
fn failure_section(stdout: &str) -> &str {
    stdout
        .find(FAILURES_MARKER)
        .map_or(stdout, |start| &stdout[start..])
}

/// Contract interactions the report mentions, in contract order.
fn failed_interactions(contract: &ContractFile, report: &str) -> Vec<String> {
    contract
        .interactions
        .iter()
        .map(|interaction| interaction.description.as_str())
        .filter(|description| report.contains(description))
        .map(ToString::to_string)
        .collect()
}

fn last_line(text: &str) -> Option<&str> {
    text.lines().rev().map(str::trim).find(|line| !line.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use harness_pact::{InteractionSummary, Participant};
    use std::path::PathBuf;

    fn contract() -> ContractFile {
        ContractFile {
            path: PathBuf::from("pacts/risk-dashboard-RiskAlgoService.json"),
            consumer: Participant::new("risk-dashboard"),
            provider: Participant::new("RiskAlgoService"),
            interactions: vec![
                InteractionSummary {
                    description: "a health check".to_string(),
                    method: "GET".to_string(),
                    path: "/health".to_string(),
                },
                InteractionSummary {
                    description: "a request for the risk score of portfolio 42".to_string(),
                    method: "GET".to_string(),
                    path: "/risk/score/42".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_arguments_for_plain_http() {
        let verifier = CliVerifier::new("pact_verifier_cli", "RiskAlgoService");
        let args = verifier
            .arguments(Path::new("pacts/a.json"), "http://localhost:7001")
            .unwrap();

        assert_eq!(
            args,
            vec![
                "--file",
                "pacts/a.json",
                "--hostname",
                "localhost",
                "--port",
                "7001",
                "--provider-name",
                "RiskAlgoService",
                "--no-colour",
            ]
        );
    }

    #[test]
    fn test_arguments_for_https_with_base_path() {
        let verifier = CliVerifier::new("pact_verifier_cli", "RiskAlgoService");
        let args = verifier
            .arguments(Path::new("a.json"), "https://risk.internal/api/v1/")
            .unwrap();

        assert!(args.windows(2).any(|w| w == ["--port", "443"]));
        assert!(args.windows(2).any(|w| w == ["--transport", "https"]));
        assert!(args.windows(2).any(|w| w == ["--base-path", "/api/v1"]));
    }

    #[test]
    fn test_invalid_address_is_unavailable() {
        let verifier = CliVerifier::new("pact_verifier_cli", "RiskAlgoService");
        let err = verifier.arguments(Path::new("a.json"), "localhost").unwrap_err();
        assert!(matches!(err, VerifierError::Unavailable(_)));
    }

    #[test]
    fn test_failed_interactions_follow_contract_order() {
        let report = "Verifying a pact between risk-dashboard and RiskAlgoService\n\
                      a health check (OK)\n\
                      Failures:\n\
                      1) Verifying a request for the risk score of portfolio 42\n\
                         expected status 200 but was 500\n";

        let section = failure_section(report);
        assert!(section.starts_with(FAILURES_MARKER));
        assert_eq!(
            failed_interactions(&contract(), section),
            vec!["a request for the risk score of portfolio 42"]
        );
    }

    #[test]
    fn test_report_without_marker_is_used_whole() {
        let report = "a health check: status mismatch";
        assert_eq!(failure_section(report), report);
        assert_eq!(failed_interactions(&contract(), report), vec!["a health check"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_executable_is_unavailable() {
        let verifier = CliVerifier::new("/nonexistent/pact_verifier_cli", "RiskAlgoService");
        let err = verifier
            .verify(&contract(), "http://localhost:7001")
            .await
            .unwrap_err();
        assert!(matches!(err, VerifierError::Unavailable(_)), "{err}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_codes_map_to_errors() {
        assert!(CliVerifier::new("true", "RiskAlgoService")
            .verify(&contract(), "http://localhost:7001")
            .await
            .is_ok());

        let err = CliVerifier::new("false", "RiskAlgoService")
            .verify(&contract(), "http://localhost:7001")
            .await
            .unwrap_err();
        assert!(matches!(err, VerifierError::Mismatch(_)), "{err}");
    }
}
