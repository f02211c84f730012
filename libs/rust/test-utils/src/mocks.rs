//! Verifier doubles for testing the orchestration without a Pact verifier.

use async_trait::async_trait;
use harness_pact::{ContractFile, ContractVerifier, VerifierError};
use reqwest::Method;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Verifier that returns pre-programmed results keyed by file name.
///
/// Files without a scripted result pass. Every call is recorded.
#[derive(Debug, Default, Clone)]
pub struct ScriptedVerifier {
    results: HashMap<String, Result<(), VerifierError>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl ScriptedVerifier {
    /// Create a verifier that passes every file.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the result for `file_name`.
    #[must_use]
    pub fn with_result(
        mut self,
        file_name: impl Into<String>,
        result: Result<(), VerifierError>,
    ) -> Self {
        self.results.insert(file_name.into(), result);
        self
    }

    /// File names passed to `verify`, in call order.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.read().await.clone()
    }
}

#[async_trait]
impl ContractVerifier for ScriptedVerifier {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn verify(
        &self,
        contract: &ContractFile,
        _service_address: &str,
    ) -> Result<(), VerifierError> {
        let file_name = contract.file_name();
        self.calls.write().await.push(file_name.clone());
        self.results.get(&file_name).cloned().unwrap_or(Ok(()))
    }
}

/// Verifier that replays each recorded request and compares only the status.
///
/// Stands in for a real Pact verifier in tests that run against a mock
/// provider; bodies and headers are not compared.
#[derive(Debug, Clone)]
pub struct StatusReplayVerifier {
    client: reqwest::Client,
}

impl StatusReplayVerifier {
    /// Create a replay verifier.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for StatusReplayVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContractVerifier for StatusReplayVerifier {
    fn name(&self) -> &str {
        "status-replay"
    }

    async fn verify(
        &self,
        contract: &ContractFile,
        service_address: &str,
    ) -> Result<(), VerifierError> {
        let raw = tokio::fs::read(&contract.path)
            .await
            .map_err(|err| VerifierError::unavailable(err.to_string()))?;
        let document: Value = serde_json::from_slice(&raw)
            .map_err(|err| VerifierError::unavailable(err.to_string()))?;
        let interactions = document["interactions"].as_array().cloned().unwrap_or_default();

        let mut failed = Vec::new();
        let mut detail = Vec::new();
        for interaction in &interactions {
            let description = interaction["description"].as_str().unwrap_or("Unknown");
            let method = interaction["request"]["method"].as_str().unwrap_or("GET");
            let path = interaction["request"]["path"].as_str().unwrap_or("/");
            let expected = interaction["response"]["status"].as_u64().unwrap_or(200);

            let method = Method::from_bytes(method.to_uppercase().as_bytes())
                .map_err(|err| VerifierError::unavailable(err.to_string()))?;
            let url = format!("{}{}", service_address.trim_end_matches('/'), path);

            match self.client.request(method.clone(), &url).send().await {
                Ok(response) if u64::from(response.status().as_u16()) == expected => {}
                Ok(response) => {
                    failed.push(description.to_string());
                    detail.push(format!(
                        "{method} {path} ({description}): expected status {expected} but was {}",
                        response.status().as_u16()
                    ));
                }
                Err(err) => {
                    failed.push(description.to_string());
                    detail.push(format!("{method} {path} ({description}): request failed: {err}"));
                }
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(VerifierError::mismatch(failed, detail.join("\n")))
        }
    }
}
