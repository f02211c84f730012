//! Contract fixtures.
//!
//! [`PactFixture`] builds Pact documents in the shape consumer test suites
//! publish; [`ContractDir`] is a temporary contract directory to write them to.

use serde_json::{Value, json};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// One recorded interaction of a fixture contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureInteraction {
    /// Interaction description
    pub description: String,
    /// Request method
    pub method: String,
    /// Request path
    pub path: String,
    /// Expected response status
    pub status: u16,
    /// Expected response body
    pub body: Option<Value>,
}

/// Builder for a Pact contract document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PactFixture {
    /// Consumer name
    pub consumer: String,
    /// Provider name
    pub provider: String,
    /// Interactions
    pub interactions: Vec<FixtureInteraction>,
}

impl PactFixture {
    /// Create a fixture with no interactions.
    #[must_use]
    pub fn new(consumer: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            consumer: consumer.into(),
            provider: provider.into(),
            interactions: Vec::new(),
        }
    }

    /// Sample contract between the risk dashboard and the risk algorithm service.
    #[must_use]
    pub fn risk_dashboard() -> Self {
        Self::new("risk-dashboard", "RiskAlgoService")
            .interaction("a health check", "GET", "/health", 200)
            .interaction_with_body(
                "a request for the risk score of portfolio 42",
                "GET",
                "/risk/score/42",
                200,
                json!({"portfolioId": 42, "score": 0.73}),
            )
    }

    /// Add an interaction without a response body.
    #[must_use]
    pub fn interaction(
        mut self,
        description: impl Into<String>,
        method: impl Into<String>,
        path: impl Into<String>,
        status: u16,
    ) -> Self {
        self.interactions.push(FixtureInteraction {
            description: description.into(),
            method: method.into(),
            path: path.into(),
            status,
            body: None,
        });
        self
    }

    /// Add an interaction with a JSON response body.
    #[must_use]
    pub fn interaction_with_body(
        mut self,
        description: impl Into<String>,
        method: impl Into<String>,
        path: impl Into<String>,
        status: u16,
        body: Value,
    ) -> Self {
        self.interactions.push(FixtureInteraction {
            description: description.into(),
            method: method.into(),
            path: path.into(),
            status,
            body: Some(body),
        });
        self
    }

    /// Conventional file name: `{consumer}-{provider}.json`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}-{}.json", self.consumer, self.provider)
    }

    /// Render the Pact document.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let interactions: Vec<Value> = self
            .interactions
            .iter()
            .map(|interaction| {
                let mut response = json!({ "status": interaction.status });
                if let Some(body) = &interaction.body {
                    response["headers"] = json!({ "Content-Type": "application/json" });
                    response["body"] = body.clone();
                }
                json!({
                    "description": interaction.description,
                    "request": {
                        "method": interaction.method,
                        "path": interaction.path,
                    },
                    "response": response,
                })
            })
            .collect();

        json!({
            "consumer": { "name": self.consumer },
            "provider": { "name": self.provider },
            "interactions": interactions,
            "metadata": { "pactSpecification": { "version": "3.0.0" } },
        })
    }
}

/// Temporary contract directory, removed on drop.
#[derive(Debug)]
pub struct ContractDir {
    dir: TempDir,
}

impl ContractDir {
    /// Create an empty contract directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    /// Directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a fixture under its conventional file name.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_fixture(&self, fixture: &PactFixture) -> io::Result<PathBuf> {
        self.write_fixture_as(&fixture.file_name(), fixture)
    }

    /// Write a fixture under `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_fixture_as(&self, name: &str, fixture: &PactFixture) -> io::Result<PathBuf> {
        let contents = serde_json::to_string_pretty(&fixture.to_json())?;
        self.write_raw(name, &contents)
    }

    /// Write arbitrary contents under `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_raw(&self, name: &str, contents: &str) -> io::Result<PathBuf> {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents)?;
        Ok(path)
    }
}
