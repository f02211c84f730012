//! Pact contract summaries.
//!
//! Only the fields the harness reports on are read: participant names and
//! each interaction's description, method and path. Everything else in the
//! document belongs to the verifier and is ignored here.

use crate::error::{ContractError, file_label};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A participant in a contract (consumer or provider).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    /// Participant name
    pub name: String,
}

impl Participant {
    /// Create a new participant.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Reporting view of one recorded interaction.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InteractionSummary {
    /// Interaction description (`Unknown` when absent)
    pub description: String,
    /// HTTP method of the recorded request (`?` when absent)
    pub method: String,
    /// Path of the recorded request (`?` when absent)
    pub path: String,
}

impl fmt::Display for InteractionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.method, self.path, self.description)
    }
}

/// A loaded contract file.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ContractFile {
    /// Where the contract was read from
    pub path: PathBuf,
    /// Consumer participant
    pub consumer: Participant,
    /// Provider participant
    pub provider: Participant,
    /// Interactions in document order
    pub interactions: Vec<InteractionSummary>,
}

impl ContractFile {
    /// File name for display.
    #[must_use]
    pub fn file_name(&self) -> String {
        file_label(&self.path)
    }

    /// Number of interactions in the contract.
    #[must_use]
    pub fn interaction_count(&self) -> usize {
        self.interactions.len()
    }
}

#[derive(Deserialize)]
struct RawContract {
    #[serde(default)]
    consumer: Option<RawParticipant>,
    #[serde(default)]
    provider: Option<RawParticipant>,
    #[serde(default)]
    interactions: Option<Vec<RawInteraction>>,
}

#[derive(Deserialize)]
struct RawParticipant {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct RawInteraction {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    request: Option<RawRequest>,
}

#[derive(Deserialize)]
struct RawRequest {
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    path: Option<String>,
}

/// Load the reporting summary of a contract file.
///
/// # Errors
///
/// - [`ContractError::Io`] if the file cannot be read
/// - [`ContractError::MalformedContract`] if it is not a JSON object with
///   `consumer.name`, `provider.name` and an `interactions` array
/// - [`ContractError::EmptyContract`] if `interactions` is empty
pub fn load_contract_summary(path: &Path) -> Result<ContractFile, ContractError> {
    let bytes = std::fs::read(path).map_err(|source| ContractError::io(path, source))?;
    parse_contract_summary(path, &bytes)
}

/// Parse a contract summary from raw bytes. `path` is used for reporting only.
///
/// # Errors
///
/// Same as [`load_contract_summary`], minus I/O.
pub fn parse_contract_summary(path: &Path, bytes: &[u8]) -> Result<ContractFile, ContractError> {
    let raw: RawContract = serde_json::from_slice(bytes)
        .map_err(|err| ContractError::malformed(path, format!("Invalid JSON: {err}")))?;

    let consumer = participant(path, raw.consumer, "consumer")?;
    let provider = participant(path, raw.provider, "provider")?;
    let interactions = raw
        .interactions
        .ok_or_else(|| ContractError::malformed(path, "Missing 'interactions' field"))?;

    if interactions.is_empty() {
        return Err(ContractError::EmptyContract {
            path: path.to_path_buf(),
        });
    }

    let interactions = interactions
        .into_iter()
        .map(|interaction| {
            let (method, request_path) = interaction
                .request
                .map(|request| (request.method, request.path))
                .unwrap_or_default();
            InteractionSummary {
                description: interaction
                    .description
                    .unwrap_or_else(|| "Unknown".to_string()),
                method: method.unwrap_or_else(|| "?".to_string()),
                path: request_path.unwrap_or_else(|| "?".to_string()),
            }
        })
        .collect();

    Ok(ContractFile {
        path: path.to_path_buf(),
        consumer,
        provider,
        interactions,
    })
}

fn participant(
    path: &Path,
    raw: Option<RawParticipant>,
    field: &str,
) -> Result<Participant, ContractError> {
    let raw = raw.ok_or_else(|| ContractError::malformed(path, format!("Missing '{field}' field")))?;
    raw.name
        .map(Participant::new)
        .ok_or_else(|| ContractError::malformed(path, format!("Missing '{field}.name' field")))
}
