//! Per-file verdicts and the aggregate verification outcome.

use crate::contract::ContractFile;
use crate::error::{ContractError, file_label};
use crate::verifier::VerifierError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// Result of verifying a single contract file.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum FileVerdict {
    /// Every interaction matched
    Passed,
    /// The verifier reported mismatching interactions
    Mismatch {
        /// Descriptions of failing interactions
        failed_interactions: Vec<String>,
        /// Verifier output
        detail: String,
    },
    /// The file failed structural validation and was not verified
    Invalid {
        /// Validation error
        reason: String,
    },
    /// The verifier could not run against this file
    VerifierError {
        /// Why the verifier failed
        reason: String,
    },
}

/// One entry of the verification outcome.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FileVerification {
    /// Contract file
    pub file: PathBuf,
    /// Consumer name, when the file could be loaded
    pub consumer: Option<String>,
    /// Provider name, when the file could be loaded
    pub provider: Option<String>,
    /// Number of interactions, when the file could be loaded
    pub interaction_count: usize,
    /// Verdict
    pub verdict: FileVerdict,
}

impl FileVerification {
    /// Build an entry from a verifier result.
    #[must_use]
    pub fn from_result(contract: &ContractFile, result: Result<(), VerifierError>) -> Self {
        let verdict = match result {
            Ok(()) => FileVerdict::Passed,
            Err(VerifierError::Mismatch(mismatch)) => FileVerdict::Mismatch {
                failed_interactions: mismatch.failed_interactions,
                detail: mismatch.detail,
            },
            Err(VerifierError::Unavailable(reason)) => FileVerdict::VerifierError { reason },
        };

        Self {
            file: contract.path.clone(),
            consumer: Some(contract.consumer.name.clone()),
            provider: Some(contract.provider.name.clone()),
            interaction_count: contract.interaction_count(),
            verdict,
        }
    }

    /// Build an entry for a file that failed to load.
    #[must_use]
    pub fn invalid(error: &ContractError) -> Self {
        Self {
            file: error.path().to_path_buf(),
            consumer: None,
            provider: None,
            interaction_count: 0,
            verdict: FileVerdict::Invalid {
                reason: error.to_string(),
            },
        }
    }

    /// Check whether the file verified.
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self.verdict, FileVerdict::Passed)
    }

    /// File name for display.
    #[must_use]
    pub fn file_name(&self) -> String {
        file_label(&self.file)
    }

    /// Human-readable failure detail, `None` for passed files.
    #[must_use]
    pub fn detail(&self) -> Option<String> {
        match &self.verdict {
            FileVerdict::Passed => None,
            FileVerdict::Mismatch {
                failed_interactions,
                detail,
            } => {
                let mut text = if failed_interactions.is_empty() {
                    "Provider did not satisfy the contract".to_string()
                } else {
                    format!("Failed interactions: {}", failed_interactions.join("; "))
                };
                if !detail.trim().is_empty() {
                    text.push('\n');
                    text.push_str(detail.trim_end());
                }
                Some(text)
            }
            FileVerdict::Invalid { reason } => Some(format!("Invalid contract: {reason}")),
            FileVerdict::VerifierError { reason } => Some(format!("Verifier error: {reason}")),
        }
    }
}

/// Overall status of a verification pass.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    /// Every discovered contract verified
    Passed,
    /// At least one contract failed
    Failed,
    /// No contracts were found
    Skipped,
}

/// Aggregate result across all contract files of one pass.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationOutcome {
    entries: Vec<FileVerification>,
    /// When the pass started
    pub verified_at: DateTime<Utc>,
}

impl VerificationOutcome {
    /// Start an empty outcome.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            verified_at: Utc::now(),
        }
    }

    /// Outcome of a pass that found no contracts.
    #[must_use]
    pub fn skipped() -> Self {
        Self::new()
    }

    /// Append the result for one file.
    pub fn record(&mut self, entry: FileVerification) {
        self.entries.push(entry);
    }

    /// All entries in verification order.
    #[must_use]
    pub fn entries(&self) -> &[FileVerification] {
        &self.entries
    }

    /// Entries that did not pass.
    pub fn failures(&self) -> impl Iterator<Item = &FileVerification> {
        self.entries.iter().filter(|entry| !entry.is_passed())
    }

    /// Overall status: skipped without entries, passed iff every entry passed.
    #[must_use]
    pub fn status(&self) -> OverallStatus {
        if self.entries.is_empty() {
            OverallStatus::Skipped
        } else if self.entries.iter().all(FileVerification::is_passed) {
            OverallStatus::Passed
        } else {
            OverallStatus::Failed
        }
    }

    /// Check whether the pass succeeded. A skipped pass is not a success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status() == OverallStatus::Passed
    }

    /// Check whether no contracts were found.
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.status() == OverallStatus::Skipped
    }

    /// Number of files that passed.
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_passed()).count()
    }

    /// Number of files that failed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }

    /// One-line explanation of the status.
    #[must_use]
    pub fn reason(&self) -> String {
        match self.status() {
            OverallStatus::Skipped => {
                "No contract files found - run consumer tests first to generate them".to_string()
            }
            OverallStatus::Passed => {
                format!("All {} contract file(s) verified", self.entries.len())
            }
            OverallStatus::Failed => {
                let failed: Vec<_> = self.failures().map(FileVerification::file_name).collect();
                format!("Verification failed: {}", failed.join(", "))
            }
        }
    }

    /// Process exit code for this outcome. A skipped pass fails only in
    /// strict mode.
    #[must_use]
    pub fn exit_code(&self, strict: bool) -> u8 {
        match self.status() {
            OverallStatus::Passed => 0,
            OverallStatus::Skipped if !strict => 0,
            OverallStatus::Skipped | OverallStatus::Failed => 1,
        }
    }
}

impl Default for VerificationOutcome {
    fn default() -> Self {
        Self::new()
    }
}
