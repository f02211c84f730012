//! Structural validation of a contract directory.
//!
//! Reads every discovered file without talking to the provider, so malformed
//! or empty contracts are reported before any verification is attempted.

use crate::contract::{ContractFile, load_contract_summary};
use crate::discovery::discover_contract_files;
use crate::error::ContractError;
use std::path::{Path, PathBuf};

/// Validation result for every contract file in a directory.
#[derive(Debug)]
pub struct ValidationReport {
    /// Directory that was scanned
    pub directory: PathBuf,
    /// Per-file result in discovery order
    pub results: Vec<Result<ContractFile, ContractError>>,
}

impl ValidationReport {
    /// Check whether any contract files were found.
    #[must_use]
    pub fn contracts_found(&self) -> bool {
        !self.results.is_empty()
    }

    /// Check whether contracts were found and all of them are well formed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.contracts_found() && self.results.iter().all(Result::is_ok)
    }

    /// Successfully loaded contracts.
    pub fn valid(&self) -> impl Iterator<Item = &ContractFile> {
        self.results.iter().filter_map(|result| result.as_ref().ok())
    }

    /// Files that failed validation.
    pub fn invalid(&self) -> impl Iterator<Item = &ContractError> {
        self.results.iter().filter_map(|result| result.as_ref().err())
    }

    /// Total number of interactions across valid contracts.
    #[must_use]
    pub fn interaction_count(&self) -> usize {
        self.valid().map(ContractFile::interaction_count).sum()
    }
}

/// Discover and load every contract file in `directory`.
///
/// # Errors
///
/// Returns [`ContractError::Io`] only if the directory cannot be listed;
/// per-file problems are collected in the report.
pub fn validate_directory(directory: &Path) -> Result<ValidationReport, ContractError> {
    let results = discover_contract_files(directory)?
        .iter()
        .map(|path| load_contract_summary(path))
        .collect();

    Ok(ValidationReport {
        directory: directory.to_path_buf(),
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const VALID: &str = r#"{
        "consumer": {"name": "risk-dashboard"},
        "provider": {"name": "RiskAlgoService"},
        "interactions": [
            {"description": "health", "request": {"method": "GET", "path": "/health"}, "response": {"status": 200}},
            {"description": "score", "request": {"method": "POST", "path": "/risk/score"}, "response": {"status": 200}}
        ]
    }"#;

    #[test]
    fn test_report_collects_every_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a-valid.json"), VALID).unwrap();
        fs::write(
            dir.path().join("b-empty.json"),
            r#"{"consumer": {"name": "c"}, "provider": {"name": "p"}, "interactions": []}"#,
        )
        .unwrap();
        fs::write(dir.path().join("c-broken.json"), "{").unwrap();

        let report = validate_directory(dir.path()).unwrap();

        assert!(report.contracts_found());
        assert!(!report.is_valid());
        assert_eq!(report.results.len(), 3);
        assert_eq!(report.valid().count(), 1);
        assert_eq!(report.interaction_count(), 2);

        let invalid: Vec<_> = report.invalid().collect();
        assert!(matches!(invalid[0], ContractError::EmptyContract { .. }));
        assert!(matches!(invalid[1], ContractError::MalformedContract { .. }));
    }

    #[test]
    fn test_empty_directory_is_not_valid() {
        let dir = tempfile::tempdir().unwrap();
        let report = validate_directory(dir.path()).unwrap();
        assert!(!report.contracts_found());
        assert!(!report.is_valid());
    }

    #[test]
    fn test_all_valid() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("one.json"), VALID).unwrap();
        fs::write(dir.path().join("two.json"), VALID).unwrap();

        let report = validate_directory(dir.path()).unwrap();
        assert!(report.is_valid());
        assert_eq!(report.interaction_count(), 4);
    }
}
