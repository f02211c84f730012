//! Pact contract handling for provider verification.
//!
//! Provides contract discovery, summary loading with structural validation,
//! the [`ContractVerifier`] seam behind which the actual Pact verifier sits,
//! and the per-file and aggregate outcome types.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod contract;
pub mod discovery;
pub mod error;
pub mod validation;
pub mod verification;
pub mod verifier;

pub use contract::{
    ContractFile, InteractionSummary, Participant, load_contract_summary, parse_contract_summary,
};
pub use discovery::{discover_contract_files, is_contract_file};
pub use error::ContractError;
pub use validation::{ValidationReport, validate_directory};
pub use verification::{FileVerdict, FileVerification, OverallStatus, VerificationOutcome};
pub use verifier::{ContractVerifier, VerificationMismatch, VerifierError};
