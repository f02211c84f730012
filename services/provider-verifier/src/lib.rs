//! Provider-side Pact contract verification harness.
//!
//! Starts (or finds) the provider under test, replays every consumer
//! contract in a directory against it through a Pact verifier, and reports
//! an aggregate pass / fail / skip outcome.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod harness;
pub mod health;
pub mod orchestrator;
pub mod report;
pub mod supervisor;
pub mod verifier;

// Re-exports for convenience
pub use config::{Config, ConfigError, ServiceSpec, VerifierBackend};
pub use error::HarnessError;
pub use harness::{check_contracts, verify_provider};
pub use harness_pact::{
    ContractVerifier, OverallStatus, VerificationOutcome, VerifierError, discover_contract_files,
    load_contract_summary,
};
pub use orchestrator::VerificationOrchestrator;
pub use supervisor::{Liveness, Ownership, ProcessSupervisor, ServiceHandle};
pub use verifier::build_verifier;
