//! Shared test utilities for the provider verification harness.
//!
//! This crate provides:
//! - Pact contract fixtures and temporary contract directories
//! - Verifier doubles implementing `ContractVerifier`
//! - Proptest generators for contract data

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod mocks;

pub use fixtures::{ContractDir, FixtureInteraction, PactFixture};
pub use generators::*;
pub use mocks::{ScriptedVerifier, StatusReplayVerifier};
