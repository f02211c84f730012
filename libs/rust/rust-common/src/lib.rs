//! Plumbing shared by the verification harness crates.
//!
//! Readiness probing is the main consumer: [`build_http_client`] makes the
//! check client, [`PollPolicy`] drives it against an attempt budget and
//! [`PlatformError`] says whether a failed check reached anything at all.
//! [`init_tracing`] installs the process-wide subscriber.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod http;
pub mod poll;
pub mod tracing_config;

pub use error::PlatformError;
pub use http::{HttpConfig, build_http_client};
pub use poll::{PollConfig, PollExhausted, PollPolicy};
pub use tracing_config::{LogFormat, TracingConfig, init_tracing};
