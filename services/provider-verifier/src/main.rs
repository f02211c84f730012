//! Provider verification entry point.
//!
//! Configuration comes from the environment only. Exits 0 when every
//! contract verifies (or none exist outside strict mode), 1 otherwise.

use anyhow::Context;
use provider_verifier::{Config, build_verifier, check_contracts, report, verify_provider};
use rust_common::{LogFormat, init_tracing};
use std::process::ExitCode;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            error!(error = %format!("{err:#}"), "Provider verification aborted");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<u8> {
    let config = Config::from_env().context("invalid configuration")?;
    init_tracing(&config.tracing_config());

    info!(
        provider = %config.provider_name,
        address = %config.service.base_address(),
        pacts_dir = %config.pacts_dir.display(),
        verifier = %config.verifier,
        strict = config.strict,
        "Starting provider verification"
    );

    let validation = check_contracts(&config).context("failed to inspect contract directory")?;
    println!("{}", report::render_validation(&validation));

    let verifier = build_verifier(&config)?;
    let outcome = verify_provider(&config, verifier)
        .await
        .context("provider verification could not run")?;

    if outcome.is_skipped() {
        warn!(strict = config.strict, "No contracts were verified");
    }
    if config.log_format == LogFormat::Json {
        info!(report = %report::to_json(&outcome)?, "Verification report");
    }
    println!("{}", report::render(&config.provider_name, &outcome));

    Ok(outcome.exit_code(config.strict))
}
