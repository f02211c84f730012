//! Provider verification as a cargo test.
//!
//! Reads the same environment as the `provider-verifier` binary. Skips when
//! the contract directory holds no contracts, so the suite stays green
//! until consumer tests have generated some.
//!
//! Run with: `PACTS_DIR=../../pacts cargo test -p provider-verifier --test provider_verification`

use provider_verifier::{
    Config, build_verifier, check_contracts, discover_contract_files, report, verify_provider,
};
use rust_common::init_tracing;

#[tokio::test]
async fn provider_satisfies_consumer_contracts() {
    let config = Config::from_env().unwrap();
    init_tracing(&config.tracing_config());

    if discover_contract_files(&config.pacts_dir).unwrap().is_empty() {
        println!(
            "No contract files found in {} - run consumer tests first to generate them",
            config.pacts_dir.display()
        );
        return;
    }

    let validation = check_contracts(&config).unwrap();
    println!("{}", report::render_validation(&validation));
    assert!(validation.is_valid(), "malformed contract files, see output above");

    let verifier = build_verifier(&config).unwrap();
    let outcome = verify_provider(&config, verifier).await.unwrap();
    println!("{}", report::render(&config.provider_name, &outcome));

    assert!(outcome.is_success(), "{}", outcome.reason());
}
