//! Shared proptest generators for contract tests.

use crate::fixtures::PactFixture;
use proptest::prelude::*;

/// Generate participant names.
pub fn participant_name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("risk-dashboard".to_string()),
        Just("RiskAlgoService".to_string()),
        Just("portfolio-ui".to_string()),
        "[a-z][a-z0-9-]{2,20}",
    ]
}

/// Request methods seen in consumer contracts.
pub fn http_method_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(&["GET", "POST", "PUT", "DELETE", "PATCH"][..]).prop_map(str::to_string)
}

/// Absolute request paths.
pub fn request_path_strategy() -> impl Strategy<Value = String> {
    "/[a-z][a-z0-9/-]{2,30}"
}

/// Status codes a contract may expect, success and failure alike.
pub fn http_status_code_strategy() -> impl Strategy<Value = u16> {
    prop::sample::select(&[200u16, 201, 204, 400, 404, 500][..])
}

/// Generate contract fixtures with 1 to 5 interactions.
pub fn pact_fixture_strategy() -> impl Strategy<Value = PactFixture> {
    (
        participant_name_strategy(),
        participant_name_strategy(),
        prop::collection::vec(
            (http_method_strategy(), request_path_strategy(), http_status_code_strategy()),
            1..=5,
        ),
    )
        .prop_map(|(consumer, provider, requests)| {
            requests.into_iter().enumerate().fold(
                PactFixture::new(consumer, provider),
                |fixture, (index, (method, path, status))| {
                    fixture.interaction(format!("interaction {index}"), method, path, status)
                },
            )
        })
}

/// Generate contract file names, some of them hidden or with other extensions.
pub fn directory_entry_strategy() -> impl Strategy<Value = String> {
    ("[a-z]{1,10}", prop_oneof![Just(""), Just(".")], prop_oneof![Just("json"), Just("txt")])
        .prop_map(|(stem, prefix, extension)| format!("{prefix}{stem}.{extension}"))
}
