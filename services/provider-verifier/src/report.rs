//! Human-readable and JSON renderings of a verification pass.

use chrono::SecondsFormat;
use harness_pact::{FileVerdict, OverallStatus, ValidationReport, VerificationOutcome};

const RULE_WIDTH: usize = 60;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// Render the summary banner printed at the end of a run.
#[must_use]
pub fn render(provider_name: &str, outcome: &VerificationOutcome) -> String {
    let mut lines = vec![
        rule(),
        format!("Provider verification: {provider_name}"),
        format!(
            "Verified at: {}",
            outcome.verified_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        ),
        rule(),
    ];

    for entry in outcome.entries() {
        let label = match entry.verdict {
            FileVerdict::Passed => "PASS",
            FileVerdict::Mismatch { .. } => "FAIL",
            FileVerdict::Invalid { .. } => "INVALID",
            FileVerdict::VerifierError { .. } => "ERROR",
        };
        let parties = match (&entry.consumer, &entry.provider) {
            (Some(consumer), Some(provider)) => format!(
                " ({consumer} -> {provider}, {} interaction(s))",
                entry.interaction_count
            ),
            _ => String::new(),
        };
        lines.push(format!("{label:<8}{}{parties}", entry.file_name()));
        if let Some(detail) = entry.detail() {
            lines.extend(detail.lines().map(|line| format!("{:8}{line}", "")));
        }
    }

    if !outcome.entries().is_empty() {
        lines.push(rule());
    }
    let verdict = match outcome.status() {
        OverallStatus::Passed => "PROVIDER VERIFICATION PASSED",
        OverallStatus::Failed => "PROVIDER VERIFICATION FAILED",
        OverallStatus::Skipped => "PROVIDER VERIFICATION SKIPPED",
    };
    lines.push(verdict.to_string());
    lines.push(outcome.reason());
    lines.push(rule());
    lines.join("\n")
}

/// Render the structural check of a contract directory.
#[must_use]
pub fn render_validation(report: &ValidationReport) -> String {
    if !report.contracts_found() {
        return format!(
            "No contract files found in {} - run consumer tests first to generate them",
            report.directory.display()
        );
    }

    let mut lines = vec![format!(
        "Found {} contract file(s) in {}",
        report.results.len(),
        report.directory.display()
    )];
    for result in &report.results {
        match result {
            Ok(contract) => {
                lines.push(format!("  {}", contract.file_name()));
                lines.push(format!("    Consumer: {}", contract.consumer.name));
                lines.push(format!("    Provider: {}", contract.provider.name));
                lines.push(format!("    Interactions: {}", contract.interaction_count()));
                lines.extend(
                    contract
                        .interactions
                        .iter()
                        .map(|interaction| format!("      - {interaction}")),
                );
            }
            Err(err) => lines.push(format!("  {err}")),
        }
    }
    lines.join("\n")
}

/// Serialize the outcome for machine consumption.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json(outcome: &VerificationOutcome) -> serde_json::Result<String> {
    serde_json::to_string(&serde_json::json!({
        "status": outcome.status(),
        "reason": outcome.reason(),
        "verified_at": outcome.verified_at,
        "files": outcome.entries(),
    }))
}
