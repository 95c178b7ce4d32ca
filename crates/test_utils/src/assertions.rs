//! Custom Test Assertions
//!
//! Assertion helpers for enrichment reports and store writes that print the
//! whole stage history on failure.

use core_kernel::ClaimId;
use domain_enrichment::{EnrichmentReport, EnrichmentStage, FraudResult, StoreWrite};

/// Asserts the exact ordered stage history of a report
pub fn assert_stages(report: &EnrichmentReport, expected: &[EnrichmentStage]) {
    assert_eq!(
        report.stages, expected,
        "Stage history mismatch for {}: error={:?}",
        report.claim_id, report.error
    );
}

/// Asserts a report ran all the way to `Done`
pub fn assert_enriched(report: &EnrichmentReport) {
    assert!(
        report.is_done(),
        "Expected {} to finish, stopped at {} (error={:?}, stages={:?})",
        report.claim_id,
        report.final_stage(),
        report.error,
        report.stages
    );
}

/// Asserts a report ended in `Errored` and returns its error text
pub fn assert_errored(report: &EnrichmentReport) -> &str {
    assert!(
        report.is_errored(),
        "Expected {} to error, stages={:?}",
        report.claim_id,
        report.stages
    );
    report.error.as_deref().unwrap_or_default()
}

/// Asserts every consecutive pair of stages is a legal transition
pub fn assert_legal_transitions(report: &EnrichmentReport) {
    for pair in report.stages.windows(2) {
        assert!(
            pair[0].can_transition_to(pair[1]),
            "Illegal transition {} -> {} for {}",
            pair[0],
            pair[1],
            report.claim_id
        );
    }
}

/// Returns the summary written for a claim, panicking if there is none
pub fn summary_written(writes: &[StoreWrite], claim_id: ClaimId) -> String {
    writes
        .iter()
        .find_map(|write| match write {
            StoreWrite::Summary(id, summary) if *id == claim_id => Some(summary.clone()),
            _ => None,
        })
        .unwrap_or_else(|| panic!("No summary written for {claim_id}: {writes:?}"))
}

/// Returns the fraud result written for a claim, panicking if there is none
pub fn fraud_written(writes: &[StoreWrite], claim_id: ClaimId) -> FraudResult {
    writes
        .iter()
        .find_map(|write| match write {
            StoreWrite::Fraud(id, result) if *id == claim_id => Some(result.clone()),
            _ => None,
        })
        .unwrap_or_else(|| panic!("No fraud result written for {claim_id}: {writes:?}"))
}

/// Asserts the text contains none of the given raw values
pub fn assert_no_leak(text: &str, secrets: &[&str]) {
    for secret in secrets {
        assert!(
            !text.contains(secret),
            "Expected {secret:?} to be redacted from {text:?}"
        );
    }
}
