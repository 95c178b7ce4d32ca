//! Pre-built Test Fixtures
//!
//! Ready-to-use claim text, model replies and CDC payloads. Values are fixed
//! so assertions can compare against them directly.

/// Fixture for claim descriptions
pub struct ClaimFixtures;

impl ClaimFixtures {
    /// Plain description with no personal data
    pub fn deer_collision() -> &'static str {
        "Car hit a deer on Route 9 at dusk; front bumper and headlight destroyed."
    }

    /// Description containing every PII kind the standard redactor masks
    pub fn with_pii() -> &'static str {
        "Claimant John (SSN 123-45-6789, policy POL-884512) can be reached at \
         john.doe@example.com or 555-867-5309. Card 4111 1111 1111 1111 was charged."
    }

    /// A second water-damage claim used for historical context
    pub fn water_damage() -> &'static str {
        "Burst pipe flooded the basement; carpets and drywall need replacement."
    }

    /// A theft claim filed shortly after the policy started
    pub fn suspicious_theft() -> &'static str {
        "Laptop and jewelry stolen from car two days after policy start; no police report."
    }
}

/// Fixture for raw model output
pub struct LlmReplyFixtures;

impl LlmReplyFixtures {
    /// One-sentence summary reply
    pub fn summary() -> &'static str {
        "A car struck a deer, damaging the bumper and headlight."
    }

    /// Well-formed fraud reply in the primary format
    pub fn fraud_strict() -> &'static str {
        "SCORE: 85\nANALYSIS: High risk.\nRATIONALE: Claimant filed twice in one month."
    }

    /// Fraud reply in the alternate vocabulary
    pub fn fraud_alternate() -> &'static str {
        "Scoring: 40\nAnalysis: Moderate risk.\nRational analysis: Timing is unusual."
    }

    /// Fraud reply only the lenient tier understands
    pub fn fraud_lenient() -> &'static str {
        "The score is 55.\nRationale: Receipts look edited. Needs review."
    }

    /// Reply with no recognisable score
    pub fn unparseable() -> &'static str {
        "I am unable to assess this claim."
    }
}

/// Fixture for CDC message bodies
pub struct CdcFixtures;

impl CdcFixtures {
    /// Debezium create envelope for a claim without a summary
    pub fn create(id: i64, description: &str) -> String {
        serde_json::json!({
            "schema": {},
            "payload": {
                "before": null,
                "after": {"id": id, "description": description, "summary": null},
                "op": "c"
            }
        })
        .to_string()
    }

    /// Update envelope for a claim that already has a summary
    pub fn already_summarized(id: i64) -> String {
        serde_json::json!({
            "payload": {
                "before": {"id": id},
                "after": {"id": id, "description": "Already handled", "summary": "Done."},
                "op": "u"
            }
        })
        .to_string()
    }

    /// Delete envelope; carries no `after` row
    pub fn delete(id: i64) -> String {
        serde_json::json!({
            "payload": {"before": {"id": id}, "after": null, "op": "d"}
        })
        .to_string()
    }

    /// Body that is not JSON
    pub fn malformed() -> &'static str {
        "{\"payload\": "
    }
}
