//! Tests for the fraud-score parse ladder and the scoring retry

use core_kernel::Temperature;
use domain_enrichment::fraud::FALLBACK_ANALYSIS;
use domain_enrichment::{ChatOptions, FraudParser, FraudResult, LlmRequest, MockLlm, ParseTier};
use proptest::prelude::*;

fn parser() -> FraudParser {
    FraudParser::new()
}

fn scoring_request() -> LlmRequest {
    LlmRequest::user(
        "Rate this claim",
        ChatOptions::with_temperature(Temperature::ZERO).repeat_penalty(1.1),
    )
}

// ============================================================================
// Ladder Tests
// ============================================================================

mod ladder_tests {
    use super::*;

    #[test]
    fn test_strict_multiline_bodies() {
        let raw = "SCORE: 40\nANALYSIS: Moderate risk,\nrepeat claimant.\nRATIONALE: Two claims\nin one month.";
        let (result, tier) = parser().parse(raw).unwrap();

        assert_eq!(tier, ParseTier::Strict);
        assert_eq!(result.score(), 40);
        assert_eq!(result.analysis(), "Moderate risk,\nrepeat claimant.");
        assert_eq!(result.rationale(), "Two claims\nin one month.");
    }

    #[test]
    fn test_strict_with_preamble() {
        let raw = "Here is my assessment.\nSCORE: 12\nANALYSIS: Low risk.\nRATIONALE: Consistent story.";
        let (result, tier) = parser().parse(raw).unwrap();
        assert_eq!(tier, ParseTier::Strict);
        assert_eq!(result.score(), 12);
    }

    #[test]
    fn test_strict_labels_are_case_sensitive() {
        let raw = "score: 30\nanalysis: meh.\nrationale: none given.";
        let (result, tier) = parser().parse(raw).unwrap();
        assert_eq!(tier, ParseTier::Lenient);
        assert_eq!(result.score(), 30);
    }

    #[test]
    fn test_alternate_vocabulary() {
        let raw = "Scoring: 70\nAnalysis: Suspicious timing.\nRational analysis: Policy bought a day before loss.";
        let (result, tier) = parser().parse(raw).unwrap();

        assert_eq!(tier, ParseTier::Alternate);
        assert_eq!(result.score(), 70);
        assert_eq!(result.analysis(), "Suspicious timing.");
        assert_eq!(result.rationale(), "Policy bought a day before loss.");
    }

    #[test]
    fn test_lenient_score_is_phrase() {
        let raw = "The score is 55.\nRationale: Garage receipts look edited. Further review advised.\n2. Other notes";
        let (result, tier) = parser().parse(raw).unwrap();

        assert_eq!(tier, ParseTier::Lenient);
        assert_eq!(result.score(), 55);
        assert_eq!(result.rationale(), "Garage receipts look edited. Further review advised.");
        assert_eq!(result.analysis(), "Garage receipts look edited.");
    }

    #[test]
    fn test_lenient_accepts_misspelled_label() {
        let raw = "SCORE 20\nRAISONALE: nothing unusual";
        let (result, _) = parser().parse(raw).unwrap();

        assert_eq!(result.score(), 20);
        assert_eq!(result.rationale(), "nothing unusual");
        assert_eq!(result.analysis(), "nothing unusual");
    }

    #[test]
    fn test_lenient_without_rationale() {
        let (result, tier) = parser().parse("Final score: 64").unwrap();
        assert_eq!(tier, ParseTier::Lenient);
        assert_eq!(result.score(), 64);
        assert_eq!(result.rationale(), "");
        assert_eq!(result.analysis(), "");
    }

    #[test]
    fn test_out_of_range_rejected_by_every_tier() {
        assert!(parser().parse("SCORE: 101\nANALYSIS: a\nRATIONALE: b").is_none());
        assert!(parser().parse("Scoring: 250\nAnalysis: a\nRational analysis: b").is_none());
        assert!(parser().parse("score is 9999").is_none());
    }

    #[test]
    fn test_boundaries_accepted() {
        assert_eq!(parser().parse("SCORE: 0\nANALYSIS: a\nRATIONALE: b").unwrap().0.score(), 0);
        assert_eq!(parser().parse("SCORE: 100\nANALYSIS: a\nRATIONALE: b").unwrap().0.score(), 100);
    }

    #[test]
    fn test_no_score_anywhere() {
        assert!(parser().parse("I cannot help with that.").is_none());
        assert!(parser().parse("").is_none());
    }

    #[test]
    fn test_parse_or_fallback() {
        let result = parser().parse_or_fallback("nonsense");
        assert_eq!(result, FraudResult::fallback("nonsense"));
        assert_eq!(result.analysis(), FALLBACK_ANALYSIS);
    }
}

// ============================================================================
// Scoring Retry Tests
// ============================================================================

mod scoring_tests {
    use super::*;

    #[tokio::test]
    async fn test_first_answer_accepted() {
        let llm = MockLlm::new("mock").reply("SCORE: 85\nANALYSIS: High risk.\nRATIONALE: Claimant filed twice.");
        let outcome = parser().score(&llm, scoring_request()).await.unwrap();

        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.tier, Some(ParseTier::Strict));
        assert_eq!(outcome.result, FraudResult::new(85, "High risk.", "Claimant filed twice.").unwrap());
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_retry_uses_corrective_prompt() {
        let llm = MockLlm::new("mock")
            .reply("I think it's fine")
            .reply("SCORE: 10\nANALYSIS: Low.\nRATIONALE: Clean history.");
        let outcome = parser().score(&llm, scoring_request()).await.unwrap();

        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.result.score(), 10);

        let requests = llm.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].user_prompt.starts_with("Rate this claim"));
        assert!(requests[1].user_prompt.contains("SCORE: <integer from 0 to 100>"));
        assert_eq!(requests[1].options, requests[0].options);
    }

    #[tokio::test]
    async fn test_fallback_after_second_failure() {
        let llm = MockLlm::new("mock").reply("no idea").reply("still no idea").reply("SCORE: 50");
        let outcome = parser().score(&llm, scoring_request()).await.unwrap();

        assert!(outcome.is_fallback());
        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.result, FraudResult::fallback("still no idea"));
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_out_of_range_retried_then_fallback() {
        let llm = MockLlm::new("mock").with_default("SCORE: 150\nANALYSIS: x\nRATIONALE: y");
        let outcome = parser().score(&llm, scoring_request()).await.unwrap();

        assert_eq!(outcome.result.score(), 0);
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let llm = MockLlm::new("mock").fail("backend down");
        let result = parser().score(&llm, scoring_request()).await;

        assert!(result.is_err());
        assert!(result.unwrap_err().is_transient());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

fn text_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9 ,.'-]{0,60}[A-Za-z0-9.]"
}

proptest! {
    #[test]
    fn prop_render_then_parse_round_trips(
        score in 0i64..=100,
        analysis in text_strategy(),
        rationale in text_strategy(),
    ) {
        let original = FraudResult::new(score, analysis, rationale).unwrap();
        let rendered = FraudParser::render(&original);
        let (parsed, tier) = parser().parse(&rendered).unwrap();

        prop_assert_eq!(tier, ParseTier::Strict);
        prop_assert_eq!(parsed, original);
    }

    #[test]
    fn prop_score_always_in_range(raw in ".{0,200}") {
        let result = parser().parse_or_fallback(&raw);
        prop_assert!(result.score() <= 100);
    }

    #[test]
    fn prop_unrepresentable_scores_rejected(score in 101i64..100_000) {
        prop_assert!(FraudResult::new(score, "a", "b").is_none());
        let raw = format!("SCORE: {score}\nANALYSIS: a\nRATIONALE: b");
        prop_assert!(parser().parse(&raw).is_none());
    }
}
