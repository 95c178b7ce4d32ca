//! Fraud-risk structured output parsing
//!
//! Model output is converted into a [`FraudResult`] by an ordered ladder of
//! parse attempts, first success wins:
//!
//! 1. `SCORE:` / `ANALYSIS:` / `RATIONALE:` labels
//! 2. `Scoring:` / `Analysis:` / `Rational analysis:` labels
//! 3. lenient extraction of any "score" number plus a rationale span
//!
//! A score outside `[0, 100]` is never accepted; the attempt falls through
//! to the next tier. When no tier succeeds the scorer asks the model once
//! more with a corrective prompt, and after that returns the fallback result.
//! Format problems are never reported as errors.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use core_kernel::PortError;

use crate::ports::{LlmPort, LlmRequest};
use crate::prompts;

static STRICT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)SCORE:\s*(\d+).*?ANALYSIS:\s*(.*?)\s*RATIONALE:\s*(.*)")
        .expect("strict fraud pattern is valid")
});

static ALTERNATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)Scoring:\s*(\d+).*?Analysis:\s*(.*?)\s*Rational analysis:\s*(.*)")
        .expect("alternate fraud pattern is valid")
});

static LENIENT_SCORE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)score\s*(?:is\s*)?[:=]?\s*(\d+)").expect("lenient score pattern is valid")
});

// "RAISONALE" is a misspelling some models produce
static LENIENT_RATIONALE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)(?:RATIONALE|RAISONALE)\s*:?\s*(.*?)(?:\n\s*\d+\.\s|\z)")
        .expect("lenient rationale pattern is valid")
});

/// Analysis text of the fallback result
pub const FALLBACK_ANALYSIS: &str = "AI Analysis unavailable";

/// Fallback rationale when the model replied with nothing at all
pub const EMPTY_REPLY_RATIONALE: &str = "Model returned an empty response";

/// Highest accepted score
pub const MAX_SCORE: u8 = 100;

/// Validated fraud-risk assessment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedFraudResult")]
pub struct FraudResult {
    score: u8,
    analysis: String,
    rationale: String,
}

#[derive(Deserialize)]
struct UncheckedFraudResult {
    score: i64,
    analysis: String,
    rationale: String,
}

impl TryFrom<UncheckedFraudResult> for FraudResult {
    type Error = String;

    fn try_from(raw: UncheckedFraudResult) -> Result<Self, Self::Error> {
        FraudResult::new(raw.score, raw.analysis, raw.rationale)
            .ok_or_else(|| format!("fraud score {} is outside 0..={MAX_SCORE}", raw.score))
    }
}

impl FraudResult {
    /// Returns `None` if the score is outside `[0, 100]`
    pub fn new(score: i64, analysis: impl Into<String>, rationale: impl Into<String>) -> Option<Self> {
        let score = u8::try_from(score).ok().filter(|s| *s <= MAX_SCORE)?;
        Some(Self {
            score,
            analysis: analysis.into(),
            rationale: rationale.into(),
        })
    }

    /// Score 0 with the raw model text echoed as the rationale
    pub fn fallback(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let rationale = if raw.trim().is_empty() {
            EMPTY_REPLY_RATIONALE.to_string()
        } else {
            raw
        };
        Self {
            score: 0,
            analysis: FALLBACK_ANALYSIS.to_string(),
            rationale,
        }
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn analysis(&self) -> &str {
        &self.analysis
    }

    pub fn rationale(&self) -> &str {
        &self.rationale
    }

    pub fn is_fallback(&self) -> bool {
        self.score == 0 && self.analysis == FALLBACK_ANALYSIS
    }
}

/// Which rung of the ladder produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseTier {
    Strict,
    Alternate,
    Lenient,
}

/// Result of a full scoring exchange with the model
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringOutcome {
    pub result: FraudResult,
    /// Tier that succeeded, `None` for the fallback
    pub tier: Option<ParseTier>,
    /// Number of model calls made (1 or 2)
    pub attempts: u32,
}

impl ScoringOutcome {
    pub fn is_fallback(&self) -> bool {
        self.tier.is_none()
    }
}

/// The strict/alternate/lenient parse ladder with a bounded retry
#[derive(Debug, Clone)]
pub struct FraudParser {
    max_attempts: u32,
}

impl Default for FraudParser {
    fn default() -> Self {
        Self { max_attempts: 2 }
    }
}

impl FraudParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Runs the ladder once over `raw`
    pub fn parse(&self, raw: &str) -> Option<(FraudResult, ParseTier)> {
        let ladder: [(ParseTier, fn(&str) -> Option<FraudResult>); 3] = [
            (ParseTier::Strict, parse_strict),
            (ParseTier::Alternate, parse_alternate),
            (ParseTier::Lenient, parse_lenient),
        ];
        ladder
            .iter()
            .find_map(|(tier, attempt)| attempt(raw).map(|result| (result, *tier)))
    }

    /// Parses `raw`, substituting the fallback when nothing matches
    pub fn parse_or_fallback(&self, raw: &str) -> FraudResult {
        self.parse(raw)
            .map(|(result, _)| result)
            .unwrap_or_else(|| FraudResult::fallback(raw))
    }

    /// Renders a result in the strict template
    pub fn render(result: &FraudResult) -> String {
        format!(
            "SCORE: {}\nANALYSIS: {}\nRATIONALE: {}",
            result.score, result.analysis, result.rationale
        )
    }

    /// Asks the model for a fraud assessment, retrying once on bad format
    ///
    /// Transport errors from the model propagate; format errors end in the
    /// fallback result.
    pub async fn score(&self, llm: &dyn LlmPort, request: LlmRequest) -> Result<ScoringOutcome, PortError> {
        let original_prompt = request.user_prompt.clone();
        let mut request = request;
        let mut attempt = 1;

        loop {
            let raw = llm.invoke(request.clone()).await?;
            if let Some((result, tier)) = self.parse(&raw) {
                debug!(attempt, tier = ?tier, "Parsed fraud assessment");
                return Ok(ScoringOutcome {
                    result,
                    tier: Some(tier),
                    attempts: attempt,
                });
            }

            if attempt >= self.max_attempts {
                warn!(attempt, "Fraud assessment unparseable, using fallback");
                return Ok(ScoringOutcome {
                    result: FraudResult::fallback(raw),
                    tier: None,
                    attempts: attempt,
                });
            }

            debug!(attempt, "Fraud assessment unparseable, retrying with corrective prompt");
            attempt += 1;
            request.user_prompt = prompts::corrective_prompt(&original_prompt);
        }
    }
}

fn from_captures(pattern: &Regex, raw: &str) -> Option<FraudResult> {
    let caps = pattern.captures(raw)?;
    let score = caps[1].parse::<i64>().ok()?;
    FraudResult::new(score, caps[2].trim(), caps[3].trim())
}

fn parse_strict(raw: &str) -> Option<FraudResult> {
    from_captures(&STRICT_PATTERN, raw)
}

fn parse_alternate(raw: &str) -> Option<FraudResult> {
    from_captures(&ALTERNATE_PATTERN, raw)
}

fn parse_lenient(raw: &str) -> Option<FraudResult> {
    let score = LENIENT_SCORE
        .captures(raw)
        .and_then(|caps| caps[1].parse::<i64>().ok())?;

    let rationale = LENIENT_RATIONALE
        .captures(raw)
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_default();

    FraudResult::new(score, first_sentence(&rationale), rationale.as_str())
}

// Text up to and including the first period, or the whole text without one
fn first_sentence(text: &str) -> &str {
    match text.find('.') {
        Some(end) => &text[..=end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_labels() {
        let (result, tier) = FraudParser::new()
            .parse("SCORE: 85\nANALYSIS: High risk.\nRATIONALE: Claimant filed twice.")
            .unwrap();
        assert_eq!(tier, ParseTier::Strict);
        assert_eq!(result.score(), 85);
        assert_eq!(result.analysis(), "High risk.");
        assert_eq!(result.rationale(), "Claimant filed twice.");
    }

    #[test]
    fn test_out_of_range_falls_through() {
        let parser = FraudParser::new();
        assert!(parser.parse("SCORE: 150\nANALYSIS: x\nRATIONALE: y").is_none());
    }

    #[test]
    fn test_first_sentence() {
        assert_eq!(first_sentence("One. Two."), "One.");
        assert_eq!(first_sentence("No period"), "No period");
        assert_eq!(first_sentence(""), "");
    }

    #[test]
    fn test_fallback_shape() {
        let result = FraudResult::fallback("garbage");
        assert_eq!(result.score(), 0);
        assert_eq!(result.analysis(), FALLBACK_ANALYSIS);
        assert_eq!(result.rationale(), "garbage");
        assert!(result.is_fallback());
    }

    #[test]
    fn test_blank_reply_fallback_explains_itself() {
        let result = FraudResult::fallback("  \n");
        assert_eq!(result.rationale(), EMPTY_REPLY_RATIONALE);
        assert!(result.is_fallback());
    }

    #[test]
    fn test_deserialize_rejects_out_of_range_score() {
        let error = serde_json::from_str::<FraudResult>(r#"{"score":200,"analysis":"a","rationale":"b"}"#)
            .unwrap_err();
        assert!(error.to_string().contains("outside 0..=100"));

        assert!(serde_json::from_str::<FraudResult>(r#"{"score":-1,"analysis":"a","rationale":"b"}"#).is_err());
    }

    #[test]
    fn test_deserialize_accepts_serialized_result() {
        let result = FraudResult::new(85, "High risk.", "Claimant filed twice.").unwrap();
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(serde_json::from_str::<FraudResult>(&json).unwrap(), result);
    }
}
