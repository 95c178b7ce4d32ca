//! Prompt templates for the enrichment calls

use crate::ports::VectorDocument;

/// Context string used when retrieval yields nothing
pub const NO_PRIOR_CLAIMS: &str = "No prior claims found.";

const SUMMARY_INSTRUCTION: &str = "Summarize this insurance claim in 1 sentence: ";

const FRAUD_SYSTEM_PROMPT: &str = "You are an insurance fraud analyst. \
Assess the claim against the historical claims provided and answer in exactly this format:\n\
SCORE: <integer from 0 to 100>\n\
ANALYSIS: <one sentence>\n\
RATIONALE: <the reasoning behind the score>";

/// User prompt for the summarization call
pub fn summary_prompt(redacted_description: &str) -> String {
    format!("{SUMMARY_INSTRUCTION}{redacted_description}")
}

/// System prompt for the fraud-scoring call
pub fn fraud_system_prompt() -> &'static str {
    FRAUD_SYSTEM_PROMPT
}

/// User prompt for the fraud-scoring call
pub fn fraud_prompt(redacted_description: &str, historical_context: &str) -> String {
    format!(
        "Claim under review:\n{redacted_description}\n\n\
         Similar historical claims:\n{historical_context}\n\n\
         Rate the fraud risk of the claim under review."
    )
}

/// Appended to the original prompt when the first answer could not be parsed
pub fn corrective_prompt(original_prompt: &str) -> String {
    format!(
        "{original_prompt}\n\n\
         Your previous answer did not follow the required format. \
         Reply with exactly three lines and nothing else:\n\
         SCORE: <integer from 0 to 100>\n\
         ANALYSIS: <one sentence>\n\
         RATIONALE: <the reasoning behind the score>"
    )
}

/// Renders retrieved documents as a numbered list
pub fn historical_context(documents: &[VectorDocument]) -> String {
    if documents.is_empty() {
        return NO_PRIOR_CLAIMS.to_string();
    }
    documents
        .iter()
        .enumerate()
        .map(|(i, doc)| format!("{}. {}", i + 1, doc.text.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}
