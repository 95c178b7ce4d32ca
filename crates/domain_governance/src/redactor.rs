//! PII redaction
//!
//! The redactor applies an ordered list of pattern substitutions. Each rule
//! replaces every match in the whole text with its placeholder token, and the
//! next rule runs on the already-redacted output.
//!
//! Rules must not overlap: a span matched by one rule should never be a
//! candidate for another, otherwise the earlier rule wins and the later token
//! never appears. Emails run first so an address whose local part holds a
//! digit run or a policy number is replaced whole. The remaining exception is
//! a bare nine-digit run, which the government ID rule claims before the
//! policy rule, so `POL-123456789` becomes `POL-[REDACTED_SSN]`.

use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// XXX-XX-XXXX or a bare nine-digit run
static GOVERNMENT_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{3}-\d{2}-\d{4}\b|\b\d{9}\b").expect("government id pattern is valid")
});

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,6}").expect("email pattern is valid")
});

// POL-XXXXXX or POLICY-XXXXXX, any case
static POLICY_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(POL|POLICY)-\d{4,10}\b").expect("policy id pattern is valid")
});

/// Category of personally identifiable information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiKind {
    /// Social security style government identifier
    GovernmentId,
    /// Email address
    Email,
    /// Insurance policy identifier
    PolicyId,
}

impl PiiKind {
    /// Placeholder written in place of a match
    pub fn token(&self) -> &'static str {
        match self {
            PiiKind::GovernmentId => "[REDACTED_SSN]",
            PiiKind::Email => "[REDACTED_EMAIL]",
            PiiKind::PolicyId => "[REDACTED_POLICY_ID]",
        }
    }
}

/// A single `{matcher, replacement token}` pair
#[derive(Debug, Clone)]
pub struct RedactionRule {
    kind: PiiKind,
    matcher: Regex,
}

impl RedactionRule {
    /// Creates a rule for the given kind
    pub fn new(kind: PiiKind, matcher: Regex) -> Self {
        Self { kind, matcher }
    }

    pub fn kind(&self) -> PiiKind {
        self.kind
    }

    pub fn matcher(&self) -> &Regex {
        &self.matcher
    }
}

/// Result of a redaction pass with per-rule hit counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redaction {
    /// The sanitized text
    pub text: String,
    /// Number of substitutions per rule that fired, in rule order
    pub hits: Vec<(PiiKind, usize)>,
}

impl Redaction {
    /// Returns true if any rule fired
    pub fn pii_detected(&self) -> bool {
        !self.hits.is_empty()
    }

    /// Total number of substitutions
    pub fn total_hits(&self) -> usize {
        self.hits.iter().map(|(_, count)| count).sum()
    }
}

/// Stateless, deterministic PII scrubber
#[derive(Debug, Clone)]
pub struct Redactor {
    rules: Vec<RedactionRule>,
}

impl Default for Redactor {
    fn default() -> Self {
        Self::standard()
    }
}

impl Redactor {
    /// Emails, then government IDs, then policy identifiers
    pub fn standard() -> Self {
        Self::with_rules(vec![
            RedactionRule::new(PiiKind::Email, EMAIL_PATTERN.clone()),
            RedactionRule::new(PiiKind::GovernmentId, GOVERNMENT_ID_PATTERN.clone()),
            RedactionRule::new(PiiKind::PolicyId, POLICY_ID_PATTERN.clone()),
        ])
    }

    /// Builds a redactor from an explicit ordered rule list
    pub fn with_rules(rules: Vec<RedactionRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[RedactionRule] {
        &self.rules
    }

    /// Redacts PII and returns only the sanitized text
    ///
    /// Emits a `pii.redacted` log event when anything was replaced; the
    /// returned text does not depend on whether logging is enabled.
    pub fn redact(&self, input: &str) -> String {
        self.redact_detailed(input).text
    }

    /// Redacts PII and reports which rules fired
    pub fn redact_detailed(&self, input: &str) -> Redaction {
        if input.is_empty() {
            return Redaction {
                text: String::new(),
                hits: Vec::new(),
            };
        }

        debug!(length = input.len(), "Running governance scrub on input");

        let mut text = input.to_string();
        let mut hits = Vec::new();

        for rule in &self.rules {
            let count = rule.matcher.find_iter(&text).count();
            if count == 0 {
                continue;
            }
            text = rule
                .matcher
                .replace_all(&text, NoExpand(rule.kind.token()))
                .into_owned();
            hits.push((rule.kind, count));
        }

        let redaction = Redaction { text, hits };
        if redaction.pii_detected() {
            info!(
                event = "pii.redacted",
                pii_detected = true,
                substitutions = redaction.total_hits(),
                "PII detected and redacted from claim stream"
            );
        }
        redaction
    }
}
