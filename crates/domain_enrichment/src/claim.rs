//! Claim rows as stored in the legacy claims table

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, Temperature};

/// Claim status as recorded by the intake surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimStatus {
    /// Newly filed, awaiting handling
    Open,
    /// Picked up by an adjuster
    InReview,
    /// Closed
    Closed,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Open => "OPEN",
            ClaimStatus::InReview => "IN_REVIEW",
            ClaimStatus::Closed => "CLOSED",
        }
    }

    /// Parses the stored column value; unknown values read as `Open`
    pub fn from_db(value: &str) -> Self {
        match value {
            "IN_REVIEW" => ClaimStatus::InReview,
            "CLOSED" => ClaimStatus::Closed,
            _ => ClaimStatus::Open,
        }
    }
}

/// A claims-table row including the enrichment columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub id: ClaimId,
    pub description: String,
    pub status: ClaimStatus,
    pub summary: Option<String>,
    pub ai_provider: Option<String>,
    pub ai_temperature: Option<f64>,
    pub fraud_score: Option<i32>,
    pub fraud_analysis: Option<String>,
    pub fraud_rationale: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ClaimRecord {
    /// Returns true once a non-empty summary has been written
    pub fn is_summarized(&self) -> bool {
        self.summary.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// A claim filed through the intake surface
#[derive(Debug, Clone, PartialEq)]
pub struct NewClaim {
    pub description: String,
    pub ai_provider: Option<String>,
    pub ai_temperature: Option<Temperature>,
}

impl NewClaim {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ai_provider: None,
            ai_temperature: None,
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.ai_provider = Some(provider.into());
        self
    }

    pub fn with_temperature(mut self, temperature: Temperature) -> Self {
        self.ai_temperature = Some(temperature);
        self
    }
}
