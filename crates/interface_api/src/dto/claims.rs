//! Claims DTOs

use chrono::{DateTime, Utc};
use domain_enrichment::ClaimRecord;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::TemperatureInput;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateClaimRequest {
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: String,
    pub ai_provider: Option<String>,
    pub ai_temperature: Option<TemperatureInput>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateClaimResponse {
    pub status: String,
    pub id: i64,
}

/// A claims-table row as returned by the listing endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimResponse {
    pub id: i64,
    pub description: String,
    pub status: String,
    pub summary: Option<String>,
    pub ai_provider: Option<String>,
    pub ai_temperature: Option<f64>,
    pub fraud_score: Option<i32>,
    pub fraud_analysis: Option<String>,
    pub fraud_rationale: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ClaimRecord> for ClaimResponse {
    fn from(record: ClaimRecord) -> Self {
        Self {
            id: record.id.value(),
            description: record.description,
            status: record.status.as_str().to_string(),
            summary: record.summary,
            ai_provider: record.ai_provider,
            ai_temperature: record.ai_temperature,
            fraud_score: record.fraud_score,
            fraud_analysis: record.fraud_analysis,
            fraud_rationale: record.fraud_rationale,
            created_at: record.created_at,
        }
    }
}
