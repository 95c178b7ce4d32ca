//! Claims repository implementation
//!
//! Database access for the legacy `claims` table: intake inserts, listing,
//! and the parameterized enrichment updates written by the pipeline.

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{debug, instrument};

use core_kernel::{ClaimId, DomainPort, HealthCheckResult, HealthCheckable, PortError};
use domain_enrichment::{ClaimRecord, ClaimStatus, ClaimStorePort, FraudResult, NewClaim};

use crate::error::DatabaseError;

const CLAIM_COLUMNS: &str = "id, description, status, summary, ai_provider, ai_temperature, \
     fraud_score, fraud_analysis, fraud_rationale, created_at";

/// Database row representation of a claim
#[derive(Debug, Clone, FromRow)]
pub struct ClaimRow {
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

impl From<ClaimRow> for ClaimRecord {
    fn from(row: ClaimRow) -> Self {
        ClaimRecord {
            id: ClaimId::new(row.id),
            description: row.description,
            status: ClaimStatus::from_db(&row.status),
            summary: row.summary,
            ai_provider: row.ai_provider,
            ai_temperature: row.ai_temperature,
            fraud_score: row.fraud_score,
            fraud_analysis: row.fraud_analysis,
            fraud_rationale: row.fraud_rationale,
            created_at: row.created_at,
        }
    }
}

/// Repository for the claims table
///
/// Enrichment updates touch only their own columns, so a summary written by
/// one stage survives a failure in a later stage.
#[derive(Debug, Clone)]
pub struct ClaimsRepository {
    pool: PgPool,
}

impl ClaimsRepository {
    /// Creates a new ClaimsRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Retrieves a claim by its identifier
    pub async fn get_by_id(&self, claim_id: ClaimId) -> Result<ClaimRow, DatabaseError> {
        let sql = format!("SELECT {CLAIM_COLUMNS} FROM claims WHERE id = $1");
        sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(claim_id.value())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Claim", claim_id))
    }

    /// All claims, newest first
    pub async fn list_all(&self) -> Result<Vec<ClaimRow>, DatabaseError> {
        let sql = format!("SELECT {CLAIM_COLUMNS} FROM claims ORDER BY id DESC");
        let rows = sqlx::query_as::<_, ClaimRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Inserts a claim with status `OPEN`
    pub async fn insert(&self, claim: &NewClaim) -> Result<ClaimRow, DatabaseError> {
        let sql = format!(
            "INSERT INTO claims (description, status, ai_provider, ai_temperature) \
             VALUES ($1, $2, $3, $4) RETURNING {CLAIM_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(&claim.description)
            .bind(ClaimStatus::Open.as_str())
            .bind(claim.ai_provider.as_deref())
            .bind(claim.ai_temperature.map(|t| t.value()))
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    /// Writes the summary column; returns the number of rows touched
    pub async fn set_summary(&self, claim_id: ClaimId, summary: &str) -> Result<u64, DatabaseError> {
        let result = sqlx::query("UPDATE claims SET summary = $1 WHERE id = $2")
            .bind(summary)
            .bind(claim_id.value())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Writes the three fraud columns; returns the number of rows touched
    pub async fn set_fraud_result(
        &self,
        claim_id: ClaimId,
        result: &FraudResult,
    ) -> Result<u64, DatabaseError> {
        let outcome = sqlx::query(
            "UPDATE claims SET fraud_score = $1, fraud_analysis = $2, fraud_rationale = $3 WHERE id = $4",
        )
        .bind(i32::from(result.score()))
        .bind(result.analysis())
        .bind(result.rationale())
        .bind(claim_id.value())
        .execute(&self.pool)
        .await?;
        Ok(outcome.rows_affected())
    }
}

impl DomainPort for ClaimsRepository {}

#[async_trait]
impl HealthCheckable for ClaimsRepository {
    async fn health_check(&self) -> HealthCheckResult {
        let started = Instant::now();
        let probe = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| ());
        HealthCheckResult::from_probe("postgres-claims-store", started, probe)
    }
}

#[async_trait]
impl ClaimStorePort for ClaimsRepository {
    #[instrument(skip(self, summary), fields(claim_id = %claim_id))]
    async fn update_summary(&self, claim_id: ClaimId, summary: &str) -> Result<(), PortError> {
        let touched = self.set_summary(claim_id, summary).await?;
        debug!(rows = touched, "Legacy DB summary updated");
        Ok(())
    }

    #[instrument(skip(self, result), fields(claim_id = %claim_id, score = result.score()))]
    async fn update_fraud_result(
        &self,
        claim_id: ClaimId,
        result: &FraudResult,
    ) -> Result<(), PortError> {
        let touched = self.set_fraud_result(claim_id, result).await?;
        debug!(rows = touched, "Legacy DB fraud columns updated");
        Ok(())
    }

    async fn list_claims(&self) -> Result<Vec<ClaimRecord>, PortError> {
        let rows = self.list_all().await?;
        Ok(rows.into_iter().map(ClaimRecord::from).collect())
    }

    #[instrument(skip(self, claim))]
    async fn create_claim(&self, claim: NewClaim) -> Result<ClaimRecord, PortError> {
        let row = self.insert(&claim).await?;
        debug!(claim_id = row.id, "Claim inserted");
        Ok(row.into())
    }
}
