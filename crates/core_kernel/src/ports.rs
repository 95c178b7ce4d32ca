//! Port plumbing shared by every adapter
//!
//! The enrichment pipeline reaches four collaborators: the claim store, the
//! vector index, the LLM transport and the CDC feed. Their traits live in
//! `domain_enrichment::ports`; adapters live in `infra_db`, `infra_llm` and
//! the in-crate mocks.
//!
//! ```text
//!   EnrichmentPipeline ──► LlmPort / EmbeddingPort ──► infra_llm (ollama, gemini, openai)
//!          │          └──► VectorIndexPort        ──► infra_db pgvector | in-memory
//!          └─────────────► ClaimStorePort         ──► infra_db claims table
//!   IngestionLoop ───────► CdcSource              ──► mpsc channel
//! ```
//!
//! All of them fail with [`PortError`]. The pipeline only cares about two
//! questions when a call fails: was the entity missing, and would trying
//! again later help. Everything else is carried through to the logs.

use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Failure reported by a claim store, vector index or LLM adapter
#[derive(Debug, Error)]
pub enum PortError {
    #[error("{entity_type} {id} does not exist")]
    NotFound { entity_type: String, id: String },

    /// The adapter refused the input before doing any work
    #[error("Rejected input: {message}")]
    Validation { message: String },

    #[error("Could not reach backend: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("{operation} gave up after {duration_ms}ms")]
    Timeout { operation: String, duration_ms: u64 },

    /// Credentials were missing or refused by a hosted LLM
    #[error("Credentials refused: {message}")]
    Unauthorized { message: String },

    #[error("Throttled by backend, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("{service} is unavailable")]
    ServiceUnavailable { service: String },

    /// The backend answered, but not in a shape we understand
    #[error("Unreadable response: {message}")]
    Transformation { message: String },

    #[error("Adapter failure: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },
}

impl PortError {
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    pub fn transformation(message: impl Into<String>) -> Self {
        PortError::Transformation {
            message: message.into(),
        }
    }

    /// Whether the same call might succeed if the claim is replayed later.
    ///
    /// The pipeline does not retry by itself; this only decides how loudly a
    /// failed claim is logged.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PortError::Connection { .. }
                | PortError::Timeout { .. }
                | PortError::RateLimited { .. }
                | PortError::ServiceUnavailable { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }
}

/// Bound shared by every port trait so adapters can sit behind `Arc<dyn _>`
/// and cross into spawned enrichment tasks.
pub trait DomainPort: Send + Sync + 'static {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    Healthy,
    Unhealthy,
}

/// Outcome of probing one adapter, surfaced by the readiness endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub adapter_id: String,
    pub status: AdapterHealth,
    pub latency_ms: u64,
    pub message: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl HealthCheckResult {
    pub fn healthy(adapter_id: impl Into<String>, latency_ms: u64) -> Self {
        Self::build(adapter_id.into(), AdapterHealth::Healthy, latency_ms, None)
    }

    pub fn unhealthy(
        adapter_id: impl Into<String>,
        latency_ms: u64,
        message: impl Into<String>,
    ) -> Self {
        Self::build(
            adapter_id.into(),
            AdapterHealth::Unhealthy,
            latency_ms,
            Some(message.into()),
        )
    }

    /// Turns a timed probe into a result; latency is measured from `started`.
    pub fn from_probe<E: fmt::Display>(
        adapter_id: impl Into<String>,
        started: Instant,
        outcome: Result<(), E>,
    ) -> Self {
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match outcome {
            Ok(()) => Self::healthy(adapter_id, latency_ms),
            Err(e) => Self::unhealthy(adapter_id, latency_ms, e.to_string()),
        }
    }

    pub fn is_operational(&self) -> bool {
        self.status == AdapterHealth::Healthy
    }

    fn build(
        adapter_id: String,
        status: AdapterHealth,
        latency_ms: u64,
        message: Option<String>,
    ) -> Self {
        Self {
            adapter_id,
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}

/// Adapters whose backend can be probed without side effects
#[async_trait::async_trait]
pub trait HealthCheckable: Send + Sync {
    async fn health_check(&self) -> HealthCheckResult;
}
