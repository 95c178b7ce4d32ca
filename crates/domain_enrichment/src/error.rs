//! Enrichment domain errors

use thiserror::Error;

use core_kernel::{ClaimId, PortError};

/// Errors raised by the provider registry
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Unknown AI provider: {0}")]
    UnknownProvider(String),
}

/// Errors raised while decoding a CDC message into a claim change event
#[derive(Debug, Error)]
pub enum CdcDecodeError {
    #[error("Malformed CDC payload: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("CDC record is missing field '{0}'")]
    MissingField(&'static str),

    #[error("CDC record field '{field}' has the wrong type: expected {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
}

/// Errors that move a claim into the `Errored` state
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("Summarization failed for {claim_id}: {source}")]
    Summarization {
        claim_id: ClaimId,
        #[source]
        source: PortError,
    },

    #[error("Fraud scoring failed for {claim_id}: {source}")]
    Scoring {
        claim_id: ClaimId,
        #[source]
        source: PortError,
    },

    #[error("Persisting {field} failed for {claim_id}: {source}")]
    Persistence {
        claim_id: ClaimId,
        field: &'static str,
        #[source]
        source: PortError,
    },

    #[error("Invalid stage transition from {from} to {to}")]
    InvalidStageTransition { from: String, to: String },
}

impl EnrichmentError {
    /// Returns true if redelivering the same event may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            EnrichmentError::Summarization { source, .. }
            | EnrichmentError::Scoring { source, .. }
            | EnrichmentError::Persistence { source, .. } => source.is_transient(),
            EnrichmentError::InvalidStageTransition { .. } => false,
        }
    }
}
