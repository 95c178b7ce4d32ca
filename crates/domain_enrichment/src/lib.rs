//! Claim Enrichment Domain
//!
//! This crate turns claim change events into enriched claim records: a
//! one-sentence summary and a structured fraud-risk score, with a vector
//! index kept in sync for retrieval-augmented context.
//!
//! # Enrichment Lifecycle
//!
//! ```text
//! Received -> Redacted -> Summarized -> ContextRetrieved -> Scored -> Persisted -> Indexed -> Done
//!     \__________\____________\_______________\______________\___________\________-> Errored
//! ```
//!
//! # Components
//!
//! - [`ingestion`]: sequential CDC reader dispatching one task per claim
//! - [`pipeline`]: the per-claim stage machine
//! - [`provider`]: the atomically switchable active AI provider
//! - [`fraud`]: the strict/lenient/fallback structured output parser
//! - [`ports`]: interfaces to the LLM, vector index, and claim store

pub mod adapters;
pub mod claim;
pub mod error;
pub mod event;
pub mod fraud;
pub mod ingestion;
pub mod metrics;
pub mod pipeline;
pub mod ports;
pub mod prompts;
pub mod provider;

pub use claim::{ClaimRecord, ClaimStatus, NewClaim};
pub use error::{CdcDecodeError, EnrichmentError, RegistryError};
pub use event::ClaimChangeEvent;
pub use fraud::{FraudParser, FraudResult, ParseTier, ScoringOutcome};
pub use ingestion::{
    CdcMessage, CdcSender, CdcSource, ChannelCdcSource, DispatchPolicy, IngestionLoop,
    IngestionStats, cdc_channel,
};
pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use pipeline::{
    EnrichmentOutcome, EnrichmentPipeline, EnrichmentReport, EnrichmentStage, PipelineConfig,
};
pub use ports::{
    ChatOptions, ClaimStorePort, EmbeddingPort, LlmPort, LlmRequest, VectorDocument,
    VectorIndexPort,
};
pub use provider::{
    AiProvider, ProviderBinding, ProviderBindings, ProviderRegistry, ProviderSelection,
    SwitchOutcome,
};
pub use adapters::InMemoryVectorIndex;

#[cfg(any(test, feature = "mock"))]
pub use ports::mock::{MockClaimStore, MockLlm, MockVectorIndex, StoreWrite};
