//! Per-claim enrichment stage machine
//!
//! Each claim moves through
//! `Received -> Redacted -> Summarized -> ContextRetrieved -> Scored -> Persisted -> Indexed -> Done`,
//! with `Errored` reachable from every non-terminal stage. Writes committed by
//! earlier stages are never rolled back; a claim left half-enriched is picked
//! up again when the same row is redelivered with an empty summary.
//!
//! Retrieval and index sync are best-effort: a failed search continues with
//! an empty context, and a failed upsert skips `Indexed` and still reaches
//! `Done`.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, info_span, warn, Instrument};

use core_kernel::{ClaimId, Temperature};
use domain_governance::Redactor;

use crate::error::EnrichmentError;
use crate::event::ClaimChangeEvent;
use crate::fraud::{FraudParser, FraudResult};
use crate::metrics::PipelineMetrics;
use crate::ports::{ChatOptions, ClaimStorePort, LlmRequest, VectorDocument};
use crate::prompts;
use crate::provider::{AiProvider, ProviderRegistry, ProviderSelection};

/// Stage of one claim's enrichment run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStage {
    Received,
    Redacted,
    Summarized,
    ContextRetrieved,
    Scored,
    Persisted,
    Indexed,
    Done,
    Errored,
}

impl EnrichmentStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, EnrichmentStage::Done | EnrichmentStage::Errored)
    }

    pub fn can_transition_to(&self, target: EnrichmentStage) -> bool {
        use EnrichmentStage::*;
        matches!(
            (*self, target),
            (Received, Redacted) |
            (Received, Done) |
            (Redacted, Summarized) |
            (Summarized, ContextRetrieved) |
            (ContextRetrieved, Scored) |
            (Scored, Persisted) |
            (Persisted, Indexed) |
            (Persisted, Done) |
            (Indexed, Done)
        ) || (!self.is_terminal() && target == Errored)
    }
}

impl fmt::Display for EnrichmentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Tunables of the enrichment run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Number of similar claims retrieved as context
    pub top_k: usize,
    /// Repetition penalty for the fraud-scoring call
    pub repeat_penalty: f64,
    /// Temperature for the fraud-scoring call, independent of the selection
    pub scoring_temperature: Temperature,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            repeat_penalty: 1.1,
            scoring_temperature: Temperature::ZERO,
        }
    }
}

/// What one completed run produced
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentOutcome {
    pub summary: String,
    pub fraud: FraudResult,
    pub historical_context_used: bool,
}

/// Trace of a single claim's run
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentReport {
    pub claim_id: ClaimId,
    pub provider: Option<AiProvider>,
    pub stages: Vec<EnrichmentStage>,
    pub skipped: bool,
    pub outcome: Option<EnrichmentOutcome>,
    pub error: Option<String>,
}

impl EnrichmentReport {
    fn skipped(claim_id: ClaimId) -> Self {
        Self {
            claim_id,
            provider: None,
            stages: vec![EnrichmentStage::Received, EnrichmentStage::Done],
            skipped: true,
            outcome: None,
            error: None,
        }
    }

    pub fn final_stage(&self) -> EnrichmentStage {
        self.stages
            .last()
            .copied()
            .unwrap_or(EnrichmentStage::Received)
    }

    pub fn is_done(&self) -> bool {
        self.final_stage() == EnrichmentStage::Done
    }

    pub fn is_errored(&self) -> bool {
        self.final_stage() == EnrichmentStage::Errored
    }

    pub fn visited(&self, stage: EnrichmentStage) -> bool {
        self.stages.contains(&stage)
    }
}

struct StageTracker {
    claim_id: ClaimId,
    stages: Vec<EnrichmentStage>,
}

impl StageTracker {
    fn new(claim_id: ClaimId) -> Self {
        Self {
            claim_id,
            stages: vec![EnrichmentStage::Received],
        }
    }

    fn current(&self) -> EnrichmentStage {
        self.stages
            .last()
            .copied()
            .unwrap_or(EnrichmentStage::Received)
    }

    fn advance(&mut self, next: EnrichmentStage) -> Result<(), EnrichmentError> {
        let current = self.current();
        if !current.can_transition_to(next) {
            return Err(EnrichmentError::InvalidStageTransition {
                from: current.to_string(),
                to: next.to_string(),
            });
        }
        debug!(claim_id = %self.claim_id, from = %current, to = %next, "Stage transition");
        self.stages.push(next);
        Ok(())
    }
}

/// Drives claims through the enrichment stages
pub struct EnrichmentPipeline {
    registry: Arc<ProviderRegistry>,
    store: Arc<dyn ClaimStorePort>,
    redactor: Redactor,
    parser: FraudParser,
    config: PipelineConfig,
    metrics: Arc<PipelineMetrics>,
}

impl EnrichmentPipeline {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        store: Arc<dyn ClaimStorePort>,
        config: PipelineConfig,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            registry,
            store,
            redactor: Redactor::standard(),
            parser: FraudParser::new(),
            config,
            metrics,
        }
    }

    pub fn with_redactor(mut self, redactor: Redactor) -> Self {
        self.redactor = redactor;
        self
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.metrics
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Idempotency gate: counts the event and reports whether it is a skip
    pub fn admit(&self, event: &ClaimChangeEvent) -> bool {
        self.metrics.record_received();
        if event.has_prior_summary() {
            debug!(claim_id = %event.claim_id, "Claim already has a summary, skipping");
            self.metrics.record_skipped();
            return false;
        }
        true
    }

    /// Runs one claim to a terminal stage
    pub async fn process(&self, event: ClaimChangeEvent) -> EnrichmentReport {
        self.process_keyed(event, None).await
    }

    /// Runs one claim, tagging the span with the CDC partition key
    pub async fn process_keyed(&self, event: ClaimChangeEvent, cdc_key: Option<String>) -> EnrichmentReport {
        if !self.admit(&event) {
            return EnrichmentReport::skipped(event.claim_id);
        }
        self.enrich(event, cdc_key).await
    }

    /// Runs an admitted claim; callers must have passed it through [`admit`](Self::admit)
    pub async fn enrich(&self, event: ClaimChangeEvent, cdc_key: Option<String>) -> EnrichmentReport {
        let snapshot = self.registry.current();
        let selection = self.registry.resolve_for_claim(
            &snapshot,
            event.requested_provider.as_deref(),
            event.requested_temperature,
        );

        let span = info_span!(
            "claim.enrichment",
            claim.id = %event.claim_id,
            ai.provider = %selection.provider,
            cdc.key = cdc_key.as_deref().unwrap_or(""),
        );

        self.run(event, selection).instrument(span).await
    }

    async fn run(&self, event: ClaimChangeEvent, selection: ProviderSelection) -> EnrichmentReport {
        let claim_id = event.claim_id;
        let mut tracker = StageTracker::new(claim_id);

        info!(
            temperature = selection.temperature.value(),
            "Processing enrichment for claim"
        );

        let result = self.run_stages(&event, &selection, &mut tracker).await;

        let (outcome, error) = match result {
            Ok(outcome) => {
                self.metrics.record_completed();
                info!(event = "pipeline.complete", "Claim enrichment complete");
                (Some(outcome), None)
            }
            Err(e) => {
                tracker.stages.push(EnrichmentStage::Errored);
                self.metrics.record_errored();
                error!(
                    event = "pipeline.errored",
                    error = %e,
                    transient = e.is_transient(),
                    "Claim enrichment failed"
                );
                (None, Some(e.to_string()))
            }
        };

        EnrichmentReport {
            claim_id,
            provider: Some(selection.provider),
            stages: tracker.stages,
            skipped: false,
            outcome,
            error,
        }
    }

    async fn run_stages(
        &self,
        event: &ClaimChangeEvent,
        selection: &ProviderSelection,
        tracker: &mut StageTracker,
    ) -> Result<EnrichmentOutcome, EnrichmentError> {
        let claim_id = event.claim_id;
        let llm = self.registry.llm_for(selection.provider);

        let redacted = self.redactor.redact(&event.description);
        tracker.advance(EnrichmentStage::Redacted)?;

        let summary_request = LlmRequest::user(
            prompts::summary_prompt(&redacted),
            ChatOptions::with_temperature(selection.temperature),
        );
        let summary = llm
            .invoke(summary_request)
            .await
            .map_err(|source| EnrichmentError::Summarization { claim_id, source })?;

        self.store
            .update_summary(claim_id, &summary)
            .await
            .map_err(|source| EnrichmentError::Persistence {
                claim_id,
                field: "summary",
                source,
            })?;
        info!(event = "summary.persisted", "Summary written to claim store");
        tracker.advance(EnrichmentStage::Summarized)?;

        let (context, historical_context_used) =
            match selection.index.search(&redacted, self.config.top_k).await {
                Ok(documents) => {
                    info!(
                        event = "context.retrieved",
                        matches = documents.len(),
                        "Retrieved similar claims"
                    );
                    let used = !documents.is_empty();
                    (prompts::historical_context(&documents), used)
                }
                Err(e) => {
                    self.metrics.record_degraded_retrieval();
                    warn!(
                        event = "context.degraded",
                        error = %e,
                        "Similarity search failed, continuing without context"
                    );
                    (prompts::NO_PRIOR_CLAIMS.to_string(), false)
                }
            };
        tracker.advance(EnrichmentStage::ContextRetrieved)?;

        let scoring_options = ChatOptions::with_temperature(self.config.scoring_temperature)
            .repeat_penalty(self.config.repeat_penalty);
        let scoring_request = LlmRequest::user(prompts::fraud_prompt(&redacted, &context), scoring_options)
            .with_system(prompts::fraud_system_prompt());

        let scored = self
            .parser
            .score(llm.as_ref(), scoring_request)
            .await
            .map_err(|source| EnrichmentError::Scoring { claim_id, source })?;

        if scored.attempts > 1 {
            self.metrics.record_retry();
        }
        if scored.is_fallback() {
            self.metrics.record_fraud_fallback();
            warn!(event = "fraud.fallback", attempts = scored.attempts, "Using fallback fraud result");
        } else {
            info!(
                event = "fraud.scored",
                score = scored.result.score(),
                tier = ?scored.tier,
                attempts = scored.attempts,
                "Fraud score computed"
            );
        }
        tracker.advance(EnrichmentStage::Scored)?;

        self.store
            .update_fraud_result(claim_id, &scored.result)
            .await
            .map_err(|source| EnrichmentError::Persistence {
                claim_id,
                field: "fraud",
                source,
            })?;
        tracker.advance(EnrichmentStage::Persisted)?;

        let document = VectorDocument::claim_summary(summary.clone(), claim_id);
        match selection.index.upsert(vec![document]).await {
            Ok(()) => {
                info!(
                    event = "vector.store.sync",
                    index = selection.index.index_name(),
                    "Saved claim vector"
                );
                tracker.advance(EnrichmentStage::Indexed)?;
            }
            Err(e) => {
                self.metrics.record_index_sync_failure();
                error!(
                    event = "vector.store.sync_failed",
                    index = selection.index.index_name(),
                    error = %e,
                    "Vector store sync failed"
                );
            }
        }
        tracker.advance(EnrichmentStage::Done)?;

        Ok(EnrichmentOutcome {
            summary,
            fraud: scored.result,
            historical_context_used,
        })
    }
}

impl fmt::Debug for EnrichmentPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnrichmentPipeline")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}
