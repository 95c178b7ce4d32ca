//! Pipeline Test Harness
//!
//! Wires an [`EnrichmentPipeline`] over the mock ports so tests only replace
//! the pieces they care about.

use std::sync::Arc;

use domain_enrichment::{
    AiProvider, EnrichmentPipeline, MockClaimStore, MockLlm, MockVectorIndex, PipelineConfig,
    PipelineMetrics, ProviderBinding, ProviderBindings, ProviderRegistry,
};

use crate::fixtures::LlmReplyFixtures;

/// A summarise-then-score script for one claim
pub fn scripted_llm(provider: AiProvider, summary: &str, fraud_reply: &str) -> MockLlm {
    MockLlm::new(provider.as_str())
        .reply(summary)
        .reply(fraud_reply)
        .with_default(LlmReplyFixtures::fraud_strict())
}

/// Builder for [`EnrichmentHarness`]
pub struct HarnessBuilder {
    llms: [Option<MockLlm>; 3],
    indexes: [Option<MockVectorIndex>; 3],
    store: MockClaimStore,
    config: PipelineConfig,
}

impl HarnessBuilder {
    /// Replaces the LLM bound to a provider
    pub fn llm(mut self, provider: AiProvider, llm: MockLlm) -> Self {
        self.llms[slot(provider)] = Some(llm);
        self
    }

    /// Replaces the vector index bound to a provider
    pub fn index(mut self, provider: AiProvider, index: MockVectorIndex) -> Self {
        self.indexes[slot(provider)] = Some(index);
        self
    }

    pub fn store(mut self, store: MockClaimStore) -> Self {
        self.store = store;
        self
    }

    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(mut self) -> EnrichmentHarness {
        let llms = AiProvider::ALL.map(|provider| {
            Arc::new(self.llms[slot(provider)].take().unwrap_or_else(|| {
                scripted_llm(provider, LlmReplyFixtures::summary(), LlmReplyFixtures::fraud_strict())
            }))
        });
        let indexes = AiProvider::ALL.map(|provider| {
            Arc::new(
                self.indexes[slot(provider)]
                    .take()
                    .unwrap_or_else(|| MockVectorIndex::new(format!("{provider}-index"))),
            )
        });
        let binding = |provider: AiProvider| {
            ProviderBinding::new(llms[slot(provider)].clone(), indexes[slot(provider)].clone())
        };

        let registry = Arc::new(ProviderRegistry::with_defaults(ProviderBindings::new(
            binding(AiProvider::Ollama),
            binding(AiProvider::Gemini),
            binding(AiProvider::OpenAi),
        )));
        let store = Arc::new(self.store);
        let metrics = Arc::new(PipelineMetrics::new());
        let pipeline = Arc::new(EnrichmentPipeline::new(
            registry.clone(),
            store.clone(),
            self.config,
            metrics.clone(),
        ));

        EnrichmentHarness {
            llms,
            indexes,
            store,
            metrics,
            registry,
            pipeline,
        }
    }
}

/// A pipeline plus handles to every mock behind it
pub struct EnrichmentHarness {
    llms: [Arc<MockLlm>; 3],
    indexes: [Arc<MockVectorIndex>; 3],
    pub store: Arc<MockClaimStore>,
    pub metrics: Arc<PipelineMetrics>,
    pub registry: Arc<ProviderRegistry>,
    pub pipeline: Arc<EnrichmentPipeline>,
}

impl EnrichmentHarness {
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder {
            llms: [None, None, None],
            indexes: [None, None, None],
            store: MockClaimStore::new(),
            config: PipelineConfig::default(),
        }
    }

    /// Harness with scripted defaults for every provider
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn llm(&self, provider: AiProvider) -> &Arc<MockLlm> {
        &self.llms[slot(provider)]
    }

    pub fn index(&self, provider: AiProvider) -> &Arc<MockVectorIndex> {
        &self.indexes[slot(provider)]
    }
}

impl Default for EnrichmentHarness {
    fn default() -> Self {
        Self::new()
    }
}

fn slot(provider: AiProvider) -> usize {
    match provider {
        AiProvider::Ollama => 0,
        AiProvider::Gemini => 1,
        AiProvider::OpenAi => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_enrichment::ClaimChangeEvent;
    use core_kernel::ClaimId;

    #[tokio::test]
    async fn test_default_harness_enriches() {
        let harness = EnrichmentHarness::new();
        let report = harness
            .pipeline
            .process(ClaimChangeEvent::new(ClaimId::new(1), "Car hit a deer."))
            .await;

        assert!(report.is_done());
        assert_eq!(harness.llm(AiProvider::Ollama).call_count(), 2);
        assert_eq!(harness.index(AiProvider::Ollama).documents().len(), 1);
        assert_eq!(harness.llm(AiProvider::OpenAi).call_count(), 0);
    }
}
