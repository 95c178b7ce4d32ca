//! Builds provider bindings from configuration

use std::sync::Arc;

use async_trait::async_trait;
use config::ConfigError;
use core_kernel::{DomainPort, PortError};
use domain_enrichment::{
    AiProvider, EmbeddingPort, InMemoryVectorIndex, LlmPort, LlmRequest, ProviderBinding,
    ProviderBindings, VectorIndexPort,
};
use infra_db::{DatabasePool, PgVectorIndex};
use infra_llm::{GeminiClient, LlmError, LlmSettings, OllamaClient, OpenAiClient};
use tracing::{info, warn};

use crate::config::{AppConfig, VectorStoreMode};

type ClientPair = (Arc<dyn LlmPort>, Arc<dyn EmbeddingPort>);

/// Stand-in for a provider whose client could not be built
///
/// Keeps the registry table complete; claims routed here end in `Errored`.
pub struct UnavailableProvider {
    label: String,
    reason: String,
    dimensions: usize,
}

impl UnavailableProvider {
    pub fn new(provider: AiProvider, reason: impl Into<String>, dimensions: usize) -> Self {
        Self {
            label: format!("{provider}/unavailable"),
            reason: reason.into(),
            dimensions,
        }
    }

    fn error(&self) -> PortError {
        PortError::ServiceUnavailable {
            service: format!("{} ({})", self.label, self.reason),
        }
    }
}

impl DomainPort for UnavailableProvider {}

#[async_trait]
impl LlmPort for UnavailableProvider {
    fn label(&self) -> &str {
        &self.label
    }

    async fn invoke(&self, _request: LlmRequest) -> Result<String, PortError> {
        Err(self.error())
    }
}

#[async_trait]
impl EmbeddingPort for UnavailableProvider {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>, PortError> {
        Err(self.error())
    }
}

fn pair<C: LlmPort + EmbeddingPort>(client: C) -> ClientPair {
    let client = Arc::new(client);
    (client.clone(), client)
}

fn build_client(provider: AiProvider, settings: &LlmSettings) -> Result<ClientPair, LlmError> {
    match provider {
        AiProvider::Ollama => OllamaClient::new(settings.clone()).map(pair),
        AiProvider::Gemini => GeminiClient::new(settings.clone()).map(pair),
        AiProvider::OpenAi => OpenAiClient::new(settings.clone()).map(pair),
    }
}

/// Client pair for a provider, or an [`UnavailableProvider`] when it cannot be built
pub fn provider_clients(provider: AiProvider, settings: &LlmSettings) -> ClientPair {
    build_client(provider, settings).unwrap_or_else(|e| {
        warn!(
            ai.provider = %provider,
            error = %e,
            "Provider unavailable; claims routed to it will error"
        );
        pair(UnavailableProvider::new(
            provider,
            e.to_string(),
            settings.embedding_dimensions,
        ))
    })
}

/// Builds the static provider table
///
/// `pool` is required when the vector store mode is `pgvector`.
pub fn build_bindings(config: &AppConfig, pool: Option<&DatabasePool>) -> Result<ProviderBindings, ConfigError> {
    let mode = config.vector_store.mode;
    if mode == VectorStoreMode::Pgvector && pool.is_none() {
        return Err(ConfigError::Message(
            "vector_store.mode = pgvector requires a database pool".to_string(),
        ));
    }

    let binding = |provider: AiProvider| -> ProviderBinding {
        let (llm, embedder) = provider_clients(provider, config.providers.get(provider));
        let index: Arc<dyn VectorIndexPort> = match pool {
            Some(pool) if mode == VectorStoreMode::Pgvector => {
                Arc::new(PgVectorIndex::new(pool.clone(), provider, embedder))
            }
            _ => Arc::new(InMemoryVectorIndex::new(format!("{provider}-claims"))),
        };
        info!(ai.provider = %provider, llm = llm.label(), index = index.index_name(), "Provider bound");
        ProviderBinding::new(llm, index)
    };

    Ok(ProviderBindings::new(
        binding(AiProvider::Ollama),
        binding(AiProvider::Gemini),
        binding(AiProvider::OpenAi),
    ))
}
