//! Ollama client
//!
//! Uses the non-streaming `/api/generate` endpoint; the system prompt travels
//! in the dedicated `system` field and the repeat penalty maps directly onto
//! Ollama's `repeat_penalty` option.

use async_trait::async_trait;
use core_kernel::{DomainPort, PortError};
use domain_enrichment::{EmbeddingPort, LlmPort, LlmRequest};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::http::{build_http_client, check_status, empty_response, LlmSettings};

const PROVIDER: &str = "ollama";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    repeat_penalty: Option<f64>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    embedding: Vec<f32>,
}

/// Client for a local or remote Ollama server
pub struct OllamaClient {
    http: Client,
    settings: LlmSettings,
    label: String,
}

impl OllamaClient {
    pub fn new(settings: LlmSettings) -> Result<Self, LlmError> {
        let http = build_http_client(PROVIDER, settings.timeout_secs)?;
        let label = format!("{PROVIDER}/{}", settings.model);
        Ok(Self { http, settings, label })
    }

    async fn generate(&self, request: &LlmRequest) -> Result<String, LlmError> {
        let body = GenerateRequest {
            model: &self.settings.model,
            prompt: &request.user_prompt,
            system: request.system_prompt.as_deref(),
            stream: false,
            options: GenerateOptions {
                temperature: request.options.temperature.value(),
                repeat_penalty: request.options.repeat_penalty,
            },
        };

        let response = self
            .http
            .post(format!("{}/api/generate", self.settings.base_url()))
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::from_reqwest(PROVIDER, self.settings.timeout_secs, e))?;
        let parsed: GenerateResponse = check_status(PROVIDER, response)
            .await?
            .json()
            .await
            .map_err(|e| LlmError::from_reqwest(PROVIDER, self.settings.timeout_secs, e))?;

        let text = parsed.response.trim();
        if text.is_empty() {
            warn!(model = %self.settings.model, "Ollama returned no generated text");
        }
        Ok(text.to_string())
    }

    async fn embedding(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let response = self
            .http
            .post(format!("{}/api/embeddings", self.settings.base_url()))
            .json(&EmbeddingRequest {
                model: &self.settings.embedding_model,
                prompt: text,
            })
            .send()
            .await
            .map_err(|e| LlmError::from_reqwest(PROVIDER, self.settings.timeout_secs, e))?;
        let parsed: EmbeddingResponse = check_status(PROVIDER, response)
            .await?
            .json()
            .await
            .map_err(|e| LlmError::from_reqwest(PROVIDER, self.settings.timeout_secs, e))?;

        if parsed.embedding.is_empty() {
            return Err(empty_response(PROVIDER, "embedding"));
        }
        Ok(parsed.embedding)
    }
}

impl DomainPort for OllamaClient {}

#[async_trait]
impl LlmPort for OllamaClient {
    fn label(&self) -> &str {
        &self.label
    }

    async fn invoke(&self, request: LlmRequest) -> Result<String, PortError> {
        debug!(model = %self.settings.model, "Calling Ollama generate");
        Ok(self.generate(&request).await?)
    }
}

#[async_trait]
impl EmbeddingPort for OllamaClient {
    fn dimensions(&self) -> usize {
        self.settings.embedding_dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, PortError> {
        Ok(self.embedding(text).await?)
    }
}
