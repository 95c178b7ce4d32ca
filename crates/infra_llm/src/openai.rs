//! OpenAI client
//!
//! Chat completions with a system and a user message. OpenAI has no repeat
//! penalty; it is approximated with `frequency_penalty = repeat_penalty - 1`.

use async_trait::async_trait;
use core_kernel::{DomainPort, PortError};
use domain_enrichment::{EmbeddingPort, LlmPort, LlmRequest};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::http::{build_http_client, check_status, empty_response, LlmSettings};

const PROVIDER: &str = "openai";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f64>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Client for the OpenAI REST API, or any endpoint speaking its dialect
pub struct OpenAiClient {
    http: Client,
    settings: LlmSettings,
    api_key: String,
    label: String,
}

impl OpenAiClient {
    /// Fails with [`LlmError::Config`] when no API key is configured
    pub fn new(settings: LlmSettings) -> Result<Self, LlmError> {
        let api_key = settings.require_api_key(PROVIDER)?;
        let http = build_http_client(PROVIDER, settings.timeout_secs)?;
        let label = format!("{PROVIDER}/{}", settings.model);
        Ok(Self {
            http,
            settings,
            api_key,
            label,
        })
    }

    async fn chat(&self, request: &LlmRequest) -> Result<String, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system_prompt.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.user_prompt,
        });

        let body = ChatRequest {
            model: &self.settings.model,
            messages,
            temperature: request.options.temperature.value(),
            frequency_penalty: request
                .options
                .repeat_penalty
                .map(|penalty| (penalty - 1.0).clamp(-2.0, 2.0)),
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.settings.base_url()))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::from_reqwest(PROVIDER, self.settings.timeout_secs, e))?;
        let parsed: ChatResponse = check_status(PROVIDER, response)
            .await?
            .json()
            .await
            .map_err(|e| LlmError::from_reqwest(PROVIDER, self.settings.timeout_secs, e))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .unwrap_or_default();
        if content.is_empty() {
            warn!(model = %self.settings.model, "OpenAI returned no completion text");
        }
        Ok(content)
    }

    async fn embedding(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let response = self
            .http
            .post(format!("{}/embeddings", self.settings.base_url()))
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.settings.embedding_model,
                input: text,
            })
            .send()
            .await
            .map_err(|e| LlmError::from_reqwest(PROVIDER, self.settings.timeout_secs, e))?;
        let parsed: EmbeddingResponse = check_status(PROVIDER, response)
            .await?
            .json()
            .await
            .map_err(|e| LlmError::from_reqwest(PROVIDER, self.settings.timeout_secs, e))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .filter(|embedding| !embedding.is_empty())
            .ok_or_else(|| empty_response(PROVIDER, "embedding"))
    }
}

impl DomainPort for OpenAiClient {}

#[async_trait]
impl LlmPort for OpenAiClient {
    fn label(&self) -> &str {
        &self.label
    }

    async fn invoke(&self, request: LlmRequest) -> Result<String, PortError> {
        debug!(model = %self.settings.model, "Calling OpenAI chat completions");
        Ok(self.chat(&request).await?)
    }
}

#[async_trait]
impl EmbeddingPort for OpenAiClient {
    fn dimensions(&self) -> usize {
        self.settings.embedding_dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, PortError> {
        Ok(self.embedding(text).await?)
    }
}
