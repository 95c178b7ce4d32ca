//! Gemini client
//!
//! `generateContent` and `embedContent` on the v1beta API. The API key is sent
//! as the `key` query parameter. Gemini has no repeat penalty option, so it is
//! dropped.

use async_trait::async_trait;
use core_kernel::{DomainPort, PortError};
use domain_enrichment::{EmbeddingPort, LlmPort, LlmRequest};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::LlmError;
use crate::http::{build_http_client, check_status, empty_response, LlmSettings};

const PROVIDER: &str = "gemini";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f64,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: String,
    content: Content<'a>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Option<EmbedValues>,
}

#[derive(Deserialize)]
struct EmbedValues {
    #[serde(default)]
    values: Vec<f32>,
}

/// Client for the Google Gemini API
pub struct GeminiClient {
    http: Client,
    settings: LlmSettings,
    api_key: String,
    label: String,
}

impl GeminiClient {
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

    fn model_url(&self, model: &str, method: &str) -> String {
        let model = model.trim_start_matches("models/");
        format!("{}/v1beta/models/{model}:{method}", self.settings.base_url())
    }

    async fn generate(&self, request: &LlmRequest) -> Result<String, LlmError> {
        let body = GenerateRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part {
                    text: &request.user_prompt,
                }],
            }],
            system_instruction: request.system_prompt.as_deref().map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
            generation_config: GenerationConfig {
                temperature: request.options.temperature.value(),
            },
        };

        let response = self
            .http
            .post(self.model_url(&self.settings.model, "generateContent"))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::from_reqwest(PROVIDER, self.settings.timeout_secs, e))?;
        let parsed: GenerateResponse = check_status(PROVIDER, response)
            .await?
            .json()
            .await
            .map_err(|e| LlmError::from_reqwest(PROVIDER, self.settings.timeout_secs, e))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let text = text.trim();
        if text.is_empty() {
            warn!(model = %self.settings.model, "Gemini returned no candidate text");
        }
        Ok(text.to_string())
    }

    async fn embedding(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let model = self.settings.embedding_model.trim_start_matches("models/");
        let body = EmbedRequest {
            model: format!("models/{model}"),
            content: Content {
                role: None,
                parts: vec![Part { text }],
            },
        };

        let response = self
            .http
            .post(self.model_url(model, "embedContent"))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::from_reqwest(PROVIDER, self.settings.timeout_secs, e))?;
        let parsed: EmbedResponse = check_status(PROVIDER, response)
            .await?
            .json()
            .await
            .map_err(|e| LlmError::from_reqwest(PROVIDER, self.settings.timeout_secs, e))?;

        parsed
            .embedding
            .map(|embedding| embedding.values)
            .filter(|values| !values.is_empty())
            .ok_or_else(|| empty_response(PROVIDER, "embedding"))
    }
}

impl DomainPort for GeminiClient {}

#[async_trait]
impl LlmPort for GeminiClient {
    fn label(&self) -> &str {
        &self.label
    }

    async fn invoke(&self, request: LlmRequest) -> Result<String, PortError> {
        debug!(model = %self.settings.model, "Calling Gemini generateContent");
        Ok(self.generate(&request).await?)
    }
}

#[async_trait]
impl EmbeddingPort for GeminiClient {
    fn dimensions(&self) -> usize {
        self.settings.embedding_dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, PortError> {
        Ok(self.embedding(text).await?)
    }
}
