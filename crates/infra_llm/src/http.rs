//! Shared HTTP plumbing for the provider clients

use std::time::Duration;

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Maximum number of characters of an error body carried into [`LlmError::Api`]
const ERROR_BODY_LIMIT: usize = 320;

/// Connection settings for one provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Base URL of the provider API
    pub endpoint: String,
    /// Generation model name
    pub model: String,
    /// Embedding model name
    pub embedding_model: String,
    /// API key; required by OpenAI and Gemini
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Vector length produced by `embedding_model`
    pub embedding_dimensions: usize,
}

fn default_timeout_secs() -> u64 {
    60
}

impl LlmSettings {
    /// Creates settings with the default timeout and no API key
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        embedding_model: impl Into<String>,
        embedding_dimensions: usize,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            embedding_model: embedding_model.into(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            embedding_dimensions,
        }
    }

    /// Sets the API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the request timeout
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Endpoint without a trailing slash
    pub(crate) fn base_url(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }

    /// Returns the API key or a configuration error naming the provider
    pub(crate) fn require_api_key(&self, provider: &'static str) -> Result<String, LlmError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .ok_or_else(|| LlmError::Config(format!("{provider} API key is not configured")))
    }
}

pub(crate) fn build_http_client(provider: &'static str, timeout_secs: u64) -> Result<Client, LlmError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| LlmError::Config(format!("failed to build {provider} HTTP client: {e}")))
}

/// Passes 2xx responses through and turns everything else into [`LlmError::Api`]
pub(crate) async fn check_status(provider: &'static str, response: Response) -> Result<Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(LlmError::Api {
        provider,
        status,
        body: truncate(body.trim(), ERROR_BODY_LIMIT),
    })
}

pub(crate) fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut truncated: String = value.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}

pub(crate) fn empty_response(provider: &'static str, what: &str) -> LlmError {
    LlmError::Parse {
        provider,
        message: format!("response contained no {what}"),
    }
}
