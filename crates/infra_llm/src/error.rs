//! LLM client errors

use core_kernel::PortError;
use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised by the provider HTTP clients
#[derive(Debug, Error)]
pub enum LlmError {
    /// Missing API key or unusable endpoint
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection failed before a response arrived
    #[error("Network error: {0}")]
    Network(String),

    /// The request exceeded the client timeout
    #[error("Request to {provider} timed out after {timeout_secs}s")]
    Timeout { provider: &'static str, timeout_secs: u64 },

    /// Non-2xx response
    #[error("{provider} error {status}: {body}")]
    Api {
        provider: &'static str,
        status: StatusCode,
        body: String,
    },

    /// The response body did not have the expected shape
    #[error("Invalid {provider} response: {message}")]
    Parse {
        provider: &'static str,
        message: String,
    },
}

impl LlmError {
    pub(crate) fn from_reqwest(provider: &'static str, timeout_secs: u64, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            LlmError::Timeout {
                provider,
                timeout_secs,
            }
        } else if error.is_decode() {
            LlmError::Parse {
                provider,
                message: error.to_string(),
            }
        } else {
            LlmError::Network(format!("{provider} request failed: {error}"))
        }
    }
}

impl From<LlmError> for PortError {
    fn from(error: LlmError) -> Self {
        match error {
            LlmError::Config(message) => PortError::validation(message),
            LlmError::Network(message) => PortError::connection(message),
            LlmError::Timeout {
                provider,
                timeout_secs,
            } => PortError::Timeout {
                operation: format!("{provider} request"),
                duration_ms: timeout_secs * 1000,
            },
            LlmError::Api {
                provider,
                status,
                body,
            } => match status.as_u16() {
                404 => PortError::not_found("Model endpoint", provider),
                401 | 403 => PortError::Unauthorized {
                    message: format!("{provider}: {body}"),
                },
                429 => PortError::RateLimited {
                    retry_after_secs: 60,
                },
                500..=599 => PortError::ServiceUnavailable {
                    service: format!("{provider} ({status})"),
                },
                _ => PortError::Internal {
                    message: format!("{provider} error {status}: {body}"),
                    source: None,
                },
            },
            LlmError::Parse { provider, message } => {
                PortError::transformation(format!("Invalid {provider} response: {message}"))
            }
        }
    }
}
