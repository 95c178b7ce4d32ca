//! Provider switch DTOs

use serde::{Deserialize, Serialize};

use super::TemperatureInput;

#[derive(Debug, Deserialize)]
pub struct SetProviderRequest {
    pub provider: String,
    pub temperature: Option<TemperatureInput>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetProviderResponse {
    pub status: String,
    pub provider: String,
}

/// Temperature is rendered as text, matching what the UI already parses
#[derive(Debug, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub provider: String,
    pub temperature: String,
}
