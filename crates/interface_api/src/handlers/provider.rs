//! Runtime provider switching

use axum::{extract::State, Json};
use core_kernel::Temperature;
use tracing::info;

use crate::dto::provider::*;
use crate::{error::ApiError, AppState};

/// Returns the active provider and temperature
pub async fn get_provider(State(state): State<AppState>) -> Json<ProviderResponse> {
    let current = state.registry.current();
    Json(ProviderResponse {
        provider: current.provider.to_string(),
        temperature: current.temperature.to_string(),
    })
}

/// Switches the active provider
///
/// The temperature is validated before the registry is touched; an absent
/// temperature means the default of 0.3.
pub async fn set_provider(
    State(state): State<AppState>,
    Json(request): Json<SetProviderRequest>,
) -> Result<Json<SetProviderResponse>, ApiError> {
    let temperature = match &request.temperature {
        Some(input) => input.resolve()?,
        None => Temperature::DEFAULT,
    };

    let outcome = state.registry.switch(&request.provider, temperature)?;
    info!(
        ai.provider = %outcome.provider(),
        ai.temperature = temperature.value(),
        outcome = ?outcome,
        "AI provider switch requested"
    );

    Ok(Json(SetProviderResponse {
        status: "success".to_string(),
        provider: outcome.provider().to_string(),
    }))
}
