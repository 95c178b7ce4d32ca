//! Claim intake and listing

use axum::{extract::State, http::StatusCode, Json};
use domain_enrichment::{CdcMessage, ClaimChangeEvent, NewClaim};
use tracing::{info, warn};
use validator::Validate;

use crate::dto::claims::*;
use crate::{error::ApiError, AppState};

/// Lists all claims, newest first
pub async fn list_claims(State(state): State<AppState>) -> Result<Json<Vec<ClaimResponse>>, ApiError> {
    let claims = state.claims.list_claims().await?;
    Ok(Json(claims.into_iter().map(ClaimResponse::from).collect()))
}

/// Files a new claim with status `OPEN`
///
/// With loopback enabled the stored row is also published to the CDC channel,
/// so enrichment starts without an external change-capture connector.
pub async fn create_claim(
    State(state): State<AppState>,
    Json(request): Json<CreateClaimRequest>,
) -> Result<(StatusCode, Json<CreateClaimResponse>), ApiError> {
    request.validate()?;
    if request.description.trim().is_empty() {
        return Err(ApiError::Validation("description must not be empty".to_string()));
    }

    let mut claim = NewClaim::new(request.description);
    if let Some(provider) = request.ai_provider.filter(|p| !p.trim().is_empty()) {
        claim = claim.with_provider(provider);
    }
    if let Some(temperature) = &request.ai_temperature {
        claim = claim.with_temperature(temperature.resolve()?);
    }

    let record = state.claims.create_claim(claim).await?;
    info!(
        claim.id = %record.id,
        ai.provider = record.ai_provider.as_deref().unwrap_or("default"),
        "Claim created"
    );

    if state.loopback {
        let message = CdcMessage::new(
            Some(record.id.value().to_string()),
            ClaimChangeEvent::envelope_for(&record),
        );
        if let Err(e) = state.cdc.publish(message).await {
            warn!(claim.id = %record.id, error = %e, "CDC loopback publish failed");
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(CreateClaimResponse {
            status: "success".to_string(),
            id: record.id.value(),
        }),
    ))
}
