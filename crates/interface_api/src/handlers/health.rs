//! Health check handlers

use axum::{extract::State, http::StatusCode, Json};
use core_kernel::HealthCheckResult;
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub claim_store: HealthCheckResult,
    pub ingestion_open: bool,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check (claim store and ingestion channel)
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let claim_store = state.claims.health_check().await;
    let ingestion_open = !state.cdc.is_closed();
    let ready = claim_store.is_operational() && ingestion_open;

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(ReadinessResponse {
            status: if ready { "ready" } else { "not_ready" }.to_string(),
            claim_store,
            ingestion_open,
        }),
    )
}
