//! Pipeline monitoring

use axum::{extract::State, Json};
use domain_enrichment::MetricsSnapshot;
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub provider: String,
    pub temperature: f64,
    pub in_flight: u64,
    #[serde(flatten)]
    pub counters: MetricsSnapshot,
}

/// Pipeline counters plus the active selection
pub async fn pipeline_metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    let current = state.registry.current();
    let counters = state.metrics.snapshot();
    Json(MetricsResponse {
        provider: current.provider.to_string(),
        temperature: current.temperature.value(),
        in_flight: counters.in_flight(),
        counters,
    })
}
