//! HTTP API Layer
//!
//! The configuration and intake surface of the claims enrichment service,
//! built on Axum.
//!
//! # Routes
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | GET | `/health` | Liveness |
//! | GET | `/health/ready` | Claim store and ingestion readiness |
//! | GET, POST | `/api/claims` | List claims, file a claim |
//! | GET, POST | `/api/config/ai-provider` | Read or switch the active provider |
//! | POST | `/api/cdc/claims` | Enqueue a raw CDC message |
//! | GET | `/api/monitoring/metrics` | Pipeline counters |
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let app = create_router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod wiring;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use domain_enrichment::{CdcSender, ClaimStorePort, PipelineMetrics, ProviderRegistry};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{cdc, claims, health, monitoring, provider};
use crate::middleware::audit_middleware;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ProviderRegistry>,
    pub claims: Arc<dyn ClaimStorePort>,
    pub cdc: CdcSender,
    pub metrics: Arc<PipelineMetrics>,
    /// Publish claims created through the API to the CDC channel
    pub loopback: bool,
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let api_routes = Router::new()
        .route("/claims", get(claims::list_claims).post(claims::create_claim))
        .route(
            "/config/ai-provider",
            get(provider::get_provider).post(provider::set_provider),
        )
        .route("/cdc/claims", post(cdc::ingest_claim_change))
        .route("/monitoring/metrics", get(monitoring::pipeline_metrics))
        .layer(axum_middleware::from_fn(audit_middleware));

    // Outermost first: the request id exists before tracing and audit see it
    let layers = ServiceBuilder::new()
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .map_response(axum::response::IntoResponse::into_response)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id());

    Router::new()
        .merge(public_routes)
        .nest("/api", api_routes)
        .layer(layers)
        .with_state(state)
}
