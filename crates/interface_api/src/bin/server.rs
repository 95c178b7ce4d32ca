//! Claims Enrichment Service - Server Binary
//!
//! Starts the HTTP surface and the CDC ingestion loop in one process.
//!
//! # Usage
//!
//! ```bash
//! # Run with defaults (in-memory vector index, local Ollama)
//! cargo run --bin claims-enrichment
//!
//! # Override settings through the environment
//! ENRICH_SERVER__PORT=9090 ENRICH_VECTOR_STORE__MODE=pgvector \
//!   ENRICH_PROVIDERS__OPENAI__API_KEY=sk-... cargo run --bin claims-enrichment
//! ```
//!
//! Settings are read from `config/enrichment.toml` when present; see
//! `interface_api::config` for every key.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use domain_enrichment::{
    cdc_channel, ClaimStorePort, EnrichmentPipeline, IngestionLoop, PipelineMetrics,
    ProviderRegistry,
};
use infra_db::{create_pool, run_migrations, ClaimsRepository};
use interface_api::config::{AppConfig, LogFormat, ServerConfig};
use interface_api::wiring::build_bindings;
use interface_api::{create_router, AppState};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.server);

    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        vector_store = ?config.vector_store.mode,
        "Starting claims enrichment service"
    );

    let pool = create_pool(config.database.pool_config())
        .await
        .context("Failed to connect to the claims database")?;
    run_migrations(&pool).await.context("Failed to apply migrations")?;

    let bindings = build_bindings(&config, Some(&pool))?;
    let (provider, temperature) = config.pipeline.initial_selection()?;
    let registry = Arc::new(ProviderRegistry::new(bindings, provider, temperature));
    let claims: Arc<dyn ClaimStorePort> = Arc::new(ClaimsRepository::new(pool.clone()));
    let metrics = Arc::new(PipelineMetrics::new());
    let pipeline = Arc::new(EnrichmentPipeline::new(
        registry.clone(),
        claims.clone(),
        config.pipeline.pipeline_config()?,
        metrics.clone(),
    ));

    let (cdc, source) = cdc_channel(config.cdc.channel_capacity);
    let (stop_ingestion, ingestion_stopped) = oneshot::channel::<()>();
    let ingestion = tokio::spawn(
        IngestionLoop::new(source, pipeline)
            .with_policy(config.pipeline.dispatch_policy())
            .run_until(async {
                let _ = ingestion_stopped.await;
            }),
    );

    let app = create_router(AppState {
        registry,
        claims,
        cdc,
        metrics,
        loopback: config.cdc.loopback,
    });

    let addr: SocketAddr = config.server_addr().parse()?;
    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = stop_ingestion.send(());
    let stats = ingestion.await.context("Ingestion loop panicked")?;
    tracing::info!(?stats, "Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&server.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match server.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init(),
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
