//! Postgres pool setup and the embedded schema
//!
//! The schema holds the legacy `claims` table plus one pgvector table per
//! provider (`claim_vectors_ollama`, `claim_vectors_gemini`, `claim_vectors_openai`).

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::error::DatabaseError;

pub type DatabasePool = PgPool;

/// Pool sizing for the claims database
///
/// ```rust
/// use std::time::Duration;
/// use infra_db::DatabaseConfig;
///
/// let config = DatabaseConfig::new("postgres://enricher:secret@db:5432/claims")
///     .max_connections(20)
///     .connect_timeout(Duration::from_secs(5));
/// assert_eq!(config.max_connections, 20);
/// assert_eq!(config.log_target(), "db:5432/claims");
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long an enrichment write waits for a free connection
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 2,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }

    pub fn max_connections(self, max_connections: u32) -> Self {
        Self { max_connections, ..self }
    }

    pub fn min_connections(self, min_connections: u32) -> Self {
        Self { min_connections, ..self }
    }

    pub fn connect_timeout(self, connect_timeout: Duration) -> Self {
        Self { connect_timeout, ..self }
    }

    /// Host and database portion of the URL, without credentials
    pub fn log_target(&self) -> &str {
        let without_scheme = self.url.split_once("://").map_or(self.url.as_str(), |(_, rest)| rest);
        without_scheme
            .rsplit_once('@')
            .map_or(without_scheme, |(_, host)| host)
    }
}

pub async fn create_pool(config: DatabaseConfig) -> Result<DatabasePool, DatabaseError> {
    info!(
        host = config.log_target(),
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Connecting to claims database"
    );

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections.min(config.max_connections))
        .acquire_timeout(config.connect_timeout)
        .idle_timeout(config.idle_timeout)
        .connect(&config.url)
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))
}

/// Creates the `vector` extension, the claims table and the provider vector
/// tables if they are missing.
pub async fn run_migrations(pool: &DatabasePool) -> Result<(), DatabaseError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
    info!("Claims schema is up to date");
    Ok(())
}
