//! Throwaway pgvector database for adapter tests
//!
//! Requires Docker. Migrations are left to the caller so this crate does not
//! depend on `infra_db`.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;

type StartError = Box<dyn std::error::Error + Send + Sync>;

/// PostgreSQL 16 with the `vector` extension installable
const IMAGE: (&str, &str) = ("pgvector/pgvector", "pg16");
const CREDENTIALS: (&str, &str) = ("postgres", "postgres");
const DATABASE: &str = "claims_test";

/// Truncation order: vector tables before the claims they reference
const ENRICHMENT_TABLES: [&str; 4] = [
    "claim_vectors_ollama",
    "claim_vectors_gemini",
    "claim_vectors_openai",
    "claims",
];

fn connection_url(host: &str, port: u16) -> String {
    let (user, password) = CREDENTIALS;
    format!("postgres://{user}:{password}@{host}:{port}/{DATABASE}")
}

/// Container handle plus a connected pool; the container stops on drop
pub struct TestDatabase {
    _container: ContainerAsync<Postgres>,
    url: String,
    pool: PgPool,
}

impl TestDatabase {
    pub async fn start() -> Result<Self, StartError> {
        let (user, password) = CREDENTIALS;
        let (image, tag) = IMAGE;
        let container = Postgres::default()
            .with_user(user)
            .with_password(password)
            .with_db_name(DATABASE)
            .with_name(image)
            .with_tag(tag)
            .start()
            .await?;

        let host = container.get_host().await?.to_string();
        let port = container.get_host_port_ipv4(5432).await?;
        let url = connection_url(&host, port);

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&url)
            .await?;

        Ok(Self {
            _container: container,
            url,
            pool,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Empties claims and vectors, keeping the migrated schema
    pub async fn clear_data(&self) -> Result<(), sqlx::Error> {
        let tables = ENRICHMENT_TABLES.join(", ");
        sqlx::query(&format!("TRUNCATE TABLE {tables} RESTART IDENTITY CASCADE"))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
