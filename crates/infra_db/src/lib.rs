//! Infrastructure Database Layer
//!
//! PostgreSQL adapters for the claim enrichment pipeline, built on SQLx:
//!
//! - [`ClaimsRepository`]: the legacy `claims` table, implementing
//!   [`ClaimStorePort`](domain_enrichment::ClaimStorePort)
//! - [`PgVectorIndex`]: one pgvector table per AI provider, implementing
//!   [`VectorIndexPort`](domain_enrichment::VectorIndexPort)
//!
//! Schema changes ship as embedded migrations, applied with
//! [`run_migrations`].
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, ClaimsRepository, DatabaseConfig};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/claims")).await?;
//! run_migrations(&pool).await?;
//! let store = ClaimsRepository::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod vector;

pub use pool::{DatabasePool, create_pool, run_migrations, DatabaseConfig};
pub use error::DatabaseError;
pub use repositories::ClaimsRepository;
pub use vector::PgVectorIndex;
