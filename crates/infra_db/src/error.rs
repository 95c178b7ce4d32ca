//! Database errors and their port-level translation
//!
//! Postgres error codes are folded into a handful of variants the pipeline
//! can act on; everything else becomes `QueryFailed`.

use core_kernel::PortError;
use thiserror::Error;

// https://www.postgresql.org/docs/current/errcodes-appendix.html
const CHECK_VIOLATION: &str = "23514";
const UNDEFINED_TABLE: &str = "42P01";

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// A fraud score or temperature outside the column's CHECK range
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// The table exists in code but migrations have not created it
    #[error("Schema not migrated: {0}")]
    SchemaMissing(String),

    #[error("Embedding has {actual} dimensions, table {table} expects {expected}")]
    DimensionMismatch {
        table: String,
        expected: usize,
        actual: usize,
    },

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,
}

impl DatabaseError {
    /// ```rust
    /// use infra_db::DatabaseError;
    ///
    /// let error = DatabaseError::not_found("Claim", 42);
    /// assert_eq!(error.to_string(), "Claim 42 not found");
    /// ```
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        DatabaseError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound { .. })
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::RowNotFound => DatabaseError::not_found("Row", "?"),
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolClosed => {
                DatabaseError::ConnectionFailed(error.to_string())
            }
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.code().as_deref() {
                    Some(CHECK_VIOLATION) => DatabaseError::ConstraintViolation(message),
                    Some(UNDEFINED_TABLE) => DatabaseError::SchemaMissing(message),
                    _ => DatabaseError::QueryFailed(message),
                }
            }
            _ => DatabaseError::QueryFailed(error.to_string()),
        }
    }
}

impl From<DatabaseError> for PortError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::NotFound { entity, id } => PortError::not_found(entity, id),
            DatabaseError::ConnectionFailed(message) => PortError::connection(message),
            DatabaseError::PoolExhausted => PortError::ServiceUnavailable {
                service: "postgres connection pool".to_string(),
            },
            DatabaseError::ConstraintViolation(_) | DatabaseError::DimensionMismatch { .. } => {
                PortError::validation(error.to_string())
            }
            other => PortError::Internal {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}
