//! pgvector-backed similarity index
//!
//! Each AI provider gets its own table because embedding models disagree on
//! vector length: 768 dimensions for Ollama and Gemini, 1536 for OpenAI.
//! Text is embedded through the provider's [`EmbeddingPort`] before every
//! search and upsert; ranking uses cosine distance (`<=>`).

use std::sync::Arc;

use async_trait::async_trait;
use pgvector::Vector;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{DomainPort, PortError};
use domain_enrichment::ports::Metadata;
use domain_enrichment::{AiProvider, EmbeddingPort, VectorDocument, VectorIndexPort};

use crate::error::DatabaseError;

/// Vector length of the table bound to `provider`
pub fn dimensions_for(provider: AiProvider) -> usize {
    match provider {
        AiProvider::Ollama | AiProvider::Gemini => 768,
        AiProvider::OpenAi => 1536,
    }
}

/// Table holding `provider`'s vectors
pub fn table_for(provider: AiProvider) -> &'static str {
    match provider {
        AiProvider::Ollama => "claim_vectors_ollama",
        AiProvider::Gemini => "claim_vectors_gemini",
        AiProvider::OpenAi => "claim_vectors_openai",
    }
}

/// Similarity index over one provider's vector table
pub struct PgVectorIndex {
    pool: PgPool,
    table: &'static str,
    dimensions: usize,
    embedder: Arc<dyn EmbeddingPort>,
}

impl PgVectorIndex {
    pub fn new(pool: PgPool, provider: AiProvider, embedder: Arc<dyn EmbeddingPort>) -> Self {
        Self {
            pool,
            table: table_for(provider),
            dimensions: dimensions_for(provider),
            embedder,
        }
    }

    async fn embed(&self, text: &str) -> Result<Vector, PortError> {
        let embedding = self.embedder.embed(text).await?;
        if embedding.len() != self.dimensions {
            return Err(DatabaseError::DimensionMismatch {
                table: self.table.to_string(),
                expected: self.dimensions,
                actual: embedding.len(),
            }
            .into());
        }
        Ok(Vector::from(embedding))
    }

    async fn insert(&self, document: VectorDocument, embedding: Vector) -> Result<(), DatabaseError> {
        let claim_id = document.claim_id().map(|id| id.value());
        let sql = format!(
            "INSERT INTO {} (id, claim_id, content, metadata, embedding) VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (claim_id) DO UPDATE SET \
             content = EXCLUDED.content, metadata = EXCLUDED.metadata, embedding = EXCLUDED.embedding",
            self.table
        );
        sqlx::query(&sql)
            .bind(Uuid::now_v7())
            .bind(claim_id)
            .bind(&document.text)
            .bind(Json(Value::Object(document.metadata)))
            .bind(embedding)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

impl DomainPort for PgVectorIndex {}

#[async_trait]
impl VectorIndexPort for PgVectorIndex {
    fn index_name(&self) -> &str {
        self.table
    }

    #[instrument(skip(self, query), fields(table = self.table))]
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<VectorDocument>, PortError> {
        let embedding = self.embed(query).await?;
        let sql = format!(
            "SELECT content, metadata FROM {} ORDER BY embedding <=> $1 LIMIT $2",
            self.table
        );
        let rows = sqlx::query_as::<_, (String, Json<Value>)>(&sql)
            .bind(embedding)
            .bind(i64::try_from(top_k).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from)?;

        debug!(matches = rows.len(), "Vector search complete");
        Ok(rows
            .into_iter()
            .map(|(text, Json(metadata))| VectorDocument {
                text,
                metadata: match metadata {
                    Value::Object(map) => map,
                    _ => Metadata::new(),
                },
            })
            .collect())
    }

    /// Documents with a `claim_id` replace the claim's previous vector
    #[instrument(skip(self, documents), fields(table = self.table, count = documents.len()))]
    async fn upsert(&self, documents: Vec<VectorDocument>) -> Result<(), PortError> {
        for document in documents {
            let embedding = self.embed(&document.text).await?;
            self.insert(document, embedding).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_per_provider() {
        assert_eq!(dimensions_for(AiProvider::Ollama), 768);
        assert_eq!(dimensions_for(AiProvider::Gemini), 768);
        assert_eq!(dimensions_for(AiProvider::OpenAi), 1536);
    }

    #[test]
    fn test_tables_are_distinct() {
        let tables: std::collections::HashSet<_> = AiProvider::ALL.iter().map(|p| table_for(*p)).collect();
        assert_eq!(tables.len(), 3);
    }
}
