//! PostgreSQL adapter tests
//!
//! These start a pgvector container and are ignored by default:
//! `cargo test -p infra_db -- --ignored`

use std::sync::Arc;

use async_trait::async_trait;
use core_kernel::{ClaimId, DomainPort, HealthCheckable, PortError, Temperature};
use domain_enrichment::{
    AiProvider, ClaimStorePort, EmbeddingPort, FraudResult, NewClaim, VectorDocument,
    VectorIndexPort,
};
use infra_db::vector::dimensions_for;
use infra_db::{run_migrations, ClaimsRepository, PgVectorIndex};
use test_utils::database::TestDatabase;

/// Deterministic bag-of-letters embedding
struct LetterEmbedder {
    dimensions: usize,
}

impl DomainPort for LetterEmbedder {}

#[async_trait]
impl EmbeddingPort for LetterEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, PortError> {
        let mut vector = vec![0.0f32; self.dimensions];
        for byte in text.to_lowercase().bytes().filter(u8::is_ascii_lowercase) {
            vector[(byte - b'a') as usize] += 1.0;
        }
        vector[self.dimensions - 1] = 1.0;
        Ok(vector)
    }
}

async fn migrated_database() -> TestDatabase {
    let db = TestDatabase::start().await.expect("container starts");
    run_migrations(db.pool()).await.expect("migrations apply");
    db
}

mod claims_repository_tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_create_list_and_enrich() {
        let db = migrated_database().await;
        let repo = ClaimsRepository::new(db.pool().clone());

        let first = repo.create_claim(NewClaim::new("Hail damage")).await.unwrap();
        let second = repo
            .create_claim(
                NewClaim::new("Kitchen fire")
                    .with_provider("gemini")
                    .with_temperature(Temperature::new(0.6).unwrap()),
            )
            .await
            .unwrap();

        let listed = repo.list_claims().await.unwrap();
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
        assert_eq!(listed[0].ai_provider.as_deref(), Some("gemini"));

        repo.update_summary(first.id, "Hail dented the roof.").await.unwrap();
        let fraud = FraudResult::new(85, "High risk.", "Claimant filed twice.").unwrap();
        repo.update_fraud_result(first.id, &fraud).await.unwrap();

        let row = repo.get_by_id(first.id).await.unwrap();
        assert_eq!(row.summary.as_deref(), Some("Hail dented the roof."));
        assert_eq!(row.fraud_score, Some(85));
        assert_eq!(row.fraud_rationale.as_deref(), Some("Claimant filed twice."));
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_health_check() {
        let db = migrated_database().await;
        let repo = ClaimsRepository::new(db.pool().clone());
        assert!(repo.health_check().await.is_operational());
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_missing_claim() {
        let db = migrated_database().await;
        let repo = ClaimsRepository::new(db.pool().clone());
        assert!(repo.get_by_id(ClaimId::new(999)).await.unwrap_err().is_not_found());
    }
}

mod vector_index_tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_upsert_and_search() {
        let db = migrated_database().await;
        let embedder = Arc::new(LetterEmbedder {
            dimensions: dimensions_for(AiProvider::Ollama),
        });
        let index = PgVectorIndex::new(db.pool().clone(), AiProvider::Ollama, embedder);

        index
            .upsert(vec![
                VectorDocument::claim_summary("zzz zzz", ClaimId::new(1)),
                VectorDocument::claim_summary("abc abc", ClaimId::new(2)),
            ])
            .await
            .unwrap();
        index
            .upsert(vec![VectorDocument::claim_summary("abc abd", ClaimId::new(2))])
            .await
            .unwrap();

        let hits = index.search("abc", 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "abc abd");
        assert_eq!(hits[0].claim_id(), Some(ClaimId::new(2)));
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_wrong_dimensions_rejected() {
        let db = migrated_database().await;
        let embedder = Arc::new(LetterEmbedder { dimensions: 768 });
        let index = PgVectorIndex::new(db.pool().clone(), AiProvider::OpenAi, embedder);

        let err = index.search("anything", 3).await.unwrap_err();
        assert!(matches!(err, PortError::Validation { .. }));
    }
}
