//! In-memory vector index
//!
//! Similarity is the cosine of term-occurrence sets: the number of shared
//! lower-case alphanumeric terms divided by the geometric mean of the two
//! term counts. Documents with no shared term are never returned.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::RwLock;

use core_kernel::{DomainPort, PortError};

use crate::ports::{VectorDocument, VectorIndexPort};

/// Term-overlap index held in process memory
#[derive(Debug, Default)]
pub struct InMemoryVectorIndex {
    name: String,
    documents: RwLock<Vec<VectorDocument>>,
}

impl InMemoryVectorIndex {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: RwLock::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn similarity(query: &HashSet<String>, text: &str) -> f64 {
    let doc = terms(text);
    if query.is_empty() || doc.is_empty() {
        return 0.0;
    }
    let shared = query.intersection(&doc).count() as f64;
    shared / ((query.len() * doc.len()) as f64).sqrt()
}

impl DomainPort for InMemoryVectorIndex {}

#[async_trait]
impl VectorIndexPort for InMemoryVectorIndex {
    fn index_name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<VectorDocument>, PortError> {
        let query_terms = terms(query);
        let documents = self.documents.read();

        let mut scored: Vec<(f64, &VectorDocument)> = documents
            .iter()
            .map(|doc| (similarity(&query_terms, &doc.text), doc))
            .filter(|(score, _)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(_, doc)| doc.clone())
            .collect())
    }

    /// Documents carrying a `claim_id` replace the previous document for that claim
    async fn upsert(&self, incoming: Vec<VectorDocument>) -> Result<(), PortError> {
        let mut documents = self.documents.write();
        for doc in incoming {
            let existing = doc
                .claim_id()
                .and_then(|id| documents.iter().position(|d| d.claim_id() == Some(id)));
            match existing {
                Some(position) => documents[position] = doc,
                None => documents.push(doc),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::ClaimId;

    #[tokio::test]
    async fn test_search_orders_by_overlap() {
        let index = InMemoryVectorIndex::new("memory");
        index
            .upsert(vec![
                VectorDocument::new("Kitchen fire damaged cabinets"),
                VectorDocument::new("Rear-end collision at a stop light"),
                VectorDocument::new("Collision with a deer at night"),
            ])
            .await
            .unwrap();

        let hits = index.search("collision at a stop light", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "Rear-end collision at a stop light");
    }

    #[tokio::test]
    async fn test_empty_index_returns_nothing() {
        let index = InMemoryVectorIndex::new("memory");
        assert!(index.search("anything", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_replaces_same_claim() {
        let index = InMemoryVectorIndex::new("memory");
        index
            .upsert(vec![VectorDocument::claim_summary("old", ClaimId::new(1))])
            .await
            .unwrap();
        index
            .upsert(vec![VectorDocument::claim_summary("new", ClaimId::new(1))])
            .await
            .unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(index.search("new", 1).await.unwrap()[0].text, "new");
    }
}
