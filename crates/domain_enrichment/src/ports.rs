//! Enrichment Domain Ports
//!
//! The pipeline depends on three collaborators it does not own:
//!
//! - **LLM transport** ([`LlmPort`]): prompt plus sampling options in, text out
//! - **Vector index** ([`VectorIndexPort`]): top-k similarity search and upsert,
//!   one index per provider because embeddings differ between providers
//! - **Claim store** ([`ClaimStorePort`]): parameterized updates of the
//!   summary and fraud columns, plus the intake queries used by the API
//!
//! Infrastructure crates provide the production adapters (`infra_llm`,
//! `infra_db`); the [`mock`] module provides in-memory doubles for tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use core_kernel::{ClaimId, DomainPort, HealthCheckable, PortError, Temperature};

use crate::claim::{ClaimRecord, NewClaim};
use crate::fraud::FraudResult;

/// Metadata attached to a vector document
pub type Metadata = Map<String, Value>;

/// Sampling options for one LLM invocation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChatOptions {
    pub temperature: Temperature,
    pub repeat_penalty: Option<f64>,
}

impl ChatOptions {
    pub fn with_temperature(temperature: Temperature) -> Self {
        Self {
            temperature,
            repeat_penalty: None,
        }
    }

    pub fn repeat_penalty(mut self, penalty: f64) -> Self {
        self.repeat_penalty = Some(penalty);
        self
    }
}

/// A single prompt sent to a provider
#[derive(Debug, Clone, PartialEq)]
pub struct LlmRequest {
    pub system_prompt: Option<String>,
    pub user_prompt: String,
    pub options: ChatOptions,
}

impl LlmRequest {
    pub fn user(prompt: impl Into<String>, options: ChatOptions) -> Self {
        Self {
            system_prompt: None,
            user_prompt: prompt.into(),
            options,
        }
    }

    pub fn with_system(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }
}

/// Text generation capability of one provider
///
/// Calls may block for seconds and may fail; timeouts belong to the adapter's
/// client configuration.
#[async_trait]
pub trait LlmPort: DomainPort {
    /// Short label used in logs and spans, e.g. `ollama/llama3.2`
    fn label(&self) -> &str;

    /// Generates a completion for the request
    async fn invoke(&self, request: LlmRequest) -> Result<String, PortError>;
}

/// Embedding capability used by vector index adapters that store raw vectors
#[async_trait]
pub trait EmbeddingPort: DomainPort {
    /// Length of the vectors this model produces
    fn dimensions(&self) -> usize;

    /// Embeds a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PortError>;
}

/// A document stored in, or returned from, a vector index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorDocument {
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl VectorDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The document written for an enriched claim
    pub fn claim_summary(summary: impl Into<String>, claim_id: ClaimId) -> Self {
        Self::new(summary)
            .with_metadata("source", "legacy_db")
            .with_metadata("claim_id", claim_id.value())
    }

    /// Claim id recorded in the metadata, if any
    pub fn claim_id(&self) -> Option<ClaimId> {
        self.metadata
            .get("claim_id")
            .and_then(Value::as_i64)
            .map(ClaimId::new)
    }
}

/// Similarity index bound to one provider's embedding space
#[async_trait]
pub trait VectorIndexPort: DomainPort {
    /// Name of the index, used in logs
    fn index_name(&self) -> &str;

    /// Returns up to `top_k` documents most similar to `query`
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<VectorDocument>, PortError>;

    /// Inserts or replaces documents
    async fn upsert(&self, documents: Vec<VectorDocument>) -> Result<(), PortError>;
}

/// Relational store holding the claims table
#[async_trait]
pub trait ClaimStorePort: DomainPort + HealthCheckable {
    /// `UPDATE claims SET summary = ? WHERE id = ?`
    async fn update_summary(&self, claim_id: ClaimId, summary: &str) -> Result<(), PortError>;

    /// Writes `fraud_score`, `fraud_analysis`, `fraud_rationale`
    async fn update_fraud_result(
        &self,
        claim_id: ClaimId,
        result: &FraudResult,
    ) -> Result<(), PortError>;

    /// All claims, newest first
    async fn list_claims(&self) -> Result<Vec<ClaimRecord>, PortError>;

    /// Inserts a claim with status `OPEN`
    async fn create_claim(&self, claim: NewClaim) -> Result<ClaimRecord, PortError>;
}

/// In-memory port doubles for testing
///
/// These adapters record every call so tests can assert on the exact prompts
/// and writes the pipeline produced.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::{BTreeMap, VecDeque};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use chrono::Utc;
    use parking_lot::Mutex;

    use core_kernel::HealthCheckResult;

    use crate::claim::ClaimStatus;

    #[derive(Debug, Clone)]
    enum Reply {
        Text(String),
        Fail(String),
    }

    /// Scripted LLM: replies are consumed in order, then the default applies
    #[derive(Debug)]
    pub struct MockLlm {
        label: String,
        replies: Mutex<VecDeque<Reply>>,
        default_reply: Mutex<Reply>,
        requests: Mutex<Vec<LlmRequest>>,
        latency: Option<Duration>,
    }

    impl MockLlm {
        pub fn new(label: impl Into<String>) -> Self {
            Self {
                label: label.into(),
                replies: Mutex::new(VecDeque::new()),
                default_reply: Mutex::new(Reply::Text(String::new())),
                requests: Mutex::new(Vec::new()),
                latency: None,
            }
        }

        /// Delays every reply, for concurrency tests
        pub fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = Some(latency);
            self
        }

        /// Queues a successful reply
        pub fn reply(self, text: impl Into<String>) -> Self {
            self.replies.lock().push_back(Reply::Text(text.into()));
            self
        }

        /// Queues a transport failure
        pub fn fail(self, message: impl Into<String>) -> Self {
            self.replies.lock().push_back(Reply::Fail(message.into()));
            self
        }

        /// Reply used once the queue is empty
        pub fn with_default(self, text: impl Into<String>) -> Self {
            *self.default_reply.lock() = Reply::Text(text.into());
            self
        }

        /// Every request seen so far
        pub fn requests(&self) -> Vec<LlmRequest> {
            self.requests.lock().clone()
        }

        pub fn call_count(&self) -> usize {
            self.requests.lock().len()
        }
    }

    impl DomainPort for MockLlm {}

    #[async_trait]
    impl LlmPort for MockLlm {
        fn label(&self) -> &str {
            &self.label
        }

        async fn invoke(&self, request: LlmRequest) -> Result<String, PortError> {
            self.requests.lock().push(request);
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            let reply = self
                .replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| self.default_reply.lock().clone());
            match reply {
                Reply::Text(text) => Ok(text),
                Reply::Fail(message) => Err(PortError::ServiceUnavailable { service: message }),
            }
        }
    }

    /// In-memory index returning stored documents in insertion order
    #[derive(Debug, Default)]
    pub struct MockVectorIndex {
        name: String,
        documents: Mutex<Vec<VectorDocument>>,
        searches: Mutex<Vec<(String, usize)>>,
        fail_search: AtomicBool,
        fail_upsert: AtomicBool,
    }

    impl MockVectorIndex {
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                ..Default::default()
            }
        }

        pub fn with_documents(self, documents: Vec<VectorDocument>) -> Self {
            self.documents.lock().extend(documents);
            self
        }

        pub fn failing_search(self) -> Self {
            self.fail_search.store(true, Ordering::SeqCst);
            self
        }

        pub fn failing_upsert(self) -> Self {
            self.fail_upsert.store(true, Ordering::SeqCst);
            self
        }

        pub fn documents(&self) -> Vec<VectorDocument> {
            self.documents.lock().clone()
        }

        /// `(query, top_k)` of every search
        pub fn searches(&self) -> Vec<(String, usize)> {
            self.searches.lock().clone()
        }
    }

    impl DomainPort for MockVectorIndex {}

    #[async_trait]
    impl VectorIndexPort for MockVectorIndex {
        fn index_name(&self) -> &str {
            &self.name
        }

        async fn search(&self, query: &str, top_k: usize) -> Result<Vec<VectorDocument>, PortError> {
            self.searches.lock().push((query.to_string(), top_k));
            if self.fail_search.load(Ordering::SeqCst) {
                return Err(PortError::ServiceUnavailable {
                    service: format!("{} search", self.name),
                });
            }
            Ok(self.documents.lock().iter().take(top_k).cloned().collect())
        }

        async fn upsert(&self, documents: Vec<VectorDocument>) -> Result<(), PortError> {
            if self.fail_upsert.load(Ordering::SeqCst) {
                return Err(PortError::ServiceUnavailable {
                    service: format!("{} upsert", self.name),
                });
            }
            self.documents.lock().extend(documents);
            Ok(())
        }
    }

    /// One write observed by [`MockClaimStore`]
    #[derive(Debug, Clone, PartialEq)]
    pub enum StoreWrite {
        Summary(ClaimId, String),
        Fraud(ClaimId, FraudResult),
    }

    /// In-memory claims table
    #[derive(Debug, Default)]
    pub struct MockClaimStore {
        rows: Mutex<BTreeMap<ClaimId, ClaimRecord>>,
        writes: Mutex<Vec<StoreWrite>>,
        fail_summary: AtomicBool,
        fail_fraud: AtomicBool,
    }

    impl MockClaimStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_summary_writes(self) -> Self {
            self.fail_summary.store(true, Ordering::SeqCst);
            self
        }

        pub fn failing_fraud_writes(self) -> Self {
            self.fail_fraud.store(true, Ordering::SeqCst);
            self
        }

        /// Inserts a row with the given id and description
        pub fn with_claim(self, id: ClaimId, description: impl Into<String>) -> Self {
            self.rows.lock().insert(id, blank_record(id, description.into()));
            self
        }

        pub fn writes(&self) -> Vec<StoreWrite> {
            self.writes.lock().clone()
        }

        pub fn get(&self, id: ClaimId) -> Option<ClaimRecord> {
            self.rows.lock().get(&id).cloned()
        }
    }

    fn blank_record(id: ClaimId, description: String) -> ClaimRecord {
        ClaimRecord {
            id,
            description,
            status: ClaimStatus::Open,
            summary: None,
            ai_provider: None,
            ai_temperature: None,
            fraud_score: None,
            fraud_analysis: None,
            fraud_rationale: None,
            created_at: Utc::now(),
        }
    }

    impl DomainPort for MockClaimStore {}

    #[async_trait]
    impl HealthCheckable for MockClaimStore {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::healthy("mock-claim-store", 0)
        }
    }

    #[async_trait]
    impl ClaimStorePort for MockClaimStore {
        async fn update_summary(&self, claim_id: ClaimId, summary: &str) -> Result<(), PortError> {
            if self.fail_summary.load(Ordering::SeqCst) {
                return Err(PortError::connection("summary write refused"));
            }
            self.writes
                .lock()
                .push(StoreWrite::Summary(claim_id, summary.to_string()));
            if let Some(row) = self.rows.lock().get_mut(&claim_id) {
                row.summary = Some(summary.to_string());
            }
            Ok(())
        }

        async fn update_fraud_result(
            &self,
            claim_id: ClaimId,
            result: &FraudResult,
        ) -> Result<(), PortError> {
            if self.fail_fraud.load(Ordering::SeqCst) {
                return Err(PortError::connection("fraud write refused"));
            }
            self.writes
                .lock()
                .push(StoreWrite::Fraud(claim_id, result.clone()));
            if let Some(row) = self.rows.lock().get_mut(&claim_id) {
                row.fraud_score = Some(i32::from(result.score()));
                row.fraud_analysis = Some(result.analysis().to_string());
                row.fraud_rationale = Some(result.rationale().to_string());
            }
            Ok(())
        }

        async fn list_claims(&self) -> Result<Vec<ClaimRecord>, PortError> {
            Ok(self.rows.lock().values().rev().cloned().collect())
        }

        async fn create_claim(&self, claim: NewClaim) -> Result<ClaimRecord, PortError> {
            let mut rows = self.rows.lock();
            let next_id = rows.keys().next_back().map_or(1, |id| id.value() + 1);
            let id = ClaimId::new(next_id);
            let mut record = blank_record(id, claim.description);
            record.ai_provider = claim.ai_provider;
            record.ai_temperature = claim.ai_temperature.map(|t| t.value());
            rows.insert(id, record.clone());
            Ok(record)
        }
    }
}
