//! Process-local pipeline counters

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Monotonic counters updated by the ingestion loop and the pipeline
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    received: AtomicU64,
    skipped: AtomicU64,
    completed: AtomicU64,
    errored: AtomicU64,
    fraud_fallbacks: AtomicU64,
    retries: AtomicU64,
    degraded_retrievals: AtomicU64,
    index_sync_failures: AtomicU64,
    malformed_messages: AtomicU64,
}

/// Point-in-time copy of [`PipelineMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub received: u64,
    pub skipped: u64,
    pub completed: u64,
    pub errored: u64,
    pub fraud_fallbacks: u64,
    pub retries: u64,
    pub degraded_retrievals: u64,
    pub index_sync_failures: u64,
    pub malformed_messages: u64,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_errored(&self) {
        self.errored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fraud_fallback(&self) {
        self.fraud_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_degraded_retrieval(&self) {
        self.degraded_retrievals.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_index_sync_failure(&self) {
        self.index_sync_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed_message(&self) {
        self.malformed_messages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            errored: self.errored.load(Ordering::Relaxed),
            fraud_fallbacks: self.fraud_fallbacks.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            degraded_retrievals: self.degraded_retrievals.load(Ordering::Relaxed),
            index_sync_failures: self.index_sync_failures.load(Ordering::Relaxed),
            malformed_messages: self.malformed_messages.load(Ordering::Relaxed),
        }
    }
}

impl MetricsSnapshot {
    /// Claims that were dispatched but have not reached a terminal state
    pub fn in_flight(&self) -> u64 {
        self.received
            .saturating_sub(self.skipped + self.completed + self.errored)
    }
}
