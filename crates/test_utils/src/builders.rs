//! Test Data Builders
//!
//! Builders for claim rows and change events that default everything a test
//! does not care about.

use chrono::{TimeZone, Utc};
use core_kernel::ClaimId;
use domain_enrichment::{ClaimChangeEvent, ClaimRecord, ClaimStatus};

use crate::fixtures::ClaimFixtures;

/// Builder for claims-table rows
pub struct TestClaimBuilder {
    record: ClaimRecord,
}

impl Default for TestClaimBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestClaimBuilder {
    /// Claim 42, open, unsummarized
    pub fn new() -> Self {
        Self {
            record: ClaimRecord {
                id: ClaimId::new(42),
                description: ClaimFixtures::deer_collision().to_string(),
                status: ClaimStatus::Open,
                summary: None,
                ai_provider: None,
                ai_temperature: None,
                fraud_score: None,
                fraud_analysis: None,
                fraud_rationale: None,
                created_at: Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap(),
            },
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.record.id = ClaimId::new(id);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.record.description = description.into();
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.record.summary = Some(summary.into());
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>, temperature: f64) -> Self {
        self.record.ai_provider = Some(provider.into());
        self.record.ai_temperature = Some(temperature);
        self
    }

    pub fn with_status(mut self, status: ClaimStatus) -> Self {
        self.record.status = status;
        self
    }

    pub fn build(self) -> ClaimRecord {
        self.record
    }

    /// Builds the change event the CDC stream would carry for this row
    pub fn build_event(self) -> ClaimChangeEvent {
        let record = self.record;
        let mut event = ClaimChangeEvent::new(record.id, record.description);
        if let Some(summary) = record.summary {
            event = event.with_prior_summary(summary);
        }
        if let Some(provider) = record.ai_provider {
            event = event.with_provider(provider);
        }
        if let Some(temperature) = record.ai_temperature {
            event = event.with_temperature(temperature);
        }
        event
    }

    /// Builds the Debezium envelope bytes for this row
    pub fn build_envelope(self) -> Vec<u8> {
        ClaimChangeEvent::envelope_for(&self.record)
    }
}
