//! Claim change events decoded from CDC messages
//!
//! A message is one claims-table row change, optionally wrapped in a
//! Debezium-style envelope:
//!
//! ```json
//! {"payload": {"before": null, "after": {"id": 42, "description": "..."}, "op": "c"}}
//! ```
//!
//! The `after` image is read from `payload` when present, otherwise from the
//! root. A null or absent `after` (a delete) decodes to `None`.

use serde_json::{json, Value};

use core_kernel::ClaimId;

use crate::claim::ClaimRecord;
use crate::error::CdcDecodeError;

/// The fields of one row change the pipeline needs
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimChangeEvent {
    pub claim_id: ClaimId,
    pub description: String,
    pub prior_summary: Option<String>,
    pub requested_provider: Option<String>,
    pub requested_temperature: Option<f64>,
}

impl ClaimChangeEvent {
    pub fn new(claim_id: ClaimId, description: impl Into<String>) -> Self {
        Self {
            claim_id,
            description: description.into(),
            prior_summary: None,
            requested_provider: None,
            requested_temperature: None,
        }
    }

    pub fn with_prior_summary(mut self, summary: impl Into<String>) -> Self {
        self.prior_summary = Some(summary.into());
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.requested_provider = Some(provider.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.requested_temperature = Some(temperature);
        self
    }

    /// True when the row already carries a non-empty summary
    pub fn has_prior_summary(&self) -> bool {
        self.prior_summary.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Decodes one CDC payload
    pub fn decode(bytes: &[u8]) -> Result<Option<Self>, CdcDecodeError> {
        let root: Value = serde_json::from_slice(bytes)?;
        let payload = root.get("payload").unwrap_or(&root);

        let after = match payload.get("after") {
            None | Some(Value::Null) => return Ok(None),
            Some(after) => after,
        };

        let claim_id = match after.get("id") {
            None | Some(Value::Null) => return Err(CdcDecodeError::MissingField("id")),
            Some(value) => integer(value).ok_or(CdcDecodeError::WrongType {
                field: "id",
                expected: "integer",
            })?,
        };

        let description = match after.get("description") {
            None | Some(Value::Null) => return Err(CdcDecodeError::MissingField("description")),
            Some(Value::String(text)) => text.clone(),
            Some(_) => {
                return Err(CdcDecodeError::WrongType {
                    field: "description",
                    expected: "string",
                })
            }
        };

        Ok(Some(Self {
            claim_id: ClaimId::new(claim_id),
            description,
            prior_summary: optional_text(after, "summary"),
            requested_provider: optional_text(after, "ai_provider"),
            requested_temperature: after.get("ai_temperature").and_then(number),
        }))
    }

    /// Debezium-style create envelope for a freshly inserted row
    pub fn envelope_for(record: &ClaimRecord) -> Vec<u8> {
        json!({
            "payload": {
                "before": null,
                "after": {
                    "id": record.id.value(),
                    "description": record.description,
                    "status": record.status.as_str(),
                    "summary": record.summary,
                    "ai_provider": record.ai_provider,
                    "ai_temperature": record.ai_temperature,
                },
                "op": "c",
                "ts_ms": record.created_at.timestamp_millis(),
            }
        })
        .to_string()
        .into_bytes()
    }
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn optional_text(record: &Value, field: &str) -> Option<String> {
    record.get(field).and_then(Value::as_str).map(str::to_string)
}
