//! HTTP sink for change-capture messages

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use domain_enrichment::CdcMessage;
use tracing::debug;

use crate::{error::ApiError, AppState};

/// Optional partition key of the message
pub const CDC_KEY_HEADER: &str = "x-cdc-key";

/// Enqueues one raw CDC message for the ingestion loop
///
/// Decoding happens in the loop; this endpoint only rejects empty bodies.
pub async fn ingest_claim_change(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    if body.is_empty() {
        return Err(ApiError::Validation("CDC message body is empty".to_string()));
    }
    let key = headers
        .get(CDC_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    debug!(cdc.key = ?key, bytes = body.len(), "CDC message received");
    state.cdc.publish(CdcMessage::new(key, body.to_vec())).await?;
    Ok(StatusCode::ACCEPTED)
}
