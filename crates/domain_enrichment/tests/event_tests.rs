//! Tests for decoding CDC payloads into claim change events

use core_kernel::ClaimId;
use domain_enrichment::{CdcDecodeError, ClaimChangeEvent};

fn decode(json: &str) -> Result<Option<ClaimChangeEvent>, CdcDecodeError> {
    ClaimChangeEvent::decode(json.as_bytes())
}

#[test]
fn test_enveloped_create() {
    let event = decode(
        r#"{"schema": {}, "payload": {"before": null, "after": {"id": 42, "description": "Hail damage", "summary": null}, "op": "c"}}"#,
    )
    .unwrap()
    .unwrap();

    assert_eq!(event.claim_id, ClaimId::new(42));
    assert_eq!(event.description, "Hail damage");
    assert_eq!(event.prior_summary, None);
    assert!(!event.has_prior_summary());
}

#[test]
fn test_bare_record_without_envelope() {
    let event = decode(r#"{"after": {"id": 7, "description": "Flooded basement", "ai_provider": "openai", "ai_temperature": 0.9}}"#)
        .unwrap()
        .unwrap();

    assert_eq!(event.claim_id, ClaimId::new(7));
    assert_eq!(event.requested_provider.as_deref(), Some("openai"));
    assert_eq!(event.requested_temperature, Some(0.9));
}

#[test]
fn test_delete_event_is_ignored() {
    assert_eq!(decode(r#"{"payload": {"before": {"id": 1}, "after": null, "op": "d"}}"#).unwrap(), None);
    assert_eq!(decode(r#"{"payload": {"op": "d"}}"#).unwrap(), None);
}

#[test]
fn test_existing_summary_detected() {
    let event = decode(r#"{"payload": {"after": {"id": 3, "description": "x", "summary": "Done already."}}}"#)
        .unwrap()
        .unwrap();
    assert!(event.has_prior_summary());

    let empty = decode(r#"{"payload": {"after": {"id": 3, "description": "x", "summary": ""}}}"#)
        .unwrap()
        .unwrap();
    assert!(!empty.has_prior_summary());
}

#[test]
fn test_numeric_strings_accepted() {
    let event = decode(r#"{"after": {"id": "15", "description": "x", "ai_temperature": "0.4"}}"#)
        .unwrap()
        .unwrap();
    assert_eq!(event.claim_id, ClaimId::new(15));
    assert_eq!(event.requested_temperature, Some(0.4));
}

#[test]
fn test_malformed_json() {
    assert!(matches!(decode("{not json"), Err(CdcDecodeError::MalformedJson(_))));
}

#[test]
fn test_missing_fields() {
    assert!(matches!(
        decode(r#"{"after": {"description": "x"}}"#),
        Err(CdcDecodeError::MissingField("id"))
    ));
    assert!(matches!(
        decode(r#"{"after": {"id": 1}}"#),
        Err(CdcDecodeError::MissingField("description"))
    ));
}

#[test]
fn test_wrong_types() {
    assert!(matches!(
        decode(r#"{"after": {"id": "abc", "description": "x"}}"#),
        Err(CdcDecodeError::WrongType { field: "id", .. })
    ));
    assert!(matches!(
        decode(r#"{"after": {"id": 1, "description": 5}}"#),
        Err(CdcDecodeError::WrongType { field: "description", .. })
    ));
}
