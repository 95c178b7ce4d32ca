//! Behaviour tests for the PII redactor

use domain_governance::{PiiKind, Redactor, RedactionRule};
use proptest::prelude::*;
use regex::Regex;

fn redactor() -> Redactor {
    Redactor::standard()
}

mod government_id_tests {
    use super::*;

    #[test]
    fn test_dashed_format_redacted() {
        let out = redactor().redact("SSN 123-45-6789 on file");
        assert_eq!(out, "SSN [REDACTED_SSN] on file");
    }

    #[test]
    fn test_bare_nine_digits_redacted() {
        let out = redactor().redact("id 123456789.");
        assert_eq!(out, "id [REDACTED_SSN].");
    }

    #[test]
    fn test_longer_digit_runs_left_alone() {
        let out = redactor().redact("invoice 1234567890");
        assert_eq!(out, "invoice 1234567890");
    }

    #[test]
    fn test_every_occurrence_replaced() {
        let out = redactor().redact("123-45-6789 / 987-65-4321");
        assert_eq!(out, "[REDACTED_SSN] / [REDACTED_SSN]");
    }
}

mod email_tests {
    use super::*;

    #[test]
    fn test_email_redacted() {
        let out = redactor().redact("Contact me at a@b.com today");
        assert_eq!(out, "Contact me at [REDACTED_EMAIL] today");
    }

    #[test]
    fn test_email_with_plus_and_dots() {
        let out = redactor().redact("jane.doe+claims@mail.example.co");
        assert_eq!(out, "[REDACTED_EMAIL]");
    }

    #[test]
    fn test_email_holding_id_shaped_digits() {
        assert_eq!(
            redactor().redact("reach 123-45-6789@mail.com or pol-1234@x.org"),
            "reach [REDACTED_EMAIL] or [REDACTED_EMAIL]"
        );
    }
}

mod policy_id_tests {
    use super::*;

    #[test]
    fn test_short_label() {
        assert_eq!(redactor().redact("POL-123456"), "[REDACTED_POLICY_ID]");
    }

    #[test]
    fn test_long_label_case_insensitive() {
        assert_eq!(
            redactor().redact("under policy-00012345 and Pol-9999"),
            "under [REDACTED_POLICY_ID] and [REDACTED_POLICY_ID]"
        );
    }

    #[test]
    fn test_too_few_digits_left_alone() {
        assert_eq!(redactor().redact("POL-123"), "POL-123");
    }
}

#[test]
fn test_mixed_claim_description() {
    let redaction = redactor()
        .redact_detailed("Contact me at a@b.com, SSN 123-45-6789, policy POL-4455667");

    assert_eq!(
        redaction.text,
        "Contact me at [REDACTED_EMAIL], SSN [REDACTED_SSN], policy [REDACTED_POLICY_ID]"
    );
    assert!(redaction.pii_detected());
}

#[test]
fn test_redaction_is_idempotent() {
    let once = redactor().redact("a@b.com 123-45-6789 POL-1234");
    let twice = redactor().redact(&once);
    assert_eq!(once, twice);
}

#[test]
fn test_custom_rule_list() {
    let custom = Redactor::with_rules(vec![RedactionRule::new(
        PiiKind::Email,
        Regex::new(r"\S+@\S+").unwrap(),
    )]);

    assert_eq!(custom.rules().len(), 1);
    assert_eq!(custom.redact("ping x@y and 123-45-6789"), "ping [REDACTED_EMAIL] and 123-45-6789");
}

fn ssn_strategy() -> impl Strategy<Value = String> {
    (100u32..1000, 10u32..100, 1000u32..10000).prop_map(|(a, b, c)| format!("{a}-{b}-{c}"))
}

fn email_strategy() -> impl Strategy<Value = String> {
    ("[a-z]{1,10}", "([.]?[0-9]{9})?", "[a-z]{1,10}", "(com|org|net|io)")
        .prop_map(|(local, digits, domain, tld)| format!("{local}{digits}@{domain}.{tld}"))
}

fn policy_strategy() -> impl Strategy<Value = String> {
    ("(POL|POLICY|pol|policy)", 1000u64..10_000_000u64)
        .prop_map(|(label, number)| format!("{label}-{number}"))
}

proptest! {
    #[test]
    fn prop_ssn_never_survives(prefix in "[a-zA-Z ]{0,20}", ssn in ssn_strategy(), suffix in "[a-zA-Z ]{0,20}") {
        let text = format!("{prefix} {ssn} {suffix}");
        let out = redactor().redact(&text);
        prop_assert!(!out.contains(&ssn));
        prop_assert!(out.contains(PiiKind::GovernmentId.token()));
    }

    #[test]
    fn prop_email_never_survives(prefix in "[a-zA-Z ]{0,20}", email in email_strategy()) {
        let text = format!("{prefix} {email} end");
        let out = redactor().redact(&text);
        prop_assert!(!out.contains(&email));
        prop_assert!(out.contains(PiiKind::Email.token()));
    }

    #[test]
    fn prop_policy_never_survives(policy in policy_strategy()) {
        let text = format!("see {policy} please");
        let out = redactor().redact(&text);
        prop_assert!(!out.contains(&policy));
        prop_assert!(out.contains(PiiKind::PolicyId.token()));
    }
}
