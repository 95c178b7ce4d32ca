//! Unit tests for claim identifiers

use core_kernel::ClaimId;
use std::collections::HashSet;

mod claim_id_tests {
    use super::*;

    #[test]
    fn test_prefix() {
        assert_eq!(ClaimId::prefix(), "CLM");
    }

    #[test]
    fn test_display_format() {
        assert_eq!(ClaimId::new(42).to_string(), "CLM-42");
    }

    #[test]
    fn test_from_str_with_prefix() {
        let parsed: ClaimId = "CLM-1001".parse().unwrap();
        assert_eq!(parsed.value(), 1001);
    }

    #[test]
    fn test_from_str_without_prefix() {
        let parsed: ClaimId = "1001".parse().unwrap();
        assert_eq!(parsed, ClaimId::new(1001));
    }

    #[test]
    fn test_from_str_rejects_garbage() {
        assert!("CLM-abc".parse::<ClaimId>().is_err());
        assert!("".parse::<ClaimId>().is_err());
    }

    #[test]
    fn test_ordering_follows_database_key() {
        assert!(ClaimId::new(1) < ClaimId::new(2));
    }

    #[test]
    fn test_hash_set_deduplicates() {
        let ids: HashSet<ClaimId> = [1, 2, 2, 3].into_iter().map(ClaimId::new).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&ClaimId::new(42)).unwrap();
        assert_eq!(json, "42");

        let back: ClaimId = serde_json::from_str("42").unwrap();
        assert_eq!(back, ClaimId::new(42));
    }
}
