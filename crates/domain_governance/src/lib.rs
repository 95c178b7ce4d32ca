//! Data Governance Domain
//!
//! Claim descriptions are free text typed by claimants and adjusters, so they
//! routinely carry government ID numbers, email addresses and policy numbers.
//! Nothing leaves the process towards an AI provider before passing through
//! the [`Redactor`].
//!
//! # Example
//!
//! ```rust
//! use domain_governance::Redactor;
//!
//! let redactor = Redactor::standard();
//! let clean = redactor.redact("Reach me at jane@example.com, SSN 123-45-6789");
//! assert_eq!(clean, "Reach me at [REDACTED_EMAIL], SSN [REDACTED_SSN]");
//! ```

pub mod redactor;

pub use redactor::{PiiKind, Redaction, RedactionRule, Redactor};
