//! Shared fixtures for the enrichment test suites
//!
//! Most tests only need [`harness::EnrichmentHarness`], which wires the
//! pipeline over in-memory ports. [`database::TestDatabase`] starts a pgvector
//! container for the Postgres adapter tests and needs Docker. Canned model
//! replies and Debezium envelopes live in [`fixtures`]; proptest strategies
//! live in [`generators`].

pub mod assertions;
pub mod builders;
pub mod database;
pub mod fixtures;
pub mod generators;
pub mod harness;

pub use assertions::*;
pub use builders::*;
pub use fixtures::*;
pub use generators::*;
pub use harness::*;
