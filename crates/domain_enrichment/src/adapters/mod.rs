//! Adapters that live inside the domain crate
//!
//! Only the in-memory vector index is here; it backs development setups
//! without PostgreSQL. Production adapters live in the `infra_*` crates.

pub mod memory;

pub use memory::InMemoryVectorIndex;
