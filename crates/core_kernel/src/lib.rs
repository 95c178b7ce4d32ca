//! Core Kernel - Foundational types shared by the claims enrichment crates
//!
//! This crate provides the building blocks used across the domain and
//! infrastructure layers:
//! - Claim identifiers mirroring the legacy claims table key
//! - A validated sampling temperature for LLM calls
//! - Port plumbing (errors, health checks) for swappable adapters

pub mod identifiers;
pub mod temperature;
pub mod ports;

pub use identifiers::ClaimId;
pub use temperature::{Temperature, TemperatureError};
pub use ports::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError};
