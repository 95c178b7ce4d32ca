//! Request handlers

pub mod cdc;
pub mod claims;
pub mod health;
pub mod monitoring;
pub mod provider;
