//! Sampling temperature for LLM calls
//!
//! A temperature is only ever constructed through validation, so holding a
//! `Temperature` proves the value is finite and lies in `[0, 1]`. Out-of-range
//! input is rejected, never clamped.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while validating a temperature
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemperatureError {
    #[error("Temperature must be between 0 and 1, got {0}")]
    OutOfRange(f64),

    #[error("Temperature must be a valid number, got '{0}'")]
    NotANumber(String),
}

/// A validated sampling temperature in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Temperature(f64);

impl Temperature {
    /// Fully deterministic sampling, used for fraud scoring
    pub const ZERO: Temperature = Temperature(0.0);

    /// Default summarization temperature for a freshly started service
    pub const DEFAULT: Temperature = Temperature(0.3);

    /// Validates and wraps a raw temperature
    pub fn new(value: f64) -> Result<Self, TemperatureError> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(TemperatureError::OutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Returns the raw value
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for Temperature {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Temperature {
    type Err = TemperatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| TemperatureError::NotANumber(s.to_string()))?;
        Self::new(value)
    }
}

impl TryFrom<f64> for Temperature {
    type Error = TemperatureError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Temperature> for f64 {
    fn from(t: Temperature) -> f64 {
        t.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(Temperature::new(0.0).is_ok());
        assert!(Temperature::new(1.0).is_ok());
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert_eq!(Temperature::new(1.5), Err(TemperatureError::OutOfRange(1.5)));
        assert!(Temperature::new(-0.1).is_err());
        assert!(Temperature::new(f64::NAN).is_err());
    }
}
