//! Request and response bodies

pub mod claims;
pub mod provider;

use core_kernel::Temperature;
use serde::Deserialize;

use crate::error::ApiError;

/// A temperature sent either as a JSON number or as a numeric string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TemperatureInput {
    Number(f64),
    Text(String),
}

impl TemperatureInput {
    /// Validates the value; out-of-range input is rejected, never clamped
    pub fn resolve(&self) -> Result<Temperature, ApiError> {
        let temperature = match self {
            TemperatureInput::Number(value) => Temperature::new(*value)?,
            TemperatureInput::Text(text) => text.parse::<Temperature>()?,
        };
        Ok(temperature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_number_and_string_forms() {
        let number: TemperatureInput = serde_json::from_str("0.7").unwrap();
        let text: TemperatureInput = serde_json::from_str("\"0.7\"").unwrap();
        assert_eq!(number.resolve().unwrap(), text.resolve().unwrap());
    }

    #[test]
    fn test_rejections() {
        assert!(TemperatureInput::Number(1.5).resolve().is_err());
        assert!(TemperatureInput::Number(-0.1).resolve().is_err());
        assert!(TemperatureInput::Text("warm".into()).resolve().is_err());
        assert!(TemperatureInput::Text("".into()).resolve().is_err());
    }

    proptest! {
        #[test]
        fn prop_string_and_number_agree(value in 0.0f64..=1.0) {
            let number = TemperatureInput::Number(value).resolve().unwrap();
            let text = TemperatureInput::Text(format!(" {value} ")).resolve().unwrap();
            prop_assert_eq!(number, text);
        }

        #[test]
        fn prop_above_one_rejected(value in 1.000_001f64..1_000.0) {
            prop_assert!(TemperatureInput::Number(value).resolve().is_err());
            prop_assert!(TemperatureInput::Text(value.to_string()).resolve().is_err());
        }
    }
}
