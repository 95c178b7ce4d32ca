//! Property-Based Test Generators
//!
//! Proptest strategies producing values that respect the domain's rules.

use core_kernel::{ClaimId, Temperature};
use domain_enrichment::AiProvider;
use proptest::prelude::*;

/// Strategy for one of the three providers
pub fn provider_strategy() -> impl Strategy<Value = AiProvider> {
    prop_oneof![
        Just(AiProvider::Ollama),
        Just(AiProvider::Gemini),
        Just(AiProvider::OpenAi),
    ]
}

/// Provider names as a caller might type them
pub fn provider_name_strategy() -> impl Strategy<Value = String> {
    (provider_strategy(), any::<bool>()).prop_map(|(provider, upper)| {
        if upper {
            provider.as_str().to_uppercase()
        } else {
            provider.as_str().to_string()
        }
    })
}

/// Strategy for valid temperatures in steps of 0.05
pub fn temperature_strategy() -> impl Strategy<Value = Temperature> {
    (0u32..=20).prop_map(|step| {
        Temperature::new(f64::from(step) / 20.0).unwrap_or(Temperature::DEFAULT)
    })
}

/// Strategy for temperatures outside the accepted range
pub fn invalid_temperature_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![-100.0f64..-0.001, 1.001f64..100.0]
}

/// Strategy for positive claim ids
pub fn claim_id_strategy() -> impl Strategy<Value = ClaimId> {
    (1i64..1_000_000).prop_map(ClaimId::new)
}

/// Strategy for free-text claim descriptions
pub fn claim_description_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9 ,.;'-]{10,200}"
}

/// Strategy for fraud replies in the primary format
pub fn fraud_reply_strategy() -> impl Strategy<Value = (u8, String)> {
    (0u8..=100, "[A-Za-z][A-Za-z .]{0,40}", "[A-Za-z][A-Za-z .]{0,40}").prop_map(
        |(score, analysis, rationale)| {
            (
                score,
                format!("SCORE: {score}\nANALYSIS: {analysis}\nRATIONALE: {rationale}"),
            )
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_enrichment::FraudParser;

    proptest! {
        #[test]
        fn prop_provider_names_parse(name in provider_name_strategy()) {
            prop_assert!(name.parse::<AiProvider>().is_ok());
        }

        #[test]
        fn prop_invalid_temperatures_rejected(value in invalid_temperature_strategy()) {
            prop_assert!(Temperature::new(value).is_err());
        }

        #[test]
        fn prop_generated_replies_parse((score, reply) in fraud_reply_strategy()) {
            let (result, _) = FraudParser::new().parse(&reply).unwrap();
            prop_assert_eq!(result.score(), score);
        }
    }
}
