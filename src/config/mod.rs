//! Configuration module for Rustsignal.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: Indicators, Signal thresholds and the Classifier.

mod indicator_config;
mod ml_config;
mod signal_config;

pub use indicator_config::IndicatorConfig;
pub use ml_config::ClassifierConfig;
pub use signal_config::SignalThresholds;

use anyhow::{Context, Result};
use std::env;

/// Main application configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub indicators: IndicatorConfig,
    pub thresholds: SignalThresholds,
    pub classifier: ClassifierConfig,
}

impl Config {
    /// Loads every section from the environment. Call `dotenvy::dotenv()` first
    /// to pick up a `.env` file.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            indicators: IndicatorConfig::from_env().context("Invalid indicator configuration")?,
            thresholds: SignalThresholds::from_env().context("Invalid signal thresholds")?,
            classifier: ClassifierConfig::from_env().context("Invalid classifier configuration")?,
        })
    }
}

pub(crate) fn parse_usize(key: &str, default: usize) -> Result<usize> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<usize>()
        .context(format!("Failed to parse {}", key))
}

pub(crate) fn parse_f64(key: &str, default: f64) -> Result<f64> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<f64>()
        .context(format!("Failed to parse {}", key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_helpers_fall_back_to_default() {
        assert_eq!(
            parse_usize("RUSTSIGNAL_TEST_UNSET_USIZE", 14).unwrap(),
            14
        );
        assert_eq!(parse_f64("RUSTSIGNAL_TEST_UNSET_F64", 2.5).unwrap(), 2.5);
    }

    #[test]
    fn test_default_config_sections_validate() {
        let config = Config::default();
        assert!(config.indicators.validate().is_ok());
        assert!(config.thresholds.validate().is_ok());
        assert!(config.classifier.validate().is_ok());
    }
}
