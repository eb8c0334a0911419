//! Classifier configuration parsing from environment variables.

use super::{parse_f64, parse_usize};
use crate::domain::errors::ModelError;
use anyhow::{Context, Result};
use std::env;

/// Random forest training parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    pub tree_count: usize,
    pub random_seed: u64,
    /// Share of examples held out for the accuracy report, in (0, 1)
    pub test_fraction: f64,
    pub max_depth: u16,
    pub min_samples_split: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            tree_count: 100,
            random_seed: 42,
            test_fraction: 0.2,
            max_depth: 10,
            min_samples_split: 5,
        }
    }
}

impl ClassifierConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let random_seed = env::var("ML_RANDOM_SEED")
            .unwrap_or_else(|_| defaults.random_seed.to_string())
            .parse::<u64>()
            .context("Failed to parse ML_RANDOM_SEED")?;
        let max_depth = env::var("ML_MAX_DEPTH")
            .unwrap_or_else(|_| defaults.max_depth.to_string())
            .parse::<u16>()
            .context("Failed to parse ML_MAX_DEPTH")?;

        let config = Self {
            tree_count: parse_usize("ML_TREE_COUNT", defaults.tree_count)?,
            random_seed,
            test_fraction: parse_f64("ML_TEST_FRACTION", defaults.test_fraction)?,
            max_depth,
            min_samples_split: parse_usize("ML_MIN_SAMPLES_SPLIT", defaults.min_samples_split)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checked again by the classifier before every fit.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.tree_count == 0 {
            return Err(ModelError::InvalidConfig {
                reason: "tree_count must be > 0".to_string(),
            });
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(ModelError::InvalidConfig {
                reason: format!(
                    "test_fraction must be within (0, 1), got {}",
                    self.test_fraction
                ),
            });
        }
        if self.max_depth == 0 {
            return Err(ModelError::InvalidConfig {
                reason: "max_depth must be > 0".to_string(),
            });
        }
        if self.min_samples_split < 2 {
            return Err(ModelError::InvalidConfig {
                reason: "min_samples_split must be >= 2".to_string(),
            });
        }
        Ok(())
    }
}
