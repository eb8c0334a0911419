//! Signal threshold configuration parsing from environment variables.

use super::parse_f64;
use anyhow::{Result, bail};

/// Decision thresholds used by the signal engine
#[derive(Debug, Clone, PartialEq)]
pub struct SignalThresholds {
    /// Entry requires the model's up-probability strictly above this value
    pub ai_entry_threshold: f64,
    /// Exit fires when the up-probability is strictly below this value
    pub ai_exit_threshold: f64,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            ai_entry_threshold: 0.5,
            ai_exit_threshold: 0.5,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
        }
    }
}

impl SignalThresholds {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let thresholds = Self {
            ai_entry_threshold: parse_f64("AI_ENTRY_THRESHOLD", defaults.ai_entry_threshold)?,
            ai_exit_threshold: parse_f64("AI_EXIT_THRESHOLD", defaults.ai_exit_threshold)?,
            rsi_oversold: parse_f64("RSI_OVERSOLD", defaults.rsi_oversold)?,
            rsi_overbought: parse_f64("RSI_OVERBOUGHT", defaults.rsi_overbought)?,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("AI_ENTRY_THRESHOLD", self.ai_entry_threshold),
            ("AI_EXIT_THRESHOLD", self.ai_exit_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("{} must be within [0, 1], got {}", key, value);
            }
        }
        for (key, value) in [
            ("RSI_OVERSOLD", self.rsi_oversold),
            ("RSI_OVERBOUGHT", self.rsi_overbought),
        ] {
            if !(0.0..=100.0).contains(&value) {
                bail!("{} must be within [0, 100], got {}", key, value);
            }
        }
        if self.rsi_oversold >= self.rsi_overbought {
            bail!(
                "RSI_OVERSOLD ({}) must be below RSI_OVERBOUGHT ({})",
                self.rsi_oversold,
                self.rsi_overbought
            );
        }
        Ok(())
    }
}
