//! Indicator configuration parsing from environment variables.
//!
//! This module handles loading technical indicator periods.

use super::{parse_f64, parse_usize};
use crate::domain::ml::feature_registry::FeatureSettings;
use anyhow::{Result, bail};

/// Indicator periods and band width
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorConfig {
    // RSI
    pub rsi_period: usize,

    // SMA (feature inputs)
    pub fast_sma_period: usize,
    pub slow_sma_period: usize,

    // EMA (diagnostic columns)
    pub ema_fast_period: usize,
    pub ema_slow_period: usize,

    // MACD
    pub macd_fast_period: usize,
    pub macd_slow_period: usize,
    pub macd_signal_period: usize,

    // Bollinger Bands
    pub bb_period: usize,
    pub bb_std_dev: f64,

    // Volume
    pub volume_sma_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            fast_sma_period: 20,
            slow_sma_period: 50,
            ema_fast_period: 20,
            ema_slow_period: 50,
            macd_fast_period: 12,
            macd_slow_period: 26,
            macd_signal_period: 9,
            bb_period: 20,
            bb_std_dev: 2.0,
            volume_sma_period: 20,
        }
    }
}

impl IndicatorConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            rsi_period: parse_usize("RSI_PERIOD", defaults.rsi_period)?,
            fast_sma_period: parse_usize("FAST_SMA_PERIOD", defaults.fast_sma_period)?,
            slow_sma_period: parse_usize("SLOW_SMA_PERIOD", defaults.slow_sma_period)?,
            ema_fast_period: parse_usize("EMA_FAST_PERIOD", defaults.ema_fast_period)?,
            ema_slow_period: parse_usize("EMA_SLOW_PERIOD", defaults.ema_slow_period)?,
            macd_fast_period: parse_usize("MACD_FAST_PERIOD", defaults.macd_fast_period)?,
            macd_slow_period: parse_usize("MACD_SLOW_PERIOD", defaults.macd_slow_period)?,
            macd_signal_period: parse_usize("MACD_SIGNAL_PERIOD", defaults.macd_signal_period)?,
            bb_period: parse_usize("BB_PERIOD", defaults.bb_period)?,
            bb_std_dev: parse_f64("BB_STD_DEV", defaults.bb_std_dev)?,
            volume_sma_period: parse_usize("VOLUME_SMA_PERIOD", defaults.volume_sma_period)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// The periods that shape the model's feature columns.
    pub fn feature_settings(&self) -> FeatureSettings {
        FeatureSettings {
            rsi_period: self.rsi_period,
            fast_sma_period: self.fast_sma_period,
            slow_sma_period: self.slow_sma_period,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let periods = [
            ("RSI_PERIOD", self.rsi_period),
            ("FAST_SMA_PERIOD", self.fast_sma_period),
            ("SLOW_SMA_PERIOD", self.slow_sma_period),
            ("EMA_FAST_PERIOD", self.ema_fast_period),
            ("EMA_SLOW_PERIOD", self.ema_slow_period),
            ("MACD_FAST_PERIOD", self.macd_fast_period),
            ("MACD_SLOW_PERIOD", self.macd_slow_period),
            ("MACD_SIGNAL_PERIOD", self.macd_signal_period),
            ("BB_PERIOD", self.bb_period),
            ("VOLUME_SMA_PERIOD", self.volume_sma_period),
        ];
        for (key, period) in periods {
            if period == 0 {
                bail!("{} must be > 0", key);
            }
        }
        if self.macd_fast_period >= self.macd_slow_period {
            bail!(
                "MACD_FAST_PERIOD ({}) must be smaller than MACD_SLOW_PERIOD ({})",
                self.macd_fast_period,
                self.macd_slow_period
            );
        }
        if !(self.bb_std_dev.is_finite() && self.bb_std_dev > 0.0) {
            bail!("BB_STD_DEV must be a positive number, got {}", self.bb_std_dev);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = IndicatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rsi_period, 14);
        assert_eq!(config.slow_sma_period, 50);
    }

    #[test]
    fn test_zero_period_rejected() {
        let config = IndicatorConfig {
            bb_period: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("BB_PERIOD"));
    }

    #[test]
    fn test_default_feature_settings_match_registry_defaults() {
        let config = IndicatorConfig::default();
        assert_eq!(config.feature_settings(), FeatureSettings::default());

        let config = IndicatorConfig {
            slow_sma_period: 100,
            ..Default::default()
        };
        assert_eq!(config.feature_settings().slow_sma_period, 100);
    }

    #[test]
    fn test_inverted_macd_rejected() {
        let config = IndicatorConfig {
            macd_fast_period: 30,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
