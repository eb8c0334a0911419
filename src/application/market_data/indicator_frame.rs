use super::indicators::{
    BollingerSeries, MacdSeries, bollinger_bands, ema, macd, pct_change, rsi, sma, volume_sma,
};
use crate::config::IndicatorConfig;
use crate::domain::market::indicator_series::IndicatorSeries;
use crate::domain::market::observation::Observation;

/// Every indicator the feature builder and signal engine read, computed once
/// for a slice of observations.
#[derive(Debug, Clone)]
pub struct IndicatorFrame {
    pub rsi: IndicatorSeries,
    pub sma_fast: IndicatorSeries,
    pub sma_slow: IndicatorSeries,
    pub ema_fast: IndicatorSeries,
    pub ema_slow: IndicatorSeries,
    pub macd: MacdSeries,
    pub bollinger: BollingerSeries,
    pub volume_sma: IndicatorSeries,
    pub price_change: IndicatorSeries,
    pub volume_change: IndicatorSeries,
    len: usize,
}

impl IndicatorFrame {
    pub fn compute(observations: &[Observation], config: &IndicatorConfig) -> Self {
        let closes: Vec<f64> = observations.iter().map(|o| o.close).collect();
        let volumes: Vec<f64> = observations.iter().map(|o| o.volume).collect();

        Self {
            rsi: rsi(&closes, config.rsi_period),
            sma_fast: sma(&closes, config.fast_sma_period),
            sma_slow: sma(&closes, config.slow_sma_period),
            ema_fast: ema(&closes, config.ema_fast_period),
            ema_slow: ema(&closes, config.ema_slow_period),
            macd: macd(
                &closes,
                config.macd_fast_period,
                config.macd_slow_period,
                config.macd_signal_period,
            ),
            bollinger: bollinger_bands(&closes, config.bb_period, config.bb_std_dev),
            volume_sma: volume_sma(&volumes, config.volume_sma_period),
            price_change: pct_change("price_change", &closes),
            volume_change: pct_change("volume_change", &volumes),
            len: observations.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Series the feature vector is built from.
    pub fn feature_inputs(&self) -> [&IndicatorSeries; 5] {
        [
            &self.rsi,
            &self.sma_fast,
            &self.sma_slow,
            &self.price_change,
            &self.volume_change,
        ]
    }

    /// Series the signal engine needs besides the features.
    pub fn decision_inputs(&self) -> [&IndicatorSeries; 4] {
        [
            &self.macd.line,
            &self.macd.signal,
            &self.bollinger.upper,
            &self.volume_sma,
        ]
    }

    /// First index at which every feature and decision input is defined.
    /// Equals `len()` when the slice is too short for any decision.
    pub fn warmup_period(&self) -> usize {
        self.feature_inputs()
            .into_iter()
            .chain(self.decision_inputs())
            .map(|s| s.first_defined().unwrap_or(self.len))
            .max()
            .unwrap_or(self.len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observations(n: usize) -> Vec<Observation> {
        (0..n)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.3).sin() * 4.0;
                Observation::new(i as i64, close, close + 1.0, close - 1.0, close, 1000.0 + i as f64)
            })
            .collect()
    }

    #[test]
    fn test_default_warmup_is_slow_sma() {
        let frame = IndicatorFrame::compute(&observations(80), &IndicatorConfig::default());
        assert_eq!(frame.len(), 80);
        // SMA-50 dominates: first defined at 49
        assert_eq!(frame.warmup_period(), 49);
    }

    #[test]
    fn test_short_series_never_warms_up() {
        let frame = IndicatorFrame::compute(&observations(30), &IndicatorConfig::default());
        assert_eq!(frame.warmup_period(), 30);
    }

    #[test]
    fn test_macd_signal_can_dominate_warmup() {
        let config = IndicatorConfig {
            slow_sma_period: 10,
            ..Default::default()
        };
        let frame = IndicatorFrame::compute(&observations(80), &config);
        assert_eq!(frame.warmup_period(), 33);
    }
}
