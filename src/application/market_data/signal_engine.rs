//! Signal decisions: indicator thresholds fused with the model's up-probability.
//!
//! A decision at index `i` is a pure function of the indicator values at `i`
//! (computed from observations `0..=i`) and the read-only model.

use super::indicator_frame::IndicatorFrame;
use crate::application::ml::feature_builder::features_at;
use crate::application::ml::predictor::MLPredictor;
use crate::config::{Config, IndicatorConfig, SignalThresholds};
use crate::domain::errors::{EngineError, ModelError};
use crate::domain::market::observation::Observation;
use crate::domain::market::series_buffer::SeriesBuffer;
use crate::domain::ml::feature_registry::FeatureVector;
use crate::domain::trading::types::{Signal, SignalDecision};
use rayon::prelude::*;
use tracing::debug;

/// Everything the rules read at one index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionInputs {
    pub features: FeatureVector,
    pub close: f64,
    pub volume: f64,
    pub volume_sma: f64,
    pub bb_upper: f64,
    pub macd: f64,
    pub macd_signal: f64,
}

impl DecisionInputs {
    /// `None` while any required indicator is still warming up.
    pub fn at(frame: &IndicatorFrame, observations: &[Observation], index: usize) -> Option<Self> {
        let obs = observations.get(index)?;
        Some(Self {
            features: features_at(frame, index)?,
            close: obs.close,
            volume: obs.volume,
            volume_sma: frame.volume_sma.get(index)?,
            bb_upper: frame.bollinger.upper.get(index)?,
            macd: frame.macd.line.get(index)?,
            macd_signal: frame.macd.signal.get(index)?,
        })
    }
}

/// Applies the entry and exit rules. Exit wins when both hold.
///
/// Entry: up-probability above the entry threshold, RSI oversold and volume
/// above its average.
/// Exit: up-probability below the exit threshold, RSI overbought, or close
/// above the upper band while MACD is under its signal line.
pub fn fuse(
    inputs: &DecisionInputs,
    up_probability: f64,
    thresholds: &SignalThresholds,
) -> SignalDecision {
    let rsi = inputs.features.rsi;

    let entry = up_probability > thresholds.ai_entry_threshold
        && rsi < thresholds.rsi_oversold
        && inputs.volume > inputs.volume_sma;

    let band_breakout = inputs.close > inputs.bb_upper && inputs.macd < inputs.macd_signal;
    let exit = up_probability < thresholds.ai_exit_threshold
        || rsi > thresholds.rsi_overbought
        || band_breakout;

    let signal = match (entry, exit) {
        (_, true) => Signal::ExitLong,
        (true, false) => Signal::EnterLong,
        (false, false) => Signal::Neutral,
    };

    SignalDecision {
        signal,
        entry,
        exit,
        up_probability,
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignalEngine {
    indicators: IndicatorConfig,
    thresholds: SignalThresholds,
}

impl SignalEngine {
    pub fn new(indicators: IndicatorConfig, thresholds: SignalThresholds) -> Self {
        Self {
            indicators,
            thresholds,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.indicators.clone(), config.thresholds.clone())
    }

    pub fn thresholds(&self) -> &SignalThresholds {
        &self.thresholds
    }

    /// Signal at `index`, `Ok(None)` during warm-up.
    ///
    /// Recomputes every indicator over `0..=index`, so looping this over a
    /// series is quadratic. Use `decide_all` for whole series.
    pub fn decide<M>(
        &self,
        buffer: &SeriesBuffer,
        index: usize,
        model: &M,
    ) -> Result<Option<Signal>, EngineError>
    where
        M: MLPredictor + ?Sized,
    {
        Ok(self.explain(buffer, index, model)?.map(|d| d.signal))
    }

    /// Like `decide`, keeping the rule breakdown.
    pub fn explain<M>(
        &self,
        buffer: &SeriesBuffer,
        index: usize,
        model: &M,
    ) -> Result<Option<SignalDecision>, EngineError>
    where
        M: MLPredictor + ?Sized,
    {
        if index >= buffer.len() {
            return Err(EngineError::IndexOutOfRange {
                index,
                len: buffer.len(),
            });
        }

        self.check_features(model)?;
        let history = &buffer.as_slice()[..=index];
        let frame = IndicatorFrame::compute(history, &self.indicators);
        self.decide_at(&frame, history, index, model)
    }

    /// Signals for every index, aligned with the buffer.
    pub fn decide_all<M>(
        &self,
        buffer: &SeriesBuffer,
        model: &M,
    ) -> Result<Vec<Option<Signal>>, EngineError>
    where
        M: MLPredictor + ?Sized,
    {
        Ok(self
            .explain_all(buffer, model)?
            .into_iter()
            .map(|d| d.map(|d| d.signal))
            .collect())
    }

    /// Decision breakdowns for every index, aligned with the buffer.
    ///
    /// Indicators are causal, so one frame over the whole buffer yields the
    /// same values at `i` as a frame over `0..=i`.
    pub fn explain_all<M>(
        &self,
        buffer: &SeriesBuffer,
        model: &M,
    ) -> Result<Vec<Option<SignalDecision>>, EngineError>
    where
        M: MLPredictor + ?Sized,
    {
        self.check_features(model)?;
        let frame = IndicatorFrame::compute(buffer.as_slice(), &self.indicators);
        (0..buffer.len())
            .map(|i| self.decide_at(&frame, buffer.as_slice(), i, model))
            .collect()
    }

    /// Runs `decide_all` for independent instruments in parallel.
    ///
    /// Errors are captured per instrument so one bad series does not discard
    /// the others.
    pub fn decide_instruments<M>(
        &self,
        instruments: &[(String, SeriesBuffer)],
        model: &M,
    ) -> Vec<(String, Result<Vec<Option<Signal>>, EngineError>)>
    where
        M: MLPredictor + ?Sized,
    {
        instruments
            .par_iter()
            .map(|(symbol, buffer)| (symbol.clone(), self.decide_all(buffer, model)))
            .collect()
    }

    /// Rejects a model trained on features built with other indicator periods.
    fn check_features<M>(&self, model: &M) -> Result<(), EngineError>
    where
        M: MLPredictor + ?Sized,
    {
        let expected = self.indicators.feature_settings();
        match model.feature_settings() {
            Some(trained) if trained != expected => Err(ModelError::FeatureMismatch {
                reason: format!(
                    "{} was trained with {:?}, engine computes {:?}",
                    model.name(),
                    trained,
                    expected
                ),
            }
            .into()),
            _ => Ok(()),
        }
    }

    fn decide_at<M>(
        &self,
        frame: &IndicatorFrame,
        observations: &[Observation],
        index: usize,
        model: &M,
    ) -> Result<Option<SignalDecision>, EngineError>
    where
        M: MLPredictor + ?Sized,
    {
        let Some(inputs) = DecisionInputs::at(frame, observations, index) else {
            return Ok(None);
        };

        let up_probability = model.predict(&inputs.features)?;
        let decision = fuse(&inputs, up_probability, &self.thresholds);

        if decision.signal != Signal::Neutral {
            debug!(
                "SignalEngine [{}]: index {} -> {} (p_up={:.3}, rsi={:.1}, entry={}, exit={})",
                model.name(),
                index,
                decision.signal,
                up_probability,
                inputs.features.rsi,
                decision.entry,
                decision.exit
            );
        }
        Ok(Some(decision))
    }
}
