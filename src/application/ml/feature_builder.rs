//! Feature and label construction for the up/not-up classifier.
//!
//! Features at index `i` read observations `0..=i` only; the label is the one
//! place that looks at `i + 1`, and it is used for training exclusively.

use crate::application::market_data::indicator_frame::IndicatorFrame;
use crate::config::IndicatorConfig;
use crate::domain::market::series_buffer::SeriesBuffer;
use crate::domain::ml::feature_registry::{FeatureVector, Label, TrainingExample};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct FeatureBuilder {
    config: IndicatorConfig,
}

impl FeatureBuilder {
    pub fn new(config: IndicatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    /// Indicators for the whole buffer, for callers building many indices.
    pub fn frame(&self, buffer: &SeriesBuffer) -> IndicatorFrame {
        IndicatorFrame::compute(buffer.as_slice(), &self.config)
    }

    /// Feature vector at `index`, or `None` while any input is undefined.
    ///
    /// Each call recomputes the indicators over `0..=index`. Callers walking
    /// many indices should build one `frame()` and read it with `features_at`.
    pub fn build_features(&self, buffer: &SeriesBuffer, index: usize) -> Option<FeatureVector> {
        if index >= buffer.len() {
            return None;
        }
        let frame = IndicatorFrame::compute(&buffer.as_slice()[..=index], &self.config);
        features_at(&frame, index)
    }

    /// `Up` if the next close is higher; `None` at the last index.
    pub fn build_label(&self, buffer: &SeriesBuffer, index: usize) -> Option<Label> {
        let current = buffer.get(index)?;
        let next = buffer.get(index + 1)?;
        Some(Label::from_closes(current.close, next.close))
    }

    /// Every index where both the features and the label are defined.
    pub fn build_training_set(&self, buffer: &SeriesBuffer) -> Vec<TrainingExample> {
        let frame = self.frame(buffer);
        let examples: Vec<TrainingExample> = (0..buffer.len())
            .filter_map(|i| {
                Some(TrainingExample {
                    features: features_at(&frame, i)?,
                    label: self.build_label(buffer, i)?,
                })
            })
            .collect();

        debug!(
            "Training set: {} of {} rows usable (warm-up {})",
            examples.len(),
            buffer.len(),
            frame.warmup_period()
        );
        examples
    }
}

/// Reads the feature columns of a precomputed frame at `index`.
pub fn features_at(frame: &IndicatorFrame, index: usize) -> Option<FeatureVector> {
    Some(FeatureVector {
        index,
        rsi: frame.rsi.get(index)?,
        sma_20: frame.sma_fast.get(index)?,
        sma_50: frame.sma_slow.get(index)?,
        price_change: frame.price_change.get(index)?,
        volume_change: frame.volume_change.get(index)?,
    })
}
