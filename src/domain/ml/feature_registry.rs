use serde::{Deserialize, Serialize};

/// Ordered list of feature names.
/// This order is baked into persisted models; any change here is a breaking
/// change for stored artifacts.
pub const FEATURE_NAMES: &[&str] = &["rsi", "sma_20", "sma_50", "price_change", "volume_change"];

pub const FEATURE_COUNT: usize = 5;

/// Feature values for exactly one observation index.
///
/// Only constructible from fully defined inputs, so a `FeatureVector` is
/// always valid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub index: usize,
    pub rsi: f64,
    pub sma_20: f64,
    pub sma_50: f64,
    pub price_change: f64,
    pub volume_change: f64,
}

impl FeatureVector {
    /// Values in `FEATURE_NAMES` order.
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.rsi,
            self.sma_20,
            self.sma_50,
            self.price_change,
            self.volume_change,
        ]
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.to_array().to_vec()
    }

    /// Looks a feature up by its registry name.
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.to_array()[i])
    }
}

/// Direction of the next close relative to the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    NotUp,
    Up,
}

impl Label {
    pub fn from_closes(current: f64, next: f64) -> Self {
        if next > current { Label::Up } else { Label::NotUp }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Label::Up => 1.0,
            Label::NotUp => 0.0,
        }
    }
}

/// Indicator periods the feature columns were computed with.
///
/// Stored alongside a model so it is only fed features built the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSettings {
    pub rsi_period: usize,
    pub fast_sma_period: usize,
    pub slow_sma_period: usize,
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            fast_sma_period: 20,
            slow_sma_period: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub features: FeatureVector,
    pub label: Label,
}
