use crate::domain::errors::ModelError;
use crate::domain::ml::feature_registry::{FeatureSettings, FeatureVector};

/// Interface for Machine Learning models
pub trait MLPredictor: Send + Sync {
    /// Predict the probability (0.0 to 1.0) that the next close is higher.
    /// > 0.5 implies Up
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError>;

    /// Get model name/type
    fn name(&self) -> &str;

    /// Get model version/id
    fn version(&self) -> &str;

    /// Indicator periods the model was trained on, if it depends on them.
    fn feature_settings(&self) -> Option<FeatureSettings> {
        None
    }
}
