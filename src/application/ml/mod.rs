pub mod feature_builder;
pub mod predictor;
pub mod signal_classifier;

pub use feature_builder::FeatureBuilder;
pub use predictor::MLPredictor;
pub use signal_classifier::{FitOutcome, SignalClassifier, TrainedModel, TrainingReport};
