//! Seeded random forest predicting the probability of an up move.
//!
//! The forest is fitted on 0/1 targets, so the mean of its trees' outputs is
//! the share of "up" outcomes in the matching leaves, i.e. an up-probability
//! in [0, 1]. Hard labels use `p > 0.5`.

use super::predictor::MLPredictor;
use crate::config::ClassifierConfig;
use crate::domain::errors::ModelError;
use crate::domain::ml::feature_registry::{
    FEATURE_NAMES, FeatureSettings, FeatureVector, Label, TrainingExample,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::fmt;
use tracing::{debug, info};

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

const ARTIFACT_FORMAT_VERSION: u32 = 2;
const MODEL_VERSION: &str = "v1";

/// Diagnostics from a fit. Never feeds back into the model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Hard-label accuracy on the held-out subset, in [0, 1]
    pub accuracy: f64,
    pub train_size: usize,
    pub test_size: usize,
    /// Share of `Up` labels across all examples
    pub positive_rate: f64,
}

pub struct FitOutcome {
    pub model: TrainedModel,
    pub report: TrainingReport,
}

/// A fitted, immutable model. Refitting yields a new value.
pub struct TrainedModel {
    forest: Forest,
    tree_count: usize,
    random_seed: u64,
    feature_settings: FeatureSettings,
}

impl fmt::Debug for TrainedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainedModel")
            .field("tree_count", &self.tree_count)
            .field("random_seed", &self.random_seed)
            .field("feature_settings", &self.feature_settings)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct ArtifactRef<'a> {
    format_version: u32,
    feature_names: &'a [&'a str],
    feature_settings: FeatureSettings,
    tree_count: usize,
    random_seed: u64,
    forest: &'a Forest,
}

#[derive(Deserialize)]
struct Artifact {
    format_version: u32,
    feature_names: Vec<String>,
    feature_settings: FeatureSettings,
    tree_count: usize,
    random_seed: u64,
    forest: Forest,
}

/// Training entry point for the up/not-up classifier.
pub struct SignalClassifier;

impl SignalClassifier {
    /// Shuffles `examples` with `config.random_seed`, holds out
    /// `ceil(n * test_fraction)` of them, fits on the rest and reports the
    /// held-out accuracy.
    ///
    /// The model is tagged with the default indicator periods; use
    /// `fit_with_settings` when the examples were built with other ones.
    pub fn fit(
        examples: &[TrainingExample],
        config: &ClassifierConfig,
    ) -> Result<FitOutcome, ModelError> {
        Self::fit_with_settings(examples, config, FeatureSettings::default())
    }

    /// `fit` for examples built with the given indicator periods.
    pub fn fit_with_settings(
        examples: &[TrainingExample],
        config: &ClassifierConfig,
        feature_settings: FeatureSettings,
    ) -> Result<FitOutcome, ModelError> {
        config.validate()?;
        if examples.is_empty() {
            return Err(ModelError::InsufficientData {
                reason: "no training examples".to_string(),
            });
        }

        let n = examples.len();
        let mut order: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(config.random_seed);
        order.shuffle(&mut rng);

        let n_test = ((n as f64 * config.test_fraction).ceil() as usize).min(n);
        let (test_idx, train_idx) = order.split_at(n_test);
        if train_idx.is_empty() || test_idx.is_empty() {
            return Err(ModelError::InsufficientData {
                reason: format!(
                    "{} examples cannot be split into train/test with test_fraction {}",
                    n, config.test_fraction
                ),
            });
        }

        let train: Vec<&TrainingExample> = train_idx.iter().map(|&i| &examples[i]).collect();
        let test: Vec<&TrainingExample> = test_idx.iter().map(|&i| &examples[i]).collect();
        require_both_classes(&train, "train")?;
        require_both_classes(&test, "test")?;

        info!(
            "Training Random Forest (Trees: {}, Depth: {}, MinSplit: {}, Seed: {}) on {} samples, {} held out",
            config.tree_count,
            config.max_depth,
            config.min_samples_split,
            config.random_seed,
            train.len(),
            test.len()
        );

        let rows: Vec<Vec<f64>> = train.iter().map(|e| e.features.to_vec()).collect();
        let targets: Vec<f64> = train.iter().map(|e| e.label.as_f64()).collect();
        let x = DenseMatrix::from_2d_vec(&rows).map_err(|e| ModelError::Training {
            reason: format!("Matrix creation failed: {}", e),
        })?;

        let params = RandomForestRegressorParameters::default()
            .with_n_trees(config.tree_count)
            .with_max_depth(config.max_depth)
            .with_min_samples_split(config.min_samples_split)
            .with_seed(config.random_seed);

        let forest = RandomForestRegressor::fit(&x, &targets, params).map_err(|e| {
            ModelError::Training {
                reason: e.to_string(),
            }
        })?;

        let model = TrainedModel {
            forest,
            tree_count: config.tree_count,
            random_seed: config.random_seed,
            feature_settings,
        };

        let test_examples: Vec<TrainingExample> = test.into_iter().copied().collect();
        let accuracy = Self::evaluate(&model, &test_examples)?;
        let positive_rate =
            examples.iter().filter(|e| e.label == Label::Up).count() as f64 / n as f64;

        let report = TrainingReport {
            accuracy,
            train_size: train_idx.len(),
            test_size: test_idx.len(),
            positive_rate,
        };
        info!(
            "Model accuracy: {:.4} (train={}, test={}, up-rate={:.3})",
            report.accuracy, report.train_size, report.test_size, report.positive_rate
        );

        Ok(FitOutcome { model, report })
    }

    /// Share of examples whose hard label (`p > 0.5`) matches the truth.
    pub fn evaluate(model: &TrainedModel, examples: &[TrainingExample]) -> Result<f64, ModelError> {
        if examples.is_empty() {
            return Err(ModelError::InsufficientData {
                reason: "no examples to evaluate".to_string(),
            });
        }

        let features: Vec<FeatureVector> = examples.iter().map(|e| e.features).collect();
        let probabilities = model.predict_batch(&features)?;
        let correct = probabilities
            .iter()
            .zip(examples)
            .filter(|(p, e)| hard_label(**p) == e.label)
            .count();

        Ok(correct as f64 / examples.len() as f64)
    }
}

fn require_both_classes(subset: &[&TrainingExample], which: &str) -> Result<(), ModelError> {
    let ups = subset.iter().filter(|e| e.label == Label::Up).count();
    if ups == 0 || ups == subset.len() {
        return Err(ModelError::InsufficientData {
            reason: format!(
                "{} subset of {} examples holds a single class",
                which,
                subset.len()
            ),
        });
    }
    Ok(())
}

pub fn hard_label(probability: f64) -> Label {
    if probability > 0.5 {
        Label::Up
    } else {
        Label::NotUp
    }
}

impl TrainedModel {
    pub fn tree_count(&self) -> usize {
        self.tree_count
    }

    pub fn random_seed(&self) -> u64 {
        self.random_seed
    }

    pub fn settings(&self) -> FeatureSettings {
        self.feature_settings
    }

    /// Up-probabilities for many vectors in one forest pass.
    pub fn predict_batch(&self, features: &[FeatureVector]) -> Result<Vec<f64>, ModelError> {
        if features.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<Vec<f64>> = features.iter().map(FeatureVector::to_vec).collect();
        let input = DenseMatrix::from_2d_vec(&rows).map_err(|e| ModelError::Prediction {
            reason: format!("Matrix creation failed: {}", e),
        })?;

        let predictions = self
            .forest
            .predict(&input)
            .map_err(|e| ModelError::Prediction {
                reason: e.to_string(),
            })?;
        if predictions.len() != features.len() {
            return Err(ModelError::Prediction {
                reason: format!(
                    "expected {} predictions, got {}",
                    features.len(),
                    predictions.len()
                ),
            });
        }

        Ok(predictions.into_iter().map(|p| p.clamp(0.0, 1.0)).collect())
    }

    /// Serializes the model to an opaque byte blob.
    pub fn persist(&self) -> Result<Vec<u8>, ModelError> {
        let artifact = ArtifactRef {
            format_version: ARTIFACT_FORMAT_VERSION,
            feature_names: FEATURE_NAMES,
            feature_settings: self.feature_settings,
            tree_count: self.tree_count,
            random_seed: self.random_seed,
            forest: &self.forest,
        };
        let bytes = serde_json::to_vec(&artifact).map_err(|e| ModelError::Training {
            reason: format!("Failed to serialize model: {}", e),
        })?;
        debug!("Serialized model artifact ({} bytes)", bytes.len());
        Ok(bytes)
    }

    /// Restores a model from `persist` output.
    pub fn load(bytes: &[u8]) -> Result<Self, ModelError> {
        let artifact: Artifact =
            serde_json::from_slice(bytes).map_err(|e| ModelError::CorruptArtifact {
                reason: e.to_string(),
            })?;

        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ModelError::CorruptArtifact {
                reason: format!(
                    "unsupported format version {} (expected {})",
                    artifact.format_version, ARTIFACT_FORMAT_VERSION
                ),
            });
        }
        if artifact.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES.iter().copied()) {
            return Err(ModelError::CorruptArtifact {
                reason: format!(
                    "feature layout {:?} does not match {:?}",
                    artifact.feature_names, FEATURE_NAMES
                ),
            });
        }

        info!(
            "Loaded model artifact ({} trees, seed {}, {:?})",
            artifact.tree_count, artifact.random_seed, artifact.feature_settings
        );
        Ok(Self {
            forest: artifact.forest,
            tree_count: artifact.tree_count,
            random_seed: artifact.random_seed,
            feature_settings: artifact.feature_settings,
        })
    }
}

impl MLPredictor for TrainedModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        self.predict_batch(std::slice::from_ref(features))?
            .first()
            .copied()
            .ok_or_else(|| ModelError::Prediction {
                reason: "No prediction returned".to_string(),
            })
    }

    fn name(&self) -> &str {
        "SmartCore Random Forest"
    }

    fn version(&self) -> &str {
        MODEL_VERSION
    }

    fn feature_settings(&self) -> Option<FeatureSettings> {
        Some(self.feature_settings)
    }
}
