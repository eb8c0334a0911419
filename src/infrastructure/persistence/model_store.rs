//! File storage for persisted model artifacts.
//!
//! The store only moves opaque bytes; decoding them is the classifier's job.

use crate::application::ml::signal_classifier::TrainedModel;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Handles persistence of a model artifact to disk.
pub struct ModelStore {
    file_path: PathBuf,
}

impl ModelStore {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn exists(&self) -> bool {
        self.file_path.exists()
    }

    /// Writes the model, creating parent directories as needed.
    pub fn save(&self, model: &TrainedModel) -> Result<()> {
        let bytes = model.persist().context("Failed to serialize model")?;

        if let Some(parent) = self.file_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).context("Failed to create model directory")?;
        }

        // Atomic write: write to temp file then rename
        let temp_path = self.file_path.with_extension("tmp");
        fs::write(&temp_path, bytes).context("Failed to write temp file")?;
        fs::rename(&temp_path, &self.file_path).context("Failed to rename temp file")?;

        info!("Saved model to {:?}", self.file_path);
        Ok(())
    }

    /// Reads and decodes the model.
    pub fn load(&self) -> Result<TrainedModel> {
        let bytes = fs::read(&self.file_path)
            .with_context(|| format!("Failed to read model file {:?}", self.file_path))?;
        let model = TrainedModel::load(&bytes)
            .with_context(|| format!("Failed to decode model file {:?}", self.file_path))?;

        info!("Loaded model from {:?}", self.file_path);
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ml::predictor::MLPredictor;
    use crate::application::ml::signal_classifier::SignalClassifier;
    use crate::config::ClassifierConfig;
    use crate::domain::errors::ModelError;
    use crate::domain::ml::feature_registry::{FeatureVector, Label, TrainingExample};
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn create_test_dir() -> PathBuf {
        let unique_id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let temp_dir = std::env::temp_dir().join(format!(
            "rustsignal_test_{}_{}_{}_models",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or(0),
            unique_id
        ));
        fs::create_dir_all(&temp_dir).expect("Failed to create test temp dir");
        temp_dir
    }

    fn cleanup_test_dir(temp_dir: PathBuf) {
        fs::remove_dir_all(temp_dir).ok();
    }

    fn trained_model() -> TrainedModel {
        let examples: Vec<TrainingExample> = (0..60)
            .map(|i| {
                let rsi = (i * 31 % 100) as f64;
                TrainingExample {
                    features: FeatureVector {
                        index: i,
                        rsi,
                        sma_20: rsi,
                        sma_50: rsi,
                        price_change: rsi,
                        volume_change: rsi,
                    },
                    label: if rsi > 40.0 { Label::Up } else { Label::NotUp },
                }
            })
            .collect();
        let config = ClassifierConfig {
            tree_count: 5,
            ..Default::default()
        };
        SignalClassifier::fit(&examples, &config).unwrap().model
    }

    #[test]
    fn test_save_then_load_predicts_identically() {
        let temp_dir = create_test_dir();
        let store = ModelStore::new(temp_dir.join("nested").join("model.json"));
        let model = trained_model();

        store.save(&model).unwrap();
        assert!(store.exists());
        let loaded = store.load().unwrap();

        let sample = FeatureVector {
            index: 0,
            rsi: 55.0,
            sma_20: 55.0,
            sma_50: 55.0,
            price_change: 55.0,
            volume_change: 55.0,
        };
        assert_eq!(model.predict(&sample).unwrap(), loaded.predict(&sample).unwrap());
        cleanup_test_dir(temp_dir);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let temp_dir = create_test_dir();
        let store = ModelStore::new(temp_dir.join("absent.json"));
        assert!(store.load().is_err());
        cleanup_test_dir(temp_dir);
    }

    #[test]
    fn test_load_corrupt_file_reports_artifact_error() {
        let temp_dir = create_test_dir();
        let path = temp_dir.join("model.json");
        fs::write(&path, b"{\"format_version\": 1").unwrap();

        let err = ModelStore::new(&path).load().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ModelError>(),
            Some(ModelError::CorruptArtifact { .. })
        ));
        cleanup_test_dir(temp_dir);
    }
}
