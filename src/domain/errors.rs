use thiserror::Error;

/// Errors raised by the append-only OHLCV buffer
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("Out-of-order observation: timestamp {timestamp} <= last stored {last}")]
    OutOfOrder { timestamp: i64, last: i64 },

    #[error(
        "Insufficient history: window of {requested} ending at index {end_index} but only {available} observations available"
    )]
    InsufficientHistory {
        end_index: usize,
        requested: usize,
        available: usize,
    },
}

/// Errors related to classifier training, inference and artifacts
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Insufficient training data: {reason}")]
    InsufficientData { reason: String },

    #[error("Corrupt model artifact: {reason}")]
    CorruptArtifact { reason: String },

    #[error("Invalid classifier configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Training failed: {reason}")]
    Training { reason: String },

    #[error("Prediction failed: {reason}")]
    Prediction { reason: String },

    #[error("Model features do not match indicator settings: {reason}")]
    FeatureMismatch { reason: String },
}

/// Errors raised while deciding a signal for an index
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Index {index} out of range for series of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Model(#[from] ModelError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_error_formatting() {
        let err = SeriesError::InsufficientHistory {
            end_index: 3,
            requested: 10,
            available: 4,
        };

        let msg = err.to_string();
        assert!(msg.contains("10"));
        assert!(msg.contains("index 3"));
        assert!(msg.contains("only 4"));
    }

    #[test]
    fn test_engine_error_wraps_model_error() {
        let err: EngineError = ModelError::Prediction {
            reason: "empty output".to_string(),
        }
        .into();

        assert_eq!(err.to_string(), "Prediction failed: empty output");
    }
}
