//! Error types for the boostbridge crate

use thiserror::Error;

/// Result type alias for boostbridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Training error: {0}")]
    Training(String),

    #[error("Prediction error: {0}")]
    Prediction(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Invalid shape: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization(err.to_string())
    }
}

impl From<ndarray::ShapeError> for BridgeError {
    fn from(err: ndarray::ShapeError) -> Self {
        BridgeError::Shape {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
