//! Capability traits models expose to the host framework

use crate::error::Result;
use crate::export::SerializedModel;
use crate::search::SearchObjective;
use ndarray::{Array1, Array2};

/// Trait for ML models
pub trait Model: Send + Sync {
    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Make predictions
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Get feature importances (if available)
    fn feature_importances(&self) -> Option<Array1<f64>> {
        None
    }

    /// Save model to bytes
    fn to_bytes(&self) -> Result<Vec<u8>>;

    /// Load model from bytes
    fn from_bytes(bytes: &[u8]) -> Result<Self>
    where
        Self: Sized;
}

/// Models convertible to the portable inference-graph format
pub trait PortableModel {
    /// Serialize the fitted model to a portable computation graph
    fn to_portable(&self) -> Result<SerializedModel>;
}

/// Models that provide a hyperparameter search space for tuning
pub trait SearchSpaceProvider {
    /// Objective closure sampling one hyperparameter set per trial
    fn search_objective() -> SearchObjective;
}
