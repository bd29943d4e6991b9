//! Gradient-boosted tree regressor adapter

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::{record_shape, GbtOptions};
use crate::booster::{BoosterConfig, GbtEstimator, Objective};
use crate::error::{BridgeError, Result};
use crate::export::{convert_registered, ModelFamily, SerializedModel};
use crate::model::{Model, PortableModel, SearchSpaceProvider};
use crate::search::{search_objective, SearchObjective, SearchTask};

/// Squared-error gradient-boosted tree regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbtRegressor {
    config: BoosterConfig,
    estimator: Option<GbtEstimator>,
    input_shape: Option<Vec<Option<usize>>>,
}

impl GbtRegressor {
    pub fn new(options: GbtOptions) -> Result<Self> {
        let config = BoosterConfig {
            booster: options.booster,
            tree_method: options.tree_method,
            reg_lambda: options.reg_lambda,
            reg_alpha: options.reg_alpha,
            verbosity: options.verbosity,
            objective: Objective::SquaredError,
            ..Default::default()
        };
        config.validate()?;
        Ok(Self {
            config,
            estimator: None,
            input_shape: None,
        })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(GbtOptions::default())
    }

    /// Input shape recorded during the last fit
    pub fn input_shape(&self) -> Option<&[Option<usize>]> {
        self.input_shape.as_deref()
    }
}

impl Model for GbtRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.input_shape = Some(record_shape(x));
        let mut estimator = GbtEstimator::new(self.config.clone())?;
        estimator.fit(x, y)?;
        self.estimator = Some(estimator);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.estimator
            .as_ref()
            .ok_or(BridgeError::ModelNotFitted)?
            .predict(x)
    }

    fn feature_importances(&self) -> Option<Array1<f64>> {
        self.estimator.as_ref().and_then(GbtEstimator::feature_importances)
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl PortableModel for GbtRegressor {
    fn to_portable(&self) -> Result<SerializedModel> {
        let estimator = self.estimator.as_ref().ok_or(BridgeError::ModelNotFitted)?;
        let shape = self.input_shape.as_ref().ok_or(BridgeError::ModelNotFitted)?;
        convert_registered(ModelFamily::GbtRegressor, estimator, shape)
    }
}

impl SearchSpaceProvider for GbtRegressor {
    fn search_objective() -> SearchObjective {
        search_objective(SearchTask::Regression)
    }
}
