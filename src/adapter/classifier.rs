//! Gradient-boosted tree classifier adapter

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{record_shape, GbtOptions};
use crate::booster::{BoosterConfig, GbtEstimator, Objective};
use crate::error::{BridgeError, Result};
use crate::export::{convert_registered, ModelFamily, SerializedModel};
use crate::model::{Model, PortableModel, SearchSpaceProvider};
use crate::search::{search_objective, SearchObjective, SearchTask};

/// Multiclass gradient-boosted tree classifier.
///
/// The class count is inferred from the distinct label values at fit time and
/// written into the configuration before the estimator is constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbtClassifier {
    config: BoosterConfig,
    estimator: Option<GbtEstimator>,
    input_shape: Option<Vec<Option<usize>>>,
}

impl GbtClassifier {
    pub fn new(options: GbtOptions) -> Result<Self> {
        let config = BoosterConfig {
            booster: options.booster,
            tree_method: options.tree_method,
            reg_lambda: options.reg_lambda,
            reg_alpha: options.reg_alpha,
            verbosity: options.verbosity,
            // Provisional class count; fit infers the real one from labels
            objective: Objective::MultiSoftmax { num_class: 2 },
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

    /// Class count inferred during the last fit
    pub fn num_class(&self) -> Option<usize> {
        match self.config.objective {
            Objective::MultiSoftmax { num_class } => Some(num_class),
            Objective::SquaredError => None,
        }
    }

    /// Input shape recorded during the last fit
    pub fn input_shape(&self) -> Option<&[Option<usize>]> {
        self.input_shape.as_deref()
    }

    /// Per-class probabilities for the fitted model
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.estimator
            .as_ref()
            .ok_or(BridgeError::ModelNotFitted)?
            .predict_proba(x)
    }
}

impl Model for GbtClassifier {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.input_shape = Some(record_shape(x));

        let num_class = distinct_labels(y);
        self.config.objective = Objective::MultiSoftmax { num_class };
        debug!(num_class, "inferred class count from labels");

        let mut estimator = GbtEstimator::new(self.config.clone())?;
        estimator.fit(x, y)?;
        // Any previously fitted state is overwritten
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

impl PortableModel for GbtClassifier {
    fn to_portable(&self) -> Result<SerializedModel> {
        let estimator = self.estimator.as_ref().ok_or(BridgeError::ModelNotFitted)?;
        let shape = self.input_shape.as_ref().ok_or(BridgeError::ModelNotFitted)?;
        convert_registered(ModelFamily::GbtClassifier, estimator, shape)
    }
}

impl SearchSpaceProvider for GbtClassifier {
    fn search_objective() -> SearchObjective {
        search_objective(SearchTask::Classification)
    }
}

fn distinct_labels(y: &Array1<f64>) -> usize {
    let mut vals: Vec<f64> = y.iter().copied().collect();
    vals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    vals.dedup();
    vals.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn three_class_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_vec((30, 2), (0..60).map(|i| i as f64 * 0.2).collect()).unwrap();
        let y: Array1<f64> = (0..30).map(|i| (i / 10) as f64).collect();
        (x, y)
    }

    fn quick_classifier() -> GbtClassifier {
        let mut clf = GbtClassifier::with_defaults().unwrap();
        clf.config.n_estimators = 5;
        clf
    }

    #[test]
    fn test_fit_infers_class_count() {
        let (x, y) = three_class_data();
        let mut clf = quick_classifier();
        clf.fit(&x, &y).unwrap();
        assert_eq!(clf.num_class(), Some(3));
    }

    #[test]
    fn test_fit_records_input_shape() {
        let (x, y) = three_class_data();
        let mut clf = quick_classifier();
        assert!(clf.input_shape().is_none());
        clf.fit(&x, &y).unwrap();
        assert_eq!(clf.input_shape(), Some(&[None, Some(2)][..]));
    }

    #[test]
    fn test_predict_row_count() {
        let (x, y) = three_class_data();
        let mut clf = quick_classifier();
        clf.fit(&x, &y).unwrap();
        let preds = clf.predict(&x).unwrap();
        assert_eq!(preds.len(), x.nrows());
    }

    #[test]
    fn test_predict_before_fit_errors() {
        let clf = GbtClassifier::with_defaults().unwrap();
        let x = Array2::zeros((4, 2));
        assert!(matches!(clf.predict(&x), Err(BridgeError::ModelNotFitted)));
    }

    #[test]
    fn test_refit_overwrites_class_count() {
        let (x, y3) = three_class_data();
        let y2: Array1<f64> = (0..30).map(|i| (i % 2) as f64).collect();

        let mut clf = quick_classifier();
        clf.fit(&x, &y3).unwrap();
        assert_eq!(clf.num_class(), Some(3));
        clf.fit(&x, &y2).unwrap();
        assert_eq!(clf.num_class(), Some(2));
    }

    #[test]
    fn test_bytes_round_trip() {
        let (x, y) = three_class_data();
        let mut clf = quick_classifier();
        clf.fit(&x, &y).unwrap();

        let bytes = clf.to_bytes().unwrap();
        let restored = GbtClassifier::from_bytes(&bytes).unwrap();
        assert_eq!(restored.predict(&x).unwrap(), clf.predict(&x).unwrap());
    }

    #[test]
    fn test_predict_proba_shape() {
        let (x, y) = three_class_data();
        let mut clf = quick_classifier();
        clf.fit(&x, &y).unwrap();
        let probs = clf.predict_proba(&x).unwrap();
        assert_eq!(probs.dim(), (30, 3));
    }
}
