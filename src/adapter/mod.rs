//! Gradient-boosted tree model adapters
//!
//! [`GbtClassifier`] and [`GbtRegressor`] marshal a small set of constructor
//! options into the booster engine, fix the objective per variant, and expose
//! the host framework's capability surface: fit/predict, portable export and
//! a hyperparameter search space.

mod classifier;
mod regressor;

pub use classifier::GbtClassifier;
pub use regressor::GbtRegressor;

use crate::booster::{BoosterKind, TreeMethod};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Constructor options shared by both adapter variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbtOptions {
    pub verbosity: u8,
    pub tree_method: TreeMethod,
    pub booster: BoosterKind,
    pub reg_lambda: f64,
    pub reg_alpha: f64,
}

impl Default for GbtOptions {
    fn default() -> Self {
        Self {
            verbosity: 0,
            tree_method: TreeMethod::Auto,
            booster: BoosterKind::Dart,
            reg_lambda: 1.0,
            reg_alpha: 0.0,
        }
    }
}

/// Input shape as recorded at fit time: unbound batch plus trailing dims
pub(crate) fn record_shape(x: &Array2<f64>) -> Vec<Option<usize>> {
    let mut shape: Vec<Option<usize>> = vec![None];
    shape.extend(x.shape()[1..].iter().map(|&d| Some(d)));
    shape
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_record_shape_unbinds_batch() {
        let x = Array2::<f64>::zeros((10, 4));
        assert_eq!(record_shape(&x), vec![None, Some(4)]);
    }

    #[test]
    fn test_default_options() {
        let opts = GbtOptions::default();
        assert_eq!(opts.booster, BoosterKind::Dart);
        assert_eq!(opts.reg_lambda, 1.0);
        assert_eq!(opts.reg_alpha, 0.0);
    }
}
