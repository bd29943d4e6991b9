//! Gradient-boosted tree estimator
//!
//! Trains one tree per score group per round (one group for regression,
//! `num_class` groups for softmax). DART rounds drop a subset of prior trees
//! before computing gradients and renormalize weights afterwards.

use crate::error::{BridgeError, Result};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::config::{BoosterConfig, BoosterKind, NormalizeType, Objective, SampleType, TreeMethod};
use super::tree::{build_tree, quantile_cuts, Node, TreeParams};

/// One member of the ensemble
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Tree {
    pub root: Node,
    pub weight: f64,
    pub group: usize,
}

/// Fitted gradient-boosted tree ensemble
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbtEstimator {
    config: BoosterConfig,
    trees: Vec<Tree>,
    /// Initial score per group
    base_score: Vec<f64>,
    /// Sorted distinct label values (classification only)
    classes: Vec<f64>,
    n_features: usize,
    fitted: bool,
}

impl GbtEstimator {
    /// Create an unfitted estimator; the configuration is validated eagerly
    pub fn new(config: BoosterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            trees: Vec::new(),
            base_score: Vec::new(),
            classes: Vec::new(),
            n_features: 0,
            fitted: false,
        })
    }

    pub fn config(&self) -> &BoosterConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Class count for softmax objectives
    pub fn num_class(&self) -> Option<usize> {
        match self.config.objective {
            Objective::MultiSoftmax { num_class } => Some(num_class),
            Objective::SquaredError => None,
        }
    }

    pub(crate) fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub(crate) fn classes(&self) -> &[f64] {
        &self.classes
    }

    pub(crate) fn base_score(&self) -> &[f64] {
        &self.base_score
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.config.validate()?;
        let n_samples = x.nrows();
        let n_features = x.ncols();
        if y.len() != n_samples {
            return Err(BridgeError::Shape {
                expected: format!("{n_samples} labels"),
                actual: format!("{}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(BridgeError::Training("cannot fit on an empty feature matrix".to_string()));
        }

        let n_groups = self.config.objective.n_groups();
        let targets = self.prepare_targets(y)?;
        self.n_features = n_features;

        self.base_score = match self.config.objective {
            Objective::SquaredError => vec![y.mean().unwrap_or(0.0)],
            Objective::MultiSoftmax { num_class } => vec![0.0; num_class],
        };

        let use_hist = match self.config.tree_method {
            TreeMethod::Exact => false,
            TreeMethod::Hist => true,
            TreeMethod::Auto => n_samples > 1024,
        };
        let cuts = if use_hist { Some(quantile_cuts(x, 256)) } else { None };

        let mut rng = match self.config.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        if self.config.verbosity > 0 {
            debug!(
                n_samples,
                n_features,
                n_estimators = self.config.n_estimators,
                booster = self.config.booster.as_str(),
                "fitting gradient boosted ensemble"
            );
        }

        // Running scores per (sample, group), kept consistent with tree weights
        let mut raw = Array2::from_shape_fn((n_samples, n_groups), |(_, g)| self.base_score[g]);
        self.trees.clear();

        for round in 0..self.config.n_estimators {
            let dropped = self.select_dropout(&mut rng);
            let k = dropped.len();

            // Cache dropped-tree predictions; needed again for renormalization
            let dropped_preds: Vec<(usize, Vec<f64>)> = dropped
                .iter()
                .map(|&t| {
                    let tree = &self.trees[t];
                    let preds: Vec<f64> = (0..n_samples).map(|i| tree.root.predict(&x.row(i))).collect();
                    (t, preds)
                })
                .collect();

            let mut scores = raw.clone();
            for (t, preds) in &dropped_preds {
                let tree = &self.trees[*t];
                for i in 0..n_samples {
                    scores[[i, tree.group]] -= tree.weight * preds[i];
                }
            }

            let (grads, hessians) = self.gradients(&scores, y, &targets);

            let rows = subsample(&mut rng, n_samples, self.config.subsample);
            let params = TreeParams {
                max_depth: self.config.max_depth,
                min_child_weight: self.config.min_child_weight,
                reg_lambda: self.config.reg_lambda,
                reg_alpha: self.config.reg_alpha,
                gamma: self.config.gamma,
                grow_policy: self.config.grow_policy,
                cuts: cuts.as_deref(),
            };

            let lr = self.config.learning_rate;
            let (new_weight, drop_scale) = if k > 0 {
                match self.config.normalize_type {
                    NormalizeType::Tree => (lr / (k as f64 + lr), k as f64 / (k as f64 + lr)),
                    NormalizeType::Forest => (lr / (1.0 + lr), 1.0 / (1.0 + lr)),
                }
            } else {
                (lr, 1.0)
            };

            for (t, preds) in &dropped_preds {
                let old_weight = self.trees[*t].weight;
                let group = self.trees[*t].group;
                let delta = old_weight * (drop_scale - 1.0);
                for i in 0..n_samples {
                    raw[[i, group]] += delta * preds[i];
                }
                self.trees[*t].weight = old_weight * drop_scale;
            }

            for group in 0..n_groups {
                let cols = subsample(&mut rng, n_features, self.config.colsample_bytree);
                let root = build_tree(x, &grads[group], &hessians[group], &rows, &cols, &params);
                for i in 0..n_samples {
                    raw[[i, group]] += new_weight * root.predict(&x.row(i));
                }
                self.trees.push(Tree { root, weight: new_weight, group });
            }

            if self.config.verbosity >= 2 {
                trace!(round, dropped = k, "boosting round complete");
            }
        }

        self.fitted = true;
        if self.config.verbosity > 0 {
            debug!(n_trees = self.trees.len(), "ensemble fitted");
        }
        Ok(())
    }

    /// Map labels to group indices for softmax; empty for regression
    fn prepare_targets(&mut self, y: &Array1<f64>) -> Result<Vec<usize>> {
        match self.config.objective {
            Objective::SquaredError => {
                self.classes.clear();
                Ok(Vec::new())
            }
            Objective::MultiSoftmax { num_class } => {
                let mut classes: Vec<f64> = y.iter().copied().collect();
                classes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                classes.dedup();
                if classes.len() != num_class {
                    return Err(BridgeError::Training(format!(
                        "num_class = {num_class} but labels contain {} distinct values",
                        classes.len()
                    )));
                }
                let targets = y
                    .iter()
                    .map(|v| {
                        classes
                            .iter()
                            .position(|c| c == v)
                            .ok_or_else(|| BridgeError::Training(format!("label {v} not in class set")))
                    })
                    .collect::<Result<Vec<usize>>>()?;
                self.classes = classes;
                Ok(targets)
            }
        }
    }

    /// First- and second-order gradients per group
    fn gradients(
        &self,
        scores: &Array2<f64>,
        y: &Array1<f64>,
        targets: &[usize],
    ) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        let n_samples = scores.nrows();
        match self.config.objective {
            Objective::SquaredError => {
                let grad: Vec<f64> = (0..n_samples).map(|i| scores[[i, 0]] - y[i]).collect();
                let hess = vec![1.0; n_samples];
                (vec![grad], vec![hess])
            }
            Objective::MultiSoftmax { num_class } => {
                let mut grads = vec![vec![0.0; n_samples]; num_class];
                let mut hessians = vec![vec![0.0; n_samples]; num_class];
                for i in 0..n_samples {
                    let probs = softmax_row(scores, i, num_class);
                    for c in 0..num_class {
                        let p = probs[c];
                        let label = if targets[i] == c { 1.0 } else { 0.0 };
                        grads[c][i] = p - label;
                        hessians[c][i] = (2.0 * p * (1.0 - p)).max(1e-16);
                    }
                }
                (grads, hessians)
            }
        }
    }

    fn select_dropout(&self, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
        if self.config.booster != BoosterKind::Dart
            || self.trees.is_empty()
            || self.config.rate_drop <= 0.0
        {
            return Vec::new();
        }
        if rng.gen::<f64>() < self.config.skip_drop {
            return Vec::new();
        }

        let rate = self.config.rate_drop;
        match self.config.sample_type {
            SampleType::Uniform => {
                let mut dropped = Vec::new();
                for t in 0..self.trees.len() {
                    if rng.gen::<f64>() < rate {
                        dropped.push(t);
                    }
                }
                dropped
            }
            SampleType::Weighted => {
                let total: f64 = self.trees.iter().map(|t| t.weight.abs()).sum();
                if total <= 0.0 {
                    return Vec::new();
                }
                let n = self.trees.len() as f64;
                let mut dropped = Vec::new();
                for (t, tree) in self.trees.iter().enumerate() {
                    let p = (rate * tree.weight.abs() * n / total).min(1.0);
                    if rng.gen::<f64>() < p {
                        dropped.push(t);
                    }
                }
                dropped
            }
        }
    }

    /// Raw ensemble scores per (sample, group)
    fn decision_scores(&self, x: &Array2<f64>) -> Array2<f64> {
        let n_samples = x.nrows();
        let n_groups = self.base_score.len();
        let mut scores = Array2::from_shape_fn((n_samples, n_groups), |(_, g)| self.base_score[g]);
        for tree in &self.trees {
            for i in 0..n_samples {
                scores[[i, tree.group]] += tree.weight * tree.root.predict(&x.row(i));
            }
        }
        scores
    }

    /// Predict: regression scores, or class labels for softmax
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.fitted {
            return Err(BridgeError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(BridgeError::Shape {
                expected: format!("{} features", self.n_features),
                actual: format!("{}", x.ncols()),
            });
        }

        let scores = self.decision_scores(x);
        match self.config.objective {
            Objective::SquaredError => Ok(scores.column(0).to_owned()),
            Objective::MultiSoftmax { num_class } => {
                let preds = (0..x.nrows())
                    .map(|i| {
                        let mut best = 0;
                        for c in 1..num_class {
                            if scores[[i, c]] > scores[[i, best]] {
                                best = c;
                            }
                        }
                        self.classes[best]
                    })
                    .collect();
                Ok(preds)
            }
        }
    }

    /// Per-class probabilities (softmax objective only)
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.fitted {
            return Err(BridgeError::ModelNotFitted);
        }
        let num_class = match self.config.objective {
            Objective::MultiSoftmax { num_class } => num_class,
            Objective::SquaredError => {
                return Err(BridgeError::Prediction(
                    "predict_proba is only defined for classification".to_string(),
                ))
            }
        };

        let scores = self.decision_scores(x);
        let mut probs = Array2::zeros((x.nrows(), num_class));
        for i in 0..x.nrows() {
            let row = softmax_row(&scores, i, num_class);
            for c in 0..num_class {
                probs[[i, c]] = row[c];
            }
        }
        Ok(probs)
    }

    /// Split-count feature importances, normalized to sum to one
    pub fn feature_importances(&self) -> Option<Array1<f64>> {
        if !self.fitted || self.n_features == 0 {
            return None;
        }
        let mut counts = vec![0.0f64; self.n_features];
        for tree in &self.trees {
            tree.root.count_splits(&mut counts);
        }
        let total: f64 = counts.iter().sum();
        if total > 0.0 {
            for c in counts.iter_mut() {
                *c /= total;
            }
        }
        Some(Array1::from_vec(counts))
    }
}

fn softmax_row(scores: &Array2<f64>, i: usize, n_groups: usize) -> Vec<f64> {
    let max = (0..n_groups).fold(f64::NEG_INFINITY, |m, c| m.max(scores[[i, c]]));
    let exps: Vec<f64> = (0..n_groups).map(|c| (scores[[i, c]] - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn subsample(rng: &mut Xoshiro256PlusPlus, n: usize, ratio: f64) -> Vec<usize> {
    if ratio >= 1.0 {
        return (0..n).collect();
    }
    let k = ((n as f64) * ratio).ceil() as usize;
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    indices.truncate(k.max(1));
    indices.sort();
    indices
}
