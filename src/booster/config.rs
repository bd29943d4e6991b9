//! Booster configuration
//!
//! Every recognized option is an explicit typed field with a range check in
//! [`BoosterConfig::validate`], performed eagerly when an estimator is built.

use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};

/// Tree-ensemble construction strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoosterKind {
    /// Plain gradient-boosted trees
    GbTree,
    /// Dropout-regularized trees (DART)
    Dart,
}

impl BoosterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoosterKind::GbTree => "gbtree",
            BoosterKind::Dart => "dart",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "gbtree" => Ok(BoosterKind::GbTree),
            "dart" => Ok(BoosterKind::Dart),
            other => Err(invalid("booster", other, "expected gbtree or dart")),
        }
    }
}

/// Split-finding method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeMethod {
    /// Pick between exact and hist based on sample count
    Auto,
    /// Exact greedy over sorted feature values
    Exact,
    /// Quantile-binned candidate thresholds
    Hist,
}

impl TreeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TreeMethod::Auto => "auto",
            TreeMethod::Exact => "exact",
            TreeMethod::Hist => "hist",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(TreeMethod::Auto),
            "exact" => Ok(TreeMethod::Exact),
            "hist" => Ok(TreeMethod::Hist),
            other => Err(invalid("tree_method", other, "expected auto, exact or hist")),
        }
    }
}

/// Tree growth policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrowPolicy {
    /// Level-wise growth up to `max_depth`
    Depthwise,
    /// Best-first leaf-wise growth with a 2^max_depth leaf budget
    Lossguide,
}

impl GrowPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrowPolicy::Depthwise => "depthwise",
            GrowPolicy::Lossguide => "lossguide",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "depthwise" => Ok(GrowPolicy::Depthwise),
            "lossguide" => Ok(GrowPolicy::Lossguide),
            other => Err(invalid("grow_policy", other, "expected depthwise or lossguide")),
        }
    }
}

/// DART dropout selection scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleType {
    /// Every tree is dropped with the same probability
    Uniform,
    /// Drop probability proportional to tree weight
    Weighted,
}

impl SampleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleType::Uniform => "uniform",
            SampleType::Weighted => "weighted",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "uniform" => Ok(SampleType::Uniform),
            "weighted" => Ok(SampleType::Weighted),
            other => Err(invalid("sample_type", other, "expected uniform or weighted")),
        }
    }
}

/// DART weight renormalization scheme after a dropout round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizeType {
    /// New tree weighted like each dropped tree
    Tree,
    /// New tree weighted like the sum of dropped trees
    Forest,
}

impl NormalizeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NormalizeType::Tree => "tree",
            NormalizeType::Forest => "forest",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "tree" => Ok(NormalizeType::Tree),
            "forest" => Ok(NormalizeType::Forest),
            other => Err(invalid("normalize_type", other, "expected tree or forest")),
        }
    }
}

/// Training objective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Objective {
    /// Squared-error regression
    SquaredError,
    /// Multiclass softmax, predictions are class indices
    MultiSoftmax { num_class: usize },
}

impl Objective {
    /// Number of score groups (trees per boosting round)
    pub fn n_groups(&self) -> usize {
        match self {
            Objective::SquaredError => 1,
            Objective::MultiSoftmax { num_class } => *num_class,
        }
    }
}

/// Gradient-boosted tree configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoosterConfig {
    pub booster: BoosterKind,
    pub tree_method: TreeMethod,
    pub grow_policy: GrowPolicy,
    pub objective: Objective,
    pub n_estimators: usize,
    /// Learning rate (eta)
    pub learning_rate: f64,
    pub max_depth: usize,
    /// Minimum sum of hessians in a child
    pub min_child_weight: f64,
    /// L2 regularization on leaf weights
    pub reg_lambda: f64,
    /// L1 regularization on leaf weights
    pub reg_alpha: f64,
    /// Minimum gain to make a split
    pub gamma: f64,
    pub subsample: f64,
    pub colsample_bytree: f64,
    pub sample_type: SampleType,
    pub normalize_type: NormalizeType,
    pub rate_drop: f64,
    pub skip_drop: f64,
    pub verbosity: u8,
    pub random_state: Option<u64>,
}

impl Default for BoosterConfig {
    fn default() -> Self {
        Self {
            booster: BoosterKind::GbTree,
            tree_method: TreeMethod::Auto,
            grow_policy: GrowPolicy::Depthwise,
            objective: Objective::SquaredError,
            n_estimators: 100,
            learning_rate: 0.3,
            max_depth: 6,
            min_child_weight: 1.0,
            reg_lambda: 1.0,
            reg_alpha: 0.0,
            gamma: 0.0,
            subsample: 1.0,
            colsample_bytree: 1.0,
            sample_type: SampleType::Uniform,
            normalize_type: NormalizeType::Tree,
            rate_drop: 0.0,
            skip_drop: 0.0,
            verbosity: 0,
            random_state: Some(42),
        }
    }
}

fn invalid(name: &str, value: impl ToString, reason: &str) -> BridgeError {
    BridgeError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

impl BoosterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(invalid("n_estimators", self.n_estimators, "must be at least 1"));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(invalid("learning_rate", self.learning_rate, "must be in (0, 1]"));
        }
        if self.max_depth == 0 {
            return Err(invalid("max_depth", self.max_depth, "must be at least 1"));
        }
        if self.min_child_weight < 0.0 {
            return Err(invalid("min_child_weight", self.min_child_weight, "must be non-negative"));
        }
        if self.reg_lambda < 0.0 {
            return Err(invalid("reg_lambda", self.reg_lambda, "must be non-negative"));
        }
        if self.reg_alpha < 0.0 {
            return Err(invalid("reg_alpha", self.reg_alpha, "must be non-negative"));
        }
        if self.gamma < 0.0 {
            return Err(invalid("gamma", self.gamma, "must be non-negative"));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(invalid("subsample", self.subsample, "must be in (0, 1]"));
        }
        if !(self.colsample_bytree > 0.0 && self.colsample_bytree <= 1.0) {
            return Err(invalid("colsample_bytree", self.colsample_bytree, "must be in (0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.rate_drop) {
            return Err(invalid("rate_drop", self.rate_drop, "must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.skip_drop) {
            return Err(invalid("skip_drop", self.skip_drop, "must be in [0, 1]"));
        }
        if let Objective::MultiSoftmax { num_class } = self.objective {
            if num_class < 2 {
                return Err(invalid("num_class", num_class, "must be at least 2"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(BoosterConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_estimators() {
        let config = BoosterConfig {
            n_estimators: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(BridgeError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_rejects_single_class_softmax() {
        let config = BoosterConfig {
            objective: Objective::MultiSoftmax { num_class: 1 },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_out_of_range_subsample() {
        let config = BoosterConfig {
            subsample: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_enum_round_trip() {
        assert_eq!(BoosterKind::parse("dart").unwrap(), BoosterKind::Dart);
        assert_eq!(BoosterKind::Dart.as_str(), "dart");
        assert_eq!(GrowPolicy::parse("lossguide").unwrap(), GrowPolicy::Lossguide);
        assert!(SampleType::parse("bogus").is_err());
    }
}
