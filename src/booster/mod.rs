//! Boosted-tree training engine
//!
//! Provides the gradient-boosted estimator the adapters delegate to:
//! - Typed, validated configuration ([`BoosterConfig`])
//! - Plain gradient boosting and DART dropout boosting
//! - Exact and histogram split finding, depthwise and leaf-wise growth

mod config;
mod estimator;
pub(crate) mod tree;

pub use config::{
    BoosterConfig, BoosterKind, GrowPolicy, NormalizeType, Objective, SampleType, TreeMethod,
};
pub use estimator::GbtEstimator;

pub(crate) use estimator::Tree;
