//! Trial context for hyperparameter sampling
//!
//! A [`Trial`] wraps a seeded RNG and offers categorical, float (uniform or
//! log-uniform) and stepped integer suggestions. Every suggestion is recorded
//! into the trial's parameter map so a sample can be inspected and replayed.

use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A sampled parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Float(f64),
    Int(i64),
    Str(String),
}

impl ParamValue {
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Str(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(v) => Some(v),
            _ => None,
        }
    }
}

/// Ordered map of every parameter sampled during one trial
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrialParams {
    values: BTreeMap<String, ParamValue>,
}

impl TrialParams {
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.values.iter()
    }

    fn record(&mut self, name: &str, value: ParamValue) {
        self.values.insert(name.to_string(), value);
    }
}

/// One hyperparameter-search trial
pub struct Trial {
    rng: Xoshiro256PlusPlus,
    params: TrialParams,
}

impl Trial {
    /// Trial with a fixed seed; the same seed reproduces the same sample
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            params: TrialParams::default(),
        }
    }

    /// Trial seeded from OS entropy
    pub fn new() -> Self {
        Self {
            rng: Xoshiro256PlusPlus::from_entropy(),
            params: TrialParams::default(),
        }
    }

    /// Parameters sampled so far
    pub fn params(&self) -> &TrialParams {
        &self.params
    }

    pub fn into_params(self) -> TrialParams {
        self.params
    }

    pub fn suggest_categorical(&mut self, name: &str, choices: &[&str]) -> String {
        let idx = self.rng.gen_range(0..choices.len());
        let choice = choices[idx].to_string();
        self.params.record(name, ParamValue::Str(choice.clone()));
        choice
    }

    pub fn suggest_float(&mut self, name: &str, low: f64, high: f64) -> f64 {
        let value = self.rng.gen_range(low..high);
        self.params.record(name, ParamValue::Float(value));
        value
    }

    /// Log-uniform float in `[low, high)`; `low` must be positive
    pub fn suggest_float_log(&mut self, name: &str, low: f64, high: f64) -> f64 {
        let u: f64 = self.rng.gen_range(0.0..1.0);
        let value = (low.ln() + u * (high.ln() - low.ln())).exp();
        self.params.record(name, ParamValue::Float(value));
        value
    }

    pub fn suggest_int(&mut self, name: &str, low: i64, high: i64, step: i64) -> i64 {
        let n_steps = (high - low) / step + 1;
        let value = low + step * self.rng.gen_range(0..n_steps);
        self.params.record(name, ParamValue::Int(value));
        value
    }
}

impl Default for Trial {
    fn default() -> Self {
        Self::new()
    }
}
