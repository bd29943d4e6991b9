//! Converter registry
//!
//! Pairs each estimator family with a shape-calculation strategy and a
//! conversion strategy. Registration is an explicit call the host makes once
//! at startup; repeating it overwrites the same mappings and is harmless.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::booster::GbtEstimator;
use crate::error::{BridgeError, Result};
use crate::export::convert::{
    classifier_output_shapes, convert_gbt_classifier, convert_gbt_regressor,
    regressor_output_shapes, ConverterFn, ConverterOptions, ShapeCalculator,
};
use crate::export::graph::{DataType, Graph, SerializedModel};

/// Estimator families the registry distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFamily {
    GbtRegressor,
    GbtClassifier,
}

impl ModelFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFamily::GbtRegressor => "GbtRegressor",
            ModelFamily::GbtClassifier => "GbtClassifier",
        }
    }
}

/// One registered conversion: strategies plus feature toggles
#[derive(Clone)]
pub struct RegisteredConverter {
    pub name: &'static str,
    pub shape_calculator: ShapeCalculator,
    pub converter: ConverterFn,
    pub options: ConverterOptions,
}

fn registry() -> &'static RwLock<HashMap<ModelFamily, RegisteredConverter>> {
    static REGISTRY: OnceLock<RwLock<HashMap<ModelFamily, RegisteredConverter>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Register the converters for both estimator families.
///
/// Idempotent: calling again overwrites the same mappings and returns Ok.
/// The host invokes this once at startup, before any export.
pub fn register_converters() -> Result<()> {
    let mut reg = registry().write();
    reg.insert(
        ModelFamily::GbtRegressor,
        RegisteredConverter {
            name: "GbtRegressor",
            shape_calculator: regressor_output_shapes,
            converter: convert_gbt_regressor,
            options: ConverterOptions {
                suppress_class_labels: false,
                probability_map: false,
            },
        },
    );
    reg.insert(
        ModelFamily::GbtClassifier,
        RegisteredConverter {
            name: "GbtClassifier",
            shape_calculator: classifier_output_shapes,
            converter: convert_gbt_classifier,
            options: ConverterOptions::default(),
        },
    );
    Ok(())
}

/// Whether a converter is registered for the given family
pub fn is_registered(family: ModelFamily) -> bool {
    registry().read().contains_key(&family)
}

/// Convert a fitted estimator using its registered strategies.
///
/// The declared output dtype list is a single `Float32` marker regardless of
/// the graph's actual output arity, matching the upstream convention.
pub(crate) fn convert_registered(
    family: ModelFamily,
    estimator: &GbtEstimator,
    input_shape: &[Option<usize>],
) -> Result<SerializedModel> {
    let reg = registry().read();
    let conv = reg.get(&family).ok_or_else(|| {
        BridgeError::Export(format!(
            "no converter registered for {}; call register_converters() first",
            family.as_str()
        ))
    })?;

    let (inputs, outputs) = (conv.shape_calculator)(estimator, input_shape, &conv.options);
    let nodes = (conv.converter)(estimator, &conv.options);
    let graph = Graph {
        name: conv.name.to_string(),
        inputs,
        outputs,
        nodes,
    };

    let n_inputs = graph.inputs.len();
    let n_outputs = graph.outputs.len();
    Ok(SerializedModel {
        graph,
        n_inputs,
        n_outputs,
        output_dtypes: vec![DataType::Float32],
        input_shapes: vec![input_shape.to_vec()],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Tests below mutate the process-wide registry; keep them serialized.
    static REGISTRY_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_registration_idempotent() {
        let _guard = REGISTRY_TEST_LOCK.lock().unwrap();
        register_converters().unwrap();
        register_converters().unwrap();
        assert!(is_registered(ModelFamily::GbtRegressor));
        assert!(is_registered(ModelFamily::GbtClassifier));
    }

    #[test]
    fn test_unregistered_family_errors() {
        let _guard = REGISTRY_TEST_LOCK.lock().unwrap();
        let saved = registry().write().remove(&ModelFamily::GbtRegressor);

        let est = GbtEstimator::new(Default::default()).unwrap();
        let err = convert_registered(ModelFamily::GbtRegressor, &est, &[None, Some(2)]);
        assert!(matches!(err, Err(BridgeError::Export(_))));

        if let Some(saved) = saved {
            registry().write().insert(ModelFamily::GbtRegressor, saved);
        }
    }
}
