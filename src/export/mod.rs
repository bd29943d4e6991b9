//! Portable-format export
//!
//! Converts fitted estimators to a framework-neutral computation graph:
//! - [`graph`] - graph, tensor and attribute model with JSON serialization
//! - [`convert`] - per-family shape and conversion strategies
//! - [`registry`] - explicit, idempotent converter registration

mod convert;
mod graph;
mod registry;

pub use convert::{
    classifier_output_shapes, convert_gbt_classifier, convert_gbt_regressor,
    regressor_output_shapes, ConverterFn, ConverterOptions, ShapeCalculator, INPUT_NAME,
};
pub use graph::{AttrValue, DataType, Graph, GraphNode, SerializedModel, TensorInfo};
pub use registry::{is_registered, register_converters, ModelFamily, RegisteredConverter};

pub(crate) use registry::convert_registered;
