//! boostbridge - gradient-boosted tree models for a host ML framework
//!
//! This crate plugs gradient-boosted tree models into a framework's common
//! model abstraction:
//! - [`adapter`] - classifier and regressor adapters with fit/predict
//! - [`booster`] - the boosted-tree training engine the adapters delegate to
//! - [`search`] - hyperparameter search spaces and the trial context
//! - [`export`] - conversion to a portable computation graph
//!
//! The host calls [`export::register_converters`] once at startup, then drives
//! models through the [`model::Model`], [`model::PortableModel`] and
//! [`model::SearchSpaceProvider`] traits.
//!
//! ```
//! use boostbridge::prelude::*;
//! use ndarray::{array, Array1};
//!
//! # fn main() -> boostbridge::Result<()> {
//! register_converters()?;
//!
//! let x = array![[0.0, 1.0], [1.0, 0.0], [2.0, 1.0], [3.0, 0.0]];
//! let y: Array1<f64> = array![0.0, 0.0, 1.0, 1.0];
//!
//! let mut model = GbtClassifier::with_defaults()?;
//! model.fit(&x, &y)?;
//! let serialized = model.to_portable()?;
//! assert_eq!(serialized.n_inputs, 1);
//! # Ok(())
//! # }
//! ```

pub mod error;

pub mod adapter;
pub mod booster;
pub mod export;
pub mod model;
pub mod search;

pub use error::{BridgeError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{BridgeError, Result};

    // Adapters and capability traits
    pub use crate::adapter::{GbtClassifier, GbtOptions, GbtRegressor};
    pub use crate::model::{Model, PortableModel, SearchSpaceProvider};

    // Booster engine
    pub use crate::booster::{
        BoosterConfig, BoosterKind, GbtEstimator, GrowPolicy, NormalizeType, Objective,
        SampleType, TreeMethod,
    };

    // Search integration
    pub use crate::search::{
        sample_booster_config, search_objective, ParamValue, SearchObjective, SearchTask, Trial,
        TrialOutcome, TrialParams,
    };

    // Export
    pub use crate::export::{
        register_converters, DataType, Graph, ModelFamily, SerializedModel, TensorInfo,
    };
}
