//! Hyperparameter-search integration
//!
//! Provides the trial context ([`Trial`]) with categorical / float / int
//! suggestion methods and the per-task objective closure the host's search
//! loop drives ([`search_objective`]).

mod objective;
mod trial;

pub use objective::{sample_booster_config, search_objective, SearchObjective, SearchTask, TrialOutcome};
pub use trial::{ParamValue, Trial, TrialParams};
