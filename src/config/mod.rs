//! Configuration: estimator parameters and the JSON runtime config read by
//! the command-line tool.

pub mod params;
pub mod runtime;

pub use params::{AlphaTreatment, EstimatorParams};
pub use runtime::{load_config, RuntimeConfig};
