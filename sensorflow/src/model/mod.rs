//! Served model format and version resolution.

mod estimator;
mod mapping;
mod preprocessor;
mod resolver;

pub use estimator::{Estimator, SensorModel};
pub use mapping::TargetValueMapping;
pub use preprocessor::{feature_rows, Preprocessor};
pub use resolver::{ModelResolver, ModelVersion};
