//! Configuration model.
//!
//! - [`constants`]: fixed names and defaults
//! - [`pipeline`]: the per-run root config and the stage configs derived from it
//! - [`schema`]: the dataset schema loaded from YAML
//! - [`app`]: process-level settings with environment overrides

mod app;
pub mod constants;
mod pipeline;
mod schema;

pub use app::{AppConfig, ENV_PREFIX};
pub use pipeline::{
    DataIngestionConfig, DataTransformationConfig, DataValidationConfig, ModelPusherConfig,
    PipelineSettings, TrainingPipelineConfig,
};
pub use schema::{ColumnEntry, SchemaConfig};
