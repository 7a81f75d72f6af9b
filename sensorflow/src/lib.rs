//! # Sensorflow
//!
//! A batch training pipeline for sensor fault classification.
//!
//! One training run exports a document collection, splits it into train and
//! test sets, validates both against a schema, checks them for
//! distribution drift with a two-sample Kolmogorov-Smirnov test and fits the
//! feature preprocessing. Accepted models are promoted into integer version
//! directories and served from the newest one.
//!
//! - **Config and artifacts**: every run derives its stage directories from
//!   one timestamped root ([`config`], [`core`])
//! - **Drift detection**: per-column KS tests and a YAML report ([`drift`])
//! - **Stages**: ingestion, validation, transformation and promotion
//!   ([`stages`])
//! - **Model serving**: version resolution and prediction ([`model`])
//! - **Orchestration**: one run at a time behind an atomic guard
//!   ([`pipeline`])
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sensorflow::prelude::*;
//!
//! let store = store::connect(&StoreConfig::new("data/store"))?;
//! let pipeline = TrainPipeline::new(PipelineSettings::default(), store, RunGuard::new());
//! let summary = pipeline.run_pipeline().await?;
//! println!("artifacts in {}", summary.artifact_dir.display());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

#[cfg(feature = "server")]
pub mod api;
pub mod config;
pub mod core;
pub mod data;
pub mod drift;
pub mod errors;
pub mod model;
pub mod observability;
pub mod pipeline;
pub mod stages;
pub mod store;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{AppConfig, PipelineSettings, SchemaConfig, TrainingPipelineConfig};
    pub use crate::core::{
        DataIngestionArtifact, DataTransformationArtifact, DataValidationArtifact,
        ModelEvaluationArtifact, ModelPusherArtifact, StageName, StageStatus,
    };
    pub use crate::data::{Cell, Column, Dataset};
    pub use crate::drift::{DriftDetector, DriftReport};
    pub use crate::errors::{ErrorKind, Result, SensorError};
    pub use crate::model::{ModelResolver, ModelVersion, SensorModel, TargetValueMapping};
    pub use crate::pipeline::{PipelineRunSummary, RunGuard, TrainPipeline};
    pub use crate::store::{self, DocumentStore, StoreConfig};
    pub use crate::utils::{now_utc, Timestamp};
}
