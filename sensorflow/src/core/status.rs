//! Stage names and validation outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The stages of a training run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    /// Export from the document store and split.
    DataIngestion,
    /// Schema checks and drift detection.
    DataValidation,
    /// Imputation, scaling and target encoding.
    DataTransformation,
    /// Promotion of an accepted model.
    ModelPusher,
}

impl StageName {
    /// Directory name used for this stage under a run's artifact root.
    #[must_use]
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::DataIngestion => crate::config::constants::DATA_INGESTION_DIR_NAME,
            Self::DataValidation => crate::config::constants::DATA_VALIDATION_DIR_NAME,
            Self::DataTransformation => crate::config::constants::DATA_TRANSFORMATION_DIR_NAME,
            Self::ModelPusher => crate::config::constants::MODEL_PUSHER_DIR_NAME,
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DataIngestion => write!(f, "data_ingestion"),
            Self::DataValidation => write!(f, "data_validation"),
            Self::DataTransformation => write!(f, "data_transformation"),
            Self::ModelPusher => write!(f, "model_pusher"),
        }
    }
}

/// Execution status of a stage within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Stage completed successfully.
    Ok,
    /// Stage failed.
    Fail,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Fail => write!(f, "fail"),
        }
    }
}
