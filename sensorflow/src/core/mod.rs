//! Core domain model types.
//!
//! This module contains the types that flow between pipeline stages:
//! - Stage names and statuses
//! - The immutable artifacts each stage produces

mod artifact;
mod status;

pub use artifact::{
    ArtifactFiles, DataIngestionArtifact, DataTransformationArtifact, DataValidationArtifact,
    ModelEvaluationArtifact, ModelPusherArtifact, ModelTrainerArtifact,
};
pub use status::{StageName, StageStatus};
