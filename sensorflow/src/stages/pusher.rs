//! Promotion of an accepted model into the version directory layout.

use crate::config::ModelPusherConfig;
use crate::core::{ModelEvaluationArtifact, ModelPusherArtifact, StageName};
use crate::errors::{Result, SensorError};
use crate::utils::{ensure_parent_dir, write_atomic};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Copies an accepted model to the run directory and the served location.
#[derive(Debug, Clone)]
pub struct ModelPusher {
    evaluation_artifact: ModelEvaluationArtifact,
    config: ModelPusherConfig,
}

impl ModelPusher {
    /// Binds the stage.
    #[must_use]
    pub fn new(evaluation_artifact: ModelEvaluationArtifact, config: ModelPusherConfig) -> Self {
        Self {
            evaluation_artifact,
            config,
        }
    }

    /// Runs the stage.
    ///
    /// # Errors
    ///
    /// Any failure, wrapped as a `model_pusher` stage error. A rejected
    /// evaluation is `SensorError::InvalidData`.
    pub fn initiate_model_pusher(&self) -> Result<ModelPusherArtifact> {
        self.run().map_err(|e| e.in_stage(StageName::ModelPusher))
    }

    fn run(&self) -> Result<ModelPusherArtifact> {
        if !self.evaluation_artifact.is_model_accepted {
            return Err(SensorError::invalid_data(format!(
                "model '{}' was not accepted by evaluation",
                self.evaluation_artifact.trained_model_path.display()
            )));
        }

        let source = &self.evaluation_artifact.trained_model_path;
        let bytes = std::fs::read(source).map_err(|e| SensorError::io(source, e))?;
        let sha256 = hex::encode(Sha256::digest(&bytes));

        claim_version_dir(&self.config.saved_model_path, &self.config)?;
        write_atomic(&self.config.model_file_path, &bytes)?;
        write_atomic(&self.config.saved_model_path, &bytes)?;

        tracing::info!(
            version = %self.config.version,
            saved_model_path = %self.config.saved_model_path.display(),
            sha256 = %sha256,
            "Promoted model"
        );

        Ok(ModelPusherArtifact {
            version: self.config.version,
            saved_model_path: self.config.saved_model_path.clone(),
            model_file_path: self.config.model_file_path.clone(),
            sha256,
        })
    }
}

/// Creates the version directory that will hold `saved_model_path`.
///
/// The directory is created non-recursively so two runs resolving the same
/// version cannot both promote into it.
fn claim_version_dir(saved_model_path: &Path, config: &ModelPusherConfig) -> Result<()> {
    let Some(version_dir) = saved_model_path.parent() else {
        return Ok(());
    };
    ensure_parent_dir(version_dir)?;
    match std::fs::create_dir(version_dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Err(SensorError::invalid_data(
            format!("model version {} is already promoted", config.version),
        )),
        Err(e) => Err(SensorError::io(version_dir, e)),
    }
}
