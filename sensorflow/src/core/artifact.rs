//! Artifacts handed from one stage to the next.
//!
//! Artifacts are immutable records of what a stage produced. Each is created
//! once by its producing stage and consumed by exactly one downstream stage.

use crate::model::ModelVersion;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Files a stage wrote, as recorded in its artifact.
pub trait ArtifactFiles {
    /// Paths of the files the producing stage wrote.
    fn output_files(&self) -> Vec<&Path>;
}

/// Output of the ingestion stage: the two CSV partitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataIngestionArtifact {
    /// Path of the training partition.
    pub train_file_path: PathBuf,
    /// Path of the held-out partition.
    pub test_file_path: PathBuf,
}

/// Output of the validation stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataValidationArtifact {
    /// True when no column drifted between train and test.
    ///
    /// Schema failures never reach this field; they abort the stage.
    pub validation_status: bool,
    /// Training partition that passed the schema checks.
    pub valid_train_file_path: PathBuf,
    /// Test partition that passed the schema checks.
    pub valid_test_file_path: PathBuf,
    /// Rejected training rows, when a split of invalid data is produced.
    pub invalid_train_file_path: Option<PathBuf>,
    /// Rejected test rows, when a split of invalid data is produced.
    pub invalid_test_file_path: Option<PathBuf>,
    /// Where the drift report was written.
    pub drift_report_file_path: PathBuf,
}

/// Output of the transformation stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataTransformationArtifact {
    /// The fitted preprocessor, serialized as JSON.
    pub transformed_object_file_path: PathBuf,
    /// Transformed training table.
    pub transformed_train_file_path: PathBuf,
    /// Transformed test table.
    pub transformed_test_file_path: PathBuf,
}

/// Output of a model trainer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelTrainerArtifact {
    /// The trained model file.
    pub trained_model_file_path: PathBuf,
}

/// Output of a model evaluator comparing a trained model to the champion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEvaluationArtifact {
    /// Whether the trained model should replace the served one.
    pub is_model_accepted: bool,
    /// The candidate model file.
    pub trained_model_path: PathBuf,
    /// The champion it was compared with, if one existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_model_path: Option<PathBuf>,
}

/// Output of the pusher stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelPusherArtifact {
    /// The version the model was promoted as.
    pub version: ModelVersion,
    /// The served copy under the version directory.
    pub saved_model_path: PathBuf,
    /// The run-local copy under the artifact directory.
    pub model_file_path: PathBuf,
    /// Hex SHA-256 of the promoted file.
    pub sha256: String,
}

impl ArtifactFiles for DataIngestionArtifact {
    fn output_files(&self) -> Vec<&Path> {
        vec![self.train_file_path.as_path(), self.test_file_path.as_path()]
    }
}

impl ArtifactFiles for DataValidationArtifact {
    fn output_files(&self) -> Vec<&Path> {
        let mut files = vec![self.drift_report_file_path.as_path()];
        files.extend(self.invalid_train_file_path.as_deref());
        files.extend(self.invalid_test_file_path.as_deref());
        files
    }
}

impl ArtifactFiles for DataTransformationArtifact {
    fn output_files(&self) -> Vec<&Path> {
        vec![
            self.transformed_train_file_path.as_path(),
            self.transformed_test_file_path.as_path(),
            self.transformed_object_file_path.as_path(),
        ]
    }
}

impl ArtifactFiles for ModelPusherArtifact {
    fn output_files(&self) -> Vec<&Path> {
        vec![self.model_file_path.as_path(), self.saved_model_path.as_path()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_artifact_serialization() {
        let artifact = DataValidationArtifact {
            validation_status: false,
            valid_train_file_path: PathBuf::from("a/train.csv"),
            valid_test_file_path: PathBuf::from("a/test.csv"),
            invalid_train_file_path: None,
            invalid_test_file_path: None,
            drift_report_file_path: PathBuf::from("a/report.yaml"),
        };

        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["validation_status"], serde_json::json!(false));
        assert!(json["invalid_train_file_path"].is_null());

        let back: DataValidationArtifact = serde_json::from_value(json).unwrap();
        assert_eq!(back, artifact);
    }

    #[test]
    fn test_evaluation_artifact_omits_missing_champion() {
        let artifact = ModelEvaluationArtifact {
            is_model_accepted: true,
            trained_model_path: PathBuf::from("trained/model.json"),
            best_model_path: None,
        };

        let json = serde_json::to_string(&artifact).unwrap();
        assert!(!json.contains("best_model_path"));
    }

    #[test]
    fn test_output_files_list_written_paths() {
        let artifact = DataValidationArtifact {
            validation_status: true,
            valid_train_file_path: PathBuf::from("a/train.csv"),
            valid_test_file_path: PathBuf::from("a/test.csv"),
            invalid_train_file_path: Some(PathBuf::from("a/invalid_train.csv")),
            invalid_test_file_path: None,
            drift_report_file_path: PathBuf::from("a/report.yaml"),
        };

        assert_eq!(
            artifact.output_files(),
            vec![Path::new("a/report.yaml"), Path::new("a/invalid_train.csv")]
        );
    }
}
