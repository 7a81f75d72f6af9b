//! Per-run configuration objects.
//!
//! A run starts from one [`TrainingPipelineConfig`], built from a single
//! timestamp. Every stage config is derived from it by path composition
//! only; nothing here touches the filesystem.

use super::constants::{
    ARTIFACT_DIR, DATABASE_NAME, DATA_INGESTION_COLLECTION_NAME,
    DATA_INGESTION_FEATURE_STORE_DIR, DATA_INGESTION_INGESTED_DIR,
    DATA_INGESTION_TRAIN_TEST_SPLIT_RATIO, DATA_TRANSFORMATION_TRANSFORMED_DATA_DIR,
    DATA_TRANSFORMATION_TRANSFORMED_OBJECT_DIR, DATA_VALIDATION_DRIFT_REPORT_DIR,
    DATA_VALIDATION_DRIFT_REPORT_FILE_NAME, DATA_VALIDATION_DRIFT_THRESHOLD, FILE_NAME,
    MODEL_FILE_NAME, PIPELINE_NAME, PREPROCESSING_OBJECT_FILE_NAME, SAVED_MODEL_DIR,
    SCHEMA_FILE_PATH, TARGET_COLUMN, TEST_FILE_NAME, TRAIN_FILE_NAME,
};
use crate::core::StageName;
use crate::errors::{Result, SensorError};
use crate::model::ModelVersion;
use crate::utils::{format_run_timestamp, Timestamp};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Stage-local settings shared by every run of a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Root under which each run gets its own timestamped directory.
    #[serde(default = "default_artifact_root")]
    pub artifact_root: PathBuf,
    /// Root of promoted model versions.
    #[serde(default = "default_saved_model_dir")]
    pub saved_model_dir: PathBuf,
    /// Schema YAML location.
    #[serde(default = "default_schema_file_path")]
    pub schema_file_path: PathBuf,
    /// Database holding the source collection.
    #[serde(default = "default_database_name")]
    pub database_name: String,
    /// Source collection.
    #[serde(default = "default_collection_name")]
    pub collection_name: String,
    /// Fraction of rows held out for testing.
    #[serde(default = "default_split_ratio")]
    pub train_test_split_ratio: f64,
    /// Seed for the train/test shuffle. `None` draws fresh randomness.
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Drift p-value threshold.
    #[serde(default = "default_drift_threshold")]
    pub drift_threshold: f64,
    /// Label column.
    #[serde(default = "default_target_column")]
    pub target_column: String,
}

fn default_artifact_root() -> PathBuf {
    PathBuf::from(ARTIFACT_DIR)
}

fn default_saved_model_dir() -> PathBuf {
    PathBuf::from(SAVED_MODEL_DIR)
}

fn default_schema_file_path() -> PathBuf {
    PathBuf::from(SCHEMA_FILE_PATH)
}

fn default_database_name() -> String {
    DATABASE_NAME.to_string()
}

fn default_collection_name() -> String {
    DATA_INGESTION_COLLECTION_NAME.to_string()
}

fn default_split_ratio() -> f64 {
    DATA_INGESTION_TRAIN_TEST_SPLIT_RATIO
}

fn default_drift_threshold() -> f64 {
    DATA_VALIDATION_DRIFT_THRESHOLD
}

fn default_target_column() -> String {
    TARGET_COLUMN.to_string()
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            artifact_root: default_artifact_root(),
            saved_model_dir: default_saved_model_dir(),
            schema_file_path: default_schema_file_path(),
            database_name: default_database_name(),
            collection_name: default_collection_name(),
            train_test_split_ratio: default_split_ratio(),
            random_seed: None,
            drift_threshold: default_drift_threshold(),
            target_column: default_target_column(),
        }
    }
}

impl PipelineSettings {
    /// Creates settings with the default constants.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the artifact root.
    #[must_use]
    pub fn with_artifact_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.artifact_root = root.into();
        self
    }

    /// Sets the promoted model root.
    #[must_use]
    pub fn with_saved_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.saved_model_dir = dir.into();
        self
    }

    /// Sets the schema location.
    #[must_use]
    pub fn with_schema_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_file_path = path.into();
        self
    }

    /// Sets the source collection.
    #[must_use]
    pub fn with_collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = name.into();
        self
    }

    /// Sets the source database.
    #[must_use]
    pub fn with_database_name(mut self, name: impl Into<String>) -> Self {
        self.database_name = name.into();
        self
    }

    /// Sets the held-out fraction.
    #[must_use]
    pub fn with_split_ratio(mut self, ratio: f64) -> Self {
        self.train_test_split_ratio = ratio;
        self
    }

    /// Fixes the shuffle seed.
    #[must_use]
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Sets the drift threshold.
    #[must_use]
    pub fn with_drift_threshold(mut self, threshold: f64) -> Self {
        self.drift_threshold = threshold;
        self
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::Config` if the split ratio is outside (0, 1),
    /// the drift threshold is outside (0, 1], or a name is blank.
    pub fn validate(&self) -> Result<()> {
        validate_split_ratio(self.train_test_split_ratio)?;
        if !(self.drift_threshold > 0.0 && self.drift_threshold <= 1.0) {
            return Err(SensorError::config(format!(
                "drift threshold must be in (0, 1], got {}",
                self.drift_threshold
            )));
        }
        if self.collection_name.trim().is_empty() {
            return Err(SensorError::config("collection name cannot be empty"));
        }
        if self.target_column.trim().is_empty() {
            return Err(SensorError::config("target column cannot be empty"));
        }
        Ok(())
    }
}

fn validate_split_ratio(ratio: f64) -> Result<()> {
    if ratio > 0.0 && ratio < 1.0 {
        Ok(())
    } else {
        Err(SensorError::config(format!(
            "train/test split ratio must be in (0, 1), got {ratio}"
        )))
    }
}

/// Root configuration of one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingPipelineConfig {
    /// Pipeline name.
    pub pipeline_name: String,
    /// This run's artifact directory (`<root>/<timestamp>`).
    pub artifact_dir: PathBuf,
    /// The run timestamp, formatted for filesystem use.
    pub timestamp: String,
    /// The instant the run was created.
    pub created_at: Timestamp,
    /// Correlation id for logs.
    pub run_id: Uuid,
}

impl TrainingPipelineConfig {
    /// Creates the root config for a run started at `timestamp`.
    #[must_use]
    pub fn new(artifact_root: impl AsRef<Path>, timestamp: Timestamp) -> Self {
        let formatted = format_run_timestamp(&timestamp);
        Self {
            pipeline_name: PIPELINE_NAME.to_string(),
            artifact_dir: artifact_root.as_ref().join(&formatted),
            timestamp: formatted,
            created_at: timestamp,
            run_id: Uuid::new_v4(),
        }
    }

    /// Directory of a stage within this run.
    #[must_use]
    pub fn stage_dir(&self, stage: StageName) -> PathBuf {
        self.artifact_dir.join(stage.dir_name())
    }

    /// The integer version a model promoted by this run is stored under.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::InvalidData` if the run predates the unix epoch.
    pub fn version(&self) -> Result<ModelVersion> {
        ModelVersion::from_timestamp(&self.created_at)
    }
}

/// Where ingestion reads from and writes to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataIngestionConfig {
    /// Ingestion stage directory.
    pub data_ingestion_dir: PathBuf,
    /// Raw export file path.
    pub feature_store_dir: PathBuf,
    /// Training partition path.
    pub train_file_path: PathBuf,
    /// Test partition path.
    pub test_file_path: PathBuf,
    /// Fraction held out, in (0, 1).
    pub train_test_split_ratio: f64,
    /// Source database.
    pub database_name: String,
    /// Source collection.
    pub collection_name: String,
    /// Shuffle seed, if reproducibility is wanted.
    pub random_seed: Option<u64>,
}

impl DataIngestionConfig {
    /// Derives the ingestion config from the run root.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::Config` if the split ratio is outside (0, 1).
    pub fn new(root: &TrainingPipelineConfig, settings: &PipelineSettings) -> Result<Self> {
        validate_split_ratio(settings.train_test_split_ratio)?;
        let dir = root.stage_dir(StageName::DataIngestion);
        let ingested = dir.join(DATA_INGESTION_INGESTED_DIR);
        Ok(Self {
            feature_store_dir: dir.join(DATA_INGESTION_FEATURE_STORE_DIR).join(FILE_NAME),
            train_file_path: ingested.join(TRAIN_FILE_NAME),
            test_file_path: ingested.join(TEST_FILE_NAME),
            data_ingestion_dir: dir,
            train_test_split_ratio: settings.train_test_split_ratio,
            database_name: settings.database_name.clone(),
            collection_name: settings.collection_name.clone(),
            random_seed: settings.random_seed,
        })
    }
}

/// Where validation writes its drift report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataValidationConfig {
    /// Validation stage directory.
    pub data_validation_dir: PathBuf,
    /// Drift report path.
    pub drift_report_file_path: PathBuf,
    /// p-value below which a column is drifted.
    pub drift_threshold: f64,
}

impl DataValidationConfig {
    /// Derives the validation config from the run root.
    #[must_use]
    pub fn new(root: &TrainingPipelineConfig, settings: &PipelineSettings) -> Self {
        let dir = root.stage_dir(StageName::DataValidation);
        Self {
            drift_report_file_path: dir
                .join(DATA_VALIDATION_DRIFT_REPORT_DIR)
                .join(DATA_VALIDATION_DRIFT_REPORT_FILE_NAME),
            data_validation_dir: dir,
            drift_threshold: settings.drift_threshold,
        }
    }
}

/// Where transformation writes tables and the fitted preprocessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataTransformationConfig {
    /// Transformation stage directory.
    pub data_transformation_dir: PathBuf,
    /// Transformed training table.
    pub transformed_train_file_path: PathBuf,
    /// Transformed test table.
    pub transformed_test_file_path: PathBuf,
    /// Fitted preprocessor.
    pub transformed_object_file_path: PathBuf,
    /// Label column.
    pub target_column: String,
}

impl DataTransformationConfig {
    /// Derives the transformation config from the run root.
    #[must_use]
    pub fn new(root: &TrainingPipelineConfig, settings: &PipelineSettings) -> Self {
        let dir = root.stage_dir(StageName::DataTransformation);
        let data = dir.join(DATA_TRANSFORMATION_TRANSFORMED_DATA_DIR);
        Self {
            transformed_train_file_path: data.join(TRAIN_FILE_NAME),
            transformed_test_file_path: data.join(TEST_FILE_NAME),
            transformed_object_file_path: dir
                .join(DATA_TRANSFORMATION_TRANSFORMED_OBJECT_DIR)
                .join(PREPROCESSING_OBJECT_FILE_NAME),
            data_transformation_dir: dir,
            target_column: settings.target_column.clone(),
        }
    }
}

/// Where the pusher copies an accepted model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelPusherConfig {
    /// Pusher stage directory.
    pub model_pusher_dir: PathBuf,
    /// Run-local copy.
    pub model_file_path: PathBuf,
    /// Served copy under the version directory.
    pub saved_model_path: PathBuf,
    /// Version the model is promoted as.
    pub version: ModelVersion,
}

impl ModelPusherConfig {
    /// Derives the pusher config from the run root.
    ///
    /// # Errors
    ///
    /// See [`TrainingPipelineConfig::version`].
    pub fn new(root: &TrainingPipelineConfig, settings: &PipelineSettings) -> Result<Self> {
        let dir = root.stage_dir(StageName::ModelPusher);
        let version = root.version()?;
        Ok(Self {
            model_file_path: dir.join(MODEL_FILE_NAME),
            saved_model_path: settings
                .saved_model_dir
                .join(version.to_string())
                .join(MODEL_FILE_NAME),
            model_pusher_dir: dir,
            version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn root() -> TrainingPipelineConfig {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        TrainingPipelineConfig::new("artifact", ts)
    }

    #[test]
    fn test_root_config_paths() {
        let root = root();
        assert_eq!(root.pipeline_name, "sensor");
        assert_eq!(root.timestamp, "01_02_2024_03_04_05");
        assert_eq!(root.artifact_dir, PathBuf::from("artifact/01_02_2024_03_04_05"));
    }

    #[test]
    fn test_stage_configs_share_timestamp_segment() {
        let root = root();
        let settings = PipelineSettings::default();

        let ingestion = DataIngestionConfig::new(&root, &settings).unwrap();
        let validation = DataValidationConfig::new(&root, &settings);
        let transformation = DataTransformationConfig::new(&root, &settings);
        let pusher = ModelPusherConfig::new(&root, &settings).unwrap();

        for path in [
            &ingestion.train_file_path,
            &ingestion.test_file_path,
            &ingestion.feature_store_dir,
            &validation.drift_report_file_path,
            &transformation.transformed_object_file_path,
            &pusher.model_file_path,
        ] {
            assert!(path.starts_with(&root.artifact_dir), "{}", path.display());
        }
    }

    #[test]
    fn test_ingestion_layout() {
        let root = root();
        let cfg = DataIngestionConfig::new(&root, &PipelineSettings::default()).unwrap();

        assert_eq!(
            cfg.train_file_path,
            root.artifact_dir.join("data_ingestion/ingested/train.csv")
        );
        assert_eq!(
            cfg.feature_store_dir,
            root.artifact_dir.join("data_ingestion/feature_store/sensor.csv")
        );
        assert_eq!(cfg.collection_name, "sensor");
        assert!((cfg.train_test_split_ratio - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_split_ratio_bounds() {
        let root = root();
        for bad in [0.0, 1.0, -0.1, 1.5, f64::NAN] {
            let settings = PipelineSettings::default().with_split_ratio(bad);
            let err = DataIngestionConfig::new(&root, &settings).unwrap_err();
            assert_eq!(err.kind(), crate::errors::ErrorKind::Config);
        }
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let root = root();
        let settings = PipelineSettings::default();
        assert_eq!(
            DataValidationConfig::new(&root, &settings),
            DataValidationConfig::new(&root, &settings)
        );
    }

    #[test]
    fn test_pusher_uses_integer_version() {
        let root = root();
        let cfg = ModelPusherConfig::new(&root, &PipelineSettings::default()).unwrap();
        let expected = root.created_at.timestamp().to_string();

        assert_eq!(
            cfg.saved_model_path,
            PathBuf::from("saved_models").join(&expected).join("model.json")
        );
        assert_eq!(cfg.version.to_string(), expected);
    }

    #[test]
    fn test_settings_validate() {
        assert!(PipelineSettings::default().validate().is_ok());
        assert!(PipelineSettings::default().with_drift_threshold(0.0).validate().is_err());
        assert!(PipelineSettings::default().with_collection_name(" ").validate().is_err());
    }

    #[test]
    fn test_settings_deserialize_defaults() {
        let settings: PipelineSettings =
            serde_json::from_str(r#"{"collection_name": "aps"}"#).unwrap();
        assert_eq!(settings.collection_name, "aps");
        assert_eq!(settings.target_column, "class");
        assert!(settings.random_seed.is_none());
    }
}
