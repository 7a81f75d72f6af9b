//! Fixed names and defaults for the training pipeline.

/// Name recorded on every run.
pub const PIPELINE_NAME: &str = "sensor";
/// Root directory under which each run gets a timestamped directory.
pub const ARTIFACT_DIR: &str = "artifact";
/// `strftime` pattern used for run directory names.
pub const TIMESTAMP_FORMAT: &str = "%m_%d_%Y_%H_%M_%S";

/// Raw export file name inside the feature store.
pub const FILE_NAME: &str = "sensor.csv";
/// Training partition file name.
pub const TRAIN_FILE_NAME: &str = "train.csv";
/// Test partition file name.
pub const TEST_FILE_NAME: &str = "test.csv";

/// Label column of the sensor dataset.
pub const TARGET_COLUMN: &str = "class";
/// Fitted preprocessor file name.
pub const PREPROCESSING_OBJECT_FILE_NAME: &str = "preprocessing.json";
/// Served model file name inside every version directory.
pub const MODEL_FILE_NAME: &str = "model.json";
/// Default schema location.
pub const SCHEMA_FILE_PATH: &str = "config/schema.yaml";
/// Root of the promoted model versions.
pub const SAVED_MODEL_DIR: &str = "saved_models";

/// Default database holding the sensor collection.
pub const DATABASE_NAME: &str = "sensor_db";
/// Store-assigned identifier field dropped on export.
pub const DOCUMENT_ID_FIELD: &str = "_id";
/// Default store location.
pub const STORE_URL: &str = "data/store";

/// Source collection for ingestion.
pub const DATA_INGESTION_COLLECTION_NAME: &str = "sensor";
/// Ingestion stage directory.
pub const DATA_INGESTION_DIR_NAME: &str = "data_ingestion";
/// Raw export directory.
pub const DATA_INGESTION_FEATURE_STORE_DIR: &str = "feature_store";
/// Split output directory.
pub const DATA_INGESTION_INGESTED_DIR: &str = "ingested";
/// Fraction of rows held out for testing.
pub const DATA_INGESTION_TRAIN_TEST_SPLIT_RATIO: f64 = 0.2;

/// Validation stage directory.
pub const DATA_VALIDATION_DIR_NAME: &str = "data_validation";
/// Drift report directory.
pub const DATA_VALIDATION_DRIFT_REPORT_DIR: &str = "drift_report";
/// Drift report file name.
pub const DATA_VALIDATION_DRIFT_REPORT_FILE_NAME: &str = "report.yaml";
/// p-value below which a column counts as drifted.
pub const DATA_VALIDATION_DRIFT_THRESHOLD: f64 = 0.05;

/// Transformation stage directory.
pub const DATA_TRANSFORMATION_DIR_NAME: &str = "data_transformation";
/// Transformed tables directory.
pub const DATA_TRANSFORMATION_TRANSFORMED_DATA_DIR: &str = "transformed";
/// Fitted preprocessor directory.
pub const DATA_TRANSFORMATION_TRANSFORMED_OBJECT_DIR: &str = "transformed_object";
/// Value substituted for missing features before scaling.
pub const DATA_TRANSFORMATION_IMPUTE_VALUE: f64 = 0.0;

/// Pusher stage directory.
pub const MODEL_PUSHER_DIR_NAME: &str = "model_pusher";

/// Column appended to prediction output.
pub const PREDICTION_COLUMN: &str = "predicted_column";
/// Default bind address of the HTTP service.
pub const APP_HOST: &str = "0.0.0.0";
/// Default port of the HTTP service.
pub const APP_PORT: u16 = 8080;
