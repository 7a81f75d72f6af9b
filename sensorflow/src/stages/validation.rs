//! Schema conformance and drift checks on the ingested splits.

use crate::config::{DataValidationConfig, SchemaConfig};
use crate::core::{DataIngestionArtifact, DataValidationArtifact, StageName};
use crate::data::{read_csv, Dataset};
use crate::drift::DriftDetector;
use crate::errors::{Result, SchemaValidationError};
use std::path::Path;

/// Removes numeric columns whose sample standard deviation is zero.
///
/// Columns with text or fewer than two present values are kept.
#[must_use]
pub fn drop_zero_std_columns(dataset: &Dataset) -> Dataset {
    let constant: Vec<&str> = dataset
        .columns()
        .iter()
        .filter(|column| column.std_dev() == Some(0.0))
        .map(|column| column.name())
        .collect();
    if !constant.is_empty() {
        tracing::info!(columns = ?constant, "Dropping zero standard deviation columns");
    }
    dataset.drop_columns(&constant).0
}

/// Checks both splits against the schema, then compares their distributions.
#[derive(Debug, Clone)]
pub struct DataValidation {
    ingestion_artifact: DataIngestionArtifact,
    config: DataValidationConfig,
    schema: SchemaConfig,
}

impl DataValidation {
    /// Binds the stage and loads the schema.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::Config` if the schema cannot be loaded.
    pub fn new(
        ingestion_artifact: DataIngestionArtifact,
        config: DataValidationConfig,
        schema_file_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let schema = SchemaConfig::from_yaml_file(schema_file_path)?;
        Ok(Self::with_schema(ingestion_artifact, config, schema))
    }

    /// Binds the stage to an already loaded schema.
    #[must_use]
    pub fn with_schema(
        ingestion_artifact: DataIngestionArtifact,
        config: DataValidationConfig,
        schema: SchemaConfig,
    ) -> Self {
        Self {
            ingestion_artifact,
            config,
            schema,
        }
    }

    /// True when the table has as many columns as the schema declares.
    #[must_use]
    pub fn validate_number_of_columns(&self, dataset: &Dataset) -> bool {
        let expected = self.schema.column_count();
        let actual = dataset.n_columns();
        tracing::info!(expected, actual, "Checked column count");
        expected == actual
    }

    /// Numerical columns declared by the schema but absent from the table.
    #[must_use]
    pub fn missing_numerical_columns(&self, dataset: &Dataset) -> Vec<String> {
        let missing: Vec<String> = self
            .schema
            .numerical_columns
            .iter()
            .filter(|name| !dataset.has_column(name))
            .cloned()
            .collect();
        for name in &missing {
            tracing::warn!(column = %name, "Missing numerical column");
        }
        missing
    }

    /// True when every declared numerical column is present.
    #[must_use]
    pub fn is_numerical_column_exist(&self, dataset: &Dataset) -> bool {
        self.missing_numerical_columns(dataset).is_empty()
    }

    /// Runs all four schema checks and aggregates their failures.
    ///
    /// # Errors
    ///
    /// Returns the aggregated `SchemaValidationError` if any check failed.
    pub fn check_schema(&self, train: &Dataset, test: &Dataset) -> Result<(), SchemaValidationError> {
        let mut failures = SchemaValidationError::new();
        if !self.validate_number_of_columns(train) {
            failures.push("Train dataframe does not contain all columns.");
        }
        if !self.validate_number_of_columns(test) {
            failures.push("Test dataframe does not contain all columns.");
        }
        for (label, dataset) in [("Train", train), ("Test", test)] {
            let missing = self.missing_numerical_columns(dataset);
            if !missing.is_empty() {
                failures.push(format!(
                    "{label} dataframe does not contain all numerical columns: {}",
                    missing.join(", ")
                ));
            }
        }
        failures.into_result()
    }

    /// Compares every column of `base` with `current` and writes the report.
    ///
    /// Returns true when no column drifted.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::Io` or `SensorError::Serialization` if the
    /// report cannot be written, and `SensorError::InvalidData` if `current`
    /// lacks a column of `base`.
    pub fn detect_dataset_drift(&self, base: &Dataset, current: &Dataset) -> Result<bool> {
        let report = DriftDetector::new(self.config.drift_threshold).detect(base, current)?;
        report.write_yaml(&self.config.drift_report_file_path)?;
        let status = report.no_drift_overall();
        tracing::info!(
            path = %self.config.drift_report_file_path.display(),
            columns = report.len(),
            drifted = report.drifted_columns().len(),
            status,
            "Wrote drift report"
        );
        Ok(status)
    }

    /// Runs the stage.
    ///
    /// Schema failures raise; drift only sets `validation_status` to false.
    ///
    /// # Errors
    ///
    /// Any failure, wrapped as a `data_validation` stage error.
    pub fn initiate_data_validation(&self) -> Result<DataValidationArtifact> {
        self.run().map_err(|e| e.in_stage(StageName::DataValidation))
    }

    fn run(&self) -> Result<DataValidationArtifact> {
        let train = read_csv(&self.ingestion_artifact.train_file_path)?;
        let test = read_csv(&self.ingestion_artifact.test_file_path)?;

        self.check_schema(&train, &test)?;
        let validation_status = self.detect_dataset_drift(&train, &test)?;

        Ok(DataValidationArtifact {
            validation_status,
            valid_train_file_path: self.ingestion_artifact.train_file_path.clone(),
            valid_test_file_path: self.ingestion_artifact.test_file_path.clone(),
            invalid_train_file_path: None,
            invalid_test_file_path: None,
            drift_report_file_path: self.config.drift_report_file_path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrainingPipelineConfig;
    use crate::data::{write_csv, Cell, Column};
    use crate::errors::{ErrorKind, SensorError};
    use crate::testing::{assert_stage_error, sensor_dataset, SensorFixture};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    struct Setup {
        _tmp: tempfile::TempDir,
        fixture: SensorFixture,
        root: TrainingPipelineConfig,
    }

    fn setup() -> Setup {
        let tmp = tempfile::tempdir().unwrap();
        let fixture = SensorFixture::create(tmp.path()).unwrap();
        let root = TrainingPipelineConfig::new(fixture.artifact_root(), crate::utils::now_utc());
        Setup {
            _tmp: tmp,
            fixture,
            root,
        }
    }

    fn write_splits(setup: &Setup, train: &Dataset, test: &Dataset) -> DataIngestionArtifact {
        let dir = setup.root.artifact_dir.join("data_ingestion/ingested");
        let artifact = DataIngestionArtifact {
            train_file_path: dir.join("train.csv"),
            test_file_path: dir.join("test.csv"),
        };
        write_csv(train, &artifact.train_file_path).unwrap();
        write_csv(test, &artifact.test_file_path).unwrap();
        artifact
    }

    fn stage(setup: &Setup, artifact: DataIngestionArtifact) -> DataValidation {
        let settings = setup.fixture.settings();
        let config = DataValidationConfig::new(&setup.root, &settings);
        DataValidation::new(artifact, config, &settings.schema_file_path).unwrap()
    }

    fn clean(n: usize, shift: f64) -> Dataset {
        sensor_dataset(n, shift).drop_columns(&["cd_000"]).0
    }

    #[test]
    fn test_identical_splits_pass() {
        let setup = setup();
        let data = clean(60, 0.0);
        let artifact = write_splits(&setup, &data, &data);

        let result = stage(&setup, artifact.clone()).initiate_data_validation().unwrap();

        assert!(result.validation_status);
        assert_eq!(result.valid_train_file_path, artifact.train_file_path);
        assert_eq!(result.invalid_train_file_path, None);
        assert!(result.drift_report_file_path.is_file());
    }

    #[test]
    fn test_shifted_split_sets_status_false() {
        let setup = setup();
        let artifact = write_splits(&setup, &clean(80, 0.0), &clean(80, 1000.0));

        let result = stage(&setup, artifact).initiate_data_validation().unwrap();
        assert!(!result.validation_status);

        let report: serde_yaml::Mapping =
            serde_yaml::from_str(&std::fs::read_to_string(&result.drift_report_file_path).unwrap())
                .unwrap();
        assert_eq!(report["aa_000"]["drift_status"], serde_yaml::Value::Bool(true));
        assert_eq!(report["ac_000"]["drift_status"], serde_yaml::Value::Bool(false));
    }

    #[test]
    fn test_schema_failures_aggregate() {
        let setup = setup();
        let train = clean(20, 0.0).drop_columns(&["ab_000"]).0;
        let test = clean(20, 0.0).drop_columns(&["ab_000", "ac_000"]).0;
        let artifact = write_splits(&setup, &train, &test);

        let err = stage(&setup, artifact).initiate_data_validation().unwrap_err();
        assert_stage_error(&err, StageName::DataValidation, ErrorKind::SchemaValidation);

        let SensorError::SchemaValidation(schema) = err.root() else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(schema.failures.len(), 4);
        assert!(schema.failures[0].starts_with("Train dataframe does not contain all columns"));
        assert!(schema.failures[3].contains("ab_000, ac_000"));
        assert!(!setup.root.artifact_dir.join("data_validation").exists());
    }

    #[test]
    fn test_missing_numerical_column_is_named() {
        let setup = setup();
        let train = clean(20, 0.0)
            .drop_columns(&["ac_000"])
            .0
            .with_column(Column::numeric("zz_999", vec![1.0; 20]))
            .unwrap();
        let artifact = write_splits(&setup, &train, &clean(20, 0.0));

        let err = stage(&setup, artifact).initiate_data_validation().unwrap_err();
        assert!(err.to_string().contains("ac_000"));
    }

    #[test]
    fn test_missing_split_file_is_io() {
        let setup = setup();
        let artifact = DataIngestionArtifact {
            train_file_path: PathBuf::from("/nonexistent/train.csv"),
            test_file_path: PathBuf::from("/nonexistent/test.csv"),
        };
        let err = stage(&setup, artifact).initiate_data_validation().unwrap_err();
        assert_stage_error(&err, StageName::DataValidation, ErrorKind::Io);
    }

    #[test]
    fn test_drop_zero_std_columns() {
        let ds = Dataset::new(vec![
            Column::numeric("constant", [3.0, 3.0, 3.0]),
            Column::numeric("varies", [1.0, 2.0, 3.0]),
            Column::new("single", vec![Cell::Number(1.0), Cell::Missing, Cell::Missing]),
            Column::text("class", ["neg", "neg", "neg"]),
        ])
        .unwrap();

        let kept = drop_zero_std_columns(&ds);
        assert_eq!(kept.column_names(), vec!["varies", "single", "class"]);
    }
}
