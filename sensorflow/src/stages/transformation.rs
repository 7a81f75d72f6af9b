//! Feature imputation, scaling and target encoding.

use crate::config::DataTransformationConfig;
use crate::core::{DataTransformationArtifact, DataValidationArtifact, StageName};
use crate::data::{read_csv, write_csv, Cell, Column, Dataset};
use crate::errors::{Result, SensorError};
use crate::model::{Preprocessor, TargetValueMapping};
use crate::utils::ensure_parent_dir;
use std::path::Path;

/// Fits the preprocessor on the training split and applies it to both splits.
#[derive(Debug, Clone)]
pub struct DataTransformation {
    validation_artifact: DataValidationArtifact,
    config: DataTransformationConfig,
    target_mapping: TargetValueMapping,
}

impl DataTransformation {
    /// Binds the stage with the default `neg`/`pos` target mapping.
    #[must_use]
    pub fn new(validation_artifact: DataValidationArtifact, config: DataTransformationConfig) -> Self {
        Self {
            validation_artifact,
            config,
            target_mapping: TargetValueMapping::default(),
        }
    }

    /// Replaces the target mapping.
    #[must_use]
    pub fn with_target_mapping(mut self, mapping: TargetValueMapping) -> Self {
        self.target_mapping = mapping;
        self
    }

    /// Separates the target column and encodes it.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::InvalidData` if the target column is absent or
    /// holds an unknown or missing label.
    pub fn split_target(&self, dataset: &Dataset) -> Result<(Dataset, Vec<u32>)> {
        let target = &self.config.target_column;
        let (features, column) = dataset.take_column(target).ok_or_else(|| {
            SensorError::invalid_data(format!("target column '{target}' is missing"))
        })?;

        let codes = column
            .values()
            .iter()
            .enumerate()
            .map(|(row, cell)| match cell {
                Cell::Text(label) => self.target_mapping.encode(label),
                Cell::Number(n) => self.target_mapping.encode(&n.to_string()),
                Cell::Missing => Err(SensorError::invalid_data(format!(
                    "missing target label at row {}",
                    row + 1
                ))),
            })
            .collect::<Result<Vec<u32>>>()?;
        Ok((features, codes))
    }

    /// Runs the stage.
    ///
    /// # Errors
    ///
    /// Any failure, wrapped as a `data_transformation` stage error.
    pub fn initiate_data_transformation(&self) -> Result<DataTransformationArtifact> {
        self.run().map_err(|e| e.in_stage(StageName::DataTransformation))
    }

    fn run(&self) -> Result<DataTransformationArtifact> {
        let train = read_csv(&self.validation_artifact.valid_train_file_path)?;
        let test = read_csv(&self.validation_artifact.valid_test_file_path)?;

        let (train_features, train_codes) = self.split_target(&train)?;
        let (test_features, test_codes) = self.split_target(&test)?;

        let preprocessor = Preprocessor::fit(&train_features)?;
        let train_out = self.encode(&preprocessor, &train_features, &train_codes)?;
        let test_out = self.encode(&preprocessor, &test_features, &test_codes)?;

        write_csv(&train_out, &self.config.transformed_train_file_path)?;
        write_csv(&test_out, &self.config.transformed_test_file_path)?;
        save_preprocessor(&preprocessor, &self.config.transformed_object_file_path)?;

        tracing::info!(
            features = preprocessor.n_features(),
            train_rows = train_out.n_rows(),
            test_rows = test_out.n_rows(),
            "Transformed train and test splits"
        );

        Ok(DataTransformationArtifact {
            transformed_object_file_path: self.config.transformed_object_file_path.clone(),
            transformed_train_file_path: self.config.transformed_train_file_path.clone(),
            transformed_test_file_path: self.config.transformed_test_file_path.clone(),
        })
    }

    fn encode(&self, preprocessor: &Preprocessor, features: &Dataset, codes: &[u32]) -> Result<Dataset> {
        preprocessor.transform(features)?.with_column(Column::numeric(
            self.config.target_column.clone(),
            codes.iter().map(|&c| f64::from(c)),
        ))
    }
}

/// Writes a fitted preprocessor as JSON.
///
/// # Errors
///
/// Returns `SensorError::Io` or `SensorError::Serialization`.
pub fn save_preprocessor(preprocessor: &Preprocessor, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    let content = serde_json::to_string_pretty(preprocessor)
        .map_err(|e| SensorError::serialization("preprocessor", e))?;
    std::fs::write(path, content).map_err(|e| SensorError::io(path, e))
}

/// Reads a preprocessor written by [`save_preprocessor`].
///
/// # Errors
///
/// Returns `SensorError::Io` or `SensorError::Serialization`.
pub fn load_preprocessor(path: impl AsRef<Path>) -> Result<Preprocessor> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| SensorError::io(path, e))?;
    serde_json::from_str(&content)
        .map_err(|e| SensorError::serialization(format!("preprocessor '{}'", path.display()), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PipelineSettings, TrainingPipelineConfig};
    use crate::errors::ErrorKind;
    use crate::model::{feature_rows, Estimator, SensorModel};
    use crate::testing::{assert_stage_error, sensor_dataset};
    use pretty_assertions::assert_eq;

    struct Setup {
        _tmp: tempfile::TempDir,
        root: TrainingPipelineConfig,
    }

    fn setup() -> Setup {
        let tmp = tempfile::tempdir().unwrap();
        let root = TrainingPipelineConfig::new(tmp.path().join("artifact"), crate::utils::now_utc());
        Setup { _tmp: tmp, root }
    }

    fn stage(setup: &Setup, train: &Dataset, test: &Dataset) -> DataTransformation {
        let dir = setup.root.artifact_dir.join("data_ingestion/ingested");
        let artifact = DataValidationArtifact {
            validation_status: true,
            valid_train_file_path: dir.join("train.csv"),
            valid_test_file_path: dir.join("test.csv"),
            invalid_train_file_path: None,
            invalid_test_file_path: None,
            drift_report_file_path: dir.join("report.yaml"),
        };
        write_csv(train, &artifact.valid_train_file_path).unwrap();
        write_csv(test, &artifact.valid_test_file_path).unwrap();
        let config = DataTransformationConfig::new(&setup.root, &PipelineSettings::default());
        DataTransformation::new(artifact, config)
    }

    fn clean(n: usize) -> Dataset {
        sensor_dataset(n, 0.0).drop_columns(&["cd_000"]).0
    }

    #[test]
    fn test_outputs_encoded_target_and_scaled_features() {
        let setup = setup();
        let artifact = stage(&setup, &clean(40), &clean(12))
            .initiate_data_transformation()
            .unwrap();

        let train = read_csv(&artifact.transformed_train_file_path).unwrap();
        assert_eq!(train.column_names(), vec!["aa_000", "ab_000", "ac_000", "class"]);
        assert_eq!(train.n_rows(), 40);
        let codes = train.column("class").unwrap().numbers();
        assert_eq!(codes[0], 1.0);
        assert_eq!(codes[1], 0.0);
        assert!(train.columns().iter().all(|c| c.values().iter().all(|v| !v.is_missing())));

        let preprocessor = load_preprocessor(&artifact.transformed_object_file_path).unwrap();
        assert_eq!(preprocessor.feature_names, vec!["aa_000", "ab_000", "ac_000"]);
    }

    #[test]
    fn test_transformed_output_trains_a_served_model() {
        let setup = setup();
        let artifact = stage(&setup, &clean(80), &clean(20))
            .initiate_data_transformation()
            .unwrap();

        let train = read_csv(&artifact.transformed_train_file_path).unwrap();
        let (features, target) = train.take_column("class").unwrap();
        let codes: Vec<u32> = target.numbers().iter().map(|c| *c as u32).collect();
        let estimator = Estimator::nearest_centroid(&feature_rows(&features), &codes).unwrap();
        let preprocessor = load_preprocessor(&artifact.transformed_object_file_path).unwrap();
        let model = SensorModel::new(preprocessor, estimator, TargetValueMapping::default()).unwrap();

        let raw = clean(20);
        let predicted = model.predict(&raw).unwrap();
        let expected: Vec<String> = raw
            .column("class")
            .unwrap()
            .values()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(predicted, expected);
    }

    #[test]
    fn test_unknown_label_is_invalid_data() {
        let setup = setup();
        let bad = clean(10)
            .drop_columns(&["class"])
            .0
            .with_column(Column::text("class", vec!["neg"; 9].into_iter().chain(["maybe"])))
            .unwrap();
        let err = stage(&setup, &bad, &clean(5))
            .initiate_data_transformation()
            .unwrap_err();
        assert_stage_error(&err, StageName::DataTransformation, ErrorKind::InvalidData);
        assert!(err.to_string().contains("maybe"));
    }

    #[test]
    fn test_missing_target_column() {
        let setup = setup();
        let no_target = clean(10).drop_columns(&["class"]).0;
        let err = stage(&setup, &no_target, &no_target)
            .initiate_data_transformation()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }
}
