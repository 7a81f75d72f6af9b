//! Synthetic sensor data and on-disk workspaces.

use std::path::{Path, PathBuf};

use serde_json::json;

use crate::config::PipelineSettings;
use crate::data::Dataset;
use crate::errors::{Result, SensorError};
use crate::store::{Document, DocumentStore};

/// Schema matching [`sensor_records`] after `cd_000` is dropped.
pub const FIXTURE_SCHEMA: &str = "\
columns:
  - class: category
  - aa_000: float
  - ab_000: float
  - ac_000: float
numerical_columns:
  - aa_000
  - ab_000
  - ac_000
drop_columns:
  - cd_000
";

/// Deterministic sensor records.
///
/// Every fourth record is `pos`. `aa_000` separates the classes and is
/// moved by `shift`; `ab_000` has `"na"` gaps; `cd_000` is a constant
/// column the fixture schema drops.
#[must_use]
pub fn sensor_records(n: usize, shift: f64) -> Vec<Document> {
    (0..n)
        .map(|i| {
            let positive = i % 4 == 0;
            let aa = if positive {
                500.0 + (i % 17) as f64 * 3.0
            } else {
                100.0 + (i % 23) as f64 * 2.0
            };
            let ab = if i % 7 == 3 {
                json!("na")
            } else {
                json!((i % 11) as f64)
            };
            let record = json!({
                "class": if positive { "pos" } else { "neg" },
                "aa_000": aa + shift,
                "ab_000": ab,
                "ac_000": ((i * 37) % 101) as f64 * 0.5,
                "cd_000": 0.0,
            });
            record.as_object().cloned().unwrap_or_default()
        })
        .collect()
}

/// [`sensor_records`] as a table.
#[must_use]
pub fn sensor_dataset(n: usize, shift: f64) -> Dataset {
    Dataset::from_records(&sensor_records(n, shift)).unwrap_or_default()
}

/// A workspace directory holding a schema, an artifact root and a model root.
#[derive(Debug, Clone)]
pub struct SensorFixture {
    root: PathBuf,
}

impl SensorFixture {
    /// Lays out a workspace under `root` and writes [`FIXTURE_SCHEMA`].
    ///
    /// # Errors
    ///
    /// Returns `SensorError::Io` if the schema cannot be written.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let fixture = Self { root: root.into() };
        let schema = fixture.schema_path();
        crate::utils::ensure_parent_dir(&schema)?;
        std::fs::write(&schema, FIXTURE_SCHEMA).map_err(|e| SensorError::io(&schema, e))?;
        Ok(fixture)
    }

    /// Workspace root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Schema file path.
    #[must_use]
    pub fn schema_path(&self) -> PathBuf {
        self.root.join("config").join("schema.yaml")
    }

    /// Artifact root.
    #[must_use]
    pub fn artifact_root(&self) -> PathBuf {
        self.root.join("artifact")
    }

    /// Promoted model root.
    #[must_use]
    pub fn saved_model_dir(&self) -> PathBuf {
        self.root.join("saved_models")
    }

    /// Settings pointing at this workspace, with a fixed split seed.
    #[must_use]
    pub fn settings(&self) -> PipelineSettings {
        PipelineSettings::default()
            .with_artifact_root(self.artifact_root())
            .with_saved_model_dir(self.saved_model_dir())
            .with_schema_file_path(self.schema_path())
            .with_random_seed(42)
    }

    /// Inserts records into the collection named by [`Self::settings`].
    ///
    /// # Errors
    ///
    /// Returns `SensorError::Store` on backend failure.
    pub async fn seed_store(&self, store: &dyn DocumentStore, records: Vec<Document>) -> Result<usize> {
        let settings = self.settings();
        Ok(store
            .insert_many(&settings.database_name, &settings.collection_name, records)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchemaConfig;
    use crate::data::Cell;

    #[test]
    fn test_records_shape() {
        let ds = sensor_dataset(28, 0.0);
        assert_eq!(ds.n_rows(), 28);
        assert_eq!(ds.column_names(), vec!["class", "aa_000", "ab_000", "ac_000", "cd_000"]);
        assert_eq!(ds.column("ab_000").unwrap().values()[3], Cell::Missing);
        assert_eq!(
            ds.column("class").unwrap().values()[0],
            Cell::Text("pos".to_string())
        );
    }

    #[test]
    fn test_schema_matches_records_after_drop() {
        let schema = SchemaConfig::from_yaml_str(FIXTURE_SCHEMA).unwrap();
        let (ds, _) = sensor_dataset(4, 0.0).drop_columns(&schema.drop_columns);
        assert_eq!(ds.n_columns(), schema.column_count());
    }

    #[test]
    fn test_create_writes_schema() {
        let tmp = tempfile::tempdir().unwrap();
        let fixture = SensorFixture::create(tmp.path()).unwrap();
        assert!(fixture.schema_path().is_file());
        assert!(fixture.settings().artifact_root.starts_with(tmp.path()));
    }
}
