//! Export from the document store and train/test split.

use crate::config::{DataIngestionConfig, SchemaConfig};
use crate::core::{DataIngestionArtifact, StageName};
use crate::data::{write_csv, Dataset};
use crate::errors::{Result, SensorError};
use crate::store::{DocumentStore, SensorData};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::Path;
use std::sync::Arc;

/// Splits rows into `(train, test)` partitions.
///
/// The test partition gets `ceil(n_rows * test_ratio)` rows and the train
/// partition the rest. Rows are shuffled first; a seed makes the shuffle
/// reproducible.
///
/// # Errors
///
/// Returns `SensorError::Config` for a ratio outside (0, 1) and
/// `SensorError::EmptyDataset` if the train partition would be empty.
pub fn split_train_test(
    dataset: &Dataset,
    test_ratio: f64,
    seed: Option<u64>,
) -> Result<(Dataset, Dataset)> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(SensorError::config(format!(
            "train/test split ratio must be in (0, 1), got {test_ratio}"
        )));
    }

    let n_rows = dataset.n_rows();
    let n_test = ((n_rows as f64) * test_ratio).ceil() as usize;
    let n_test = n_test.min(n_rows);
    if n_rows - n_test == 0 {
        return Err(SensorError::EmptyDataset(format!(
            "{n_rows} rows leave no training rows at test ratio {test_ratio}"
        )));
    }

    let mut indices: Vec<usize> = (0..n_rows).collect();
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    indices.shuffle(&mut rng);

    let (test_rows, train_rows) = indices.split_at(n_test);
    Ok((dataset.select_rows(train_rows), dataset.select_rows(test_rows)))
}

/// Pulls the sensor collection and writes the raw export and both splits.
#[derive(Clone)]
pub struct DataIngestion {
    config: DataIngestionConfig,
    schema: SchemaConfig,
    data: SensorData,
}

impl std::fmt::Debug for DataIngestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataIngestion")
            .field("config", &self.config)
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}

impl DataIngestion {
    /// Binds the stage to its config and loads the schema.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::Config` if the schema cannot be loaded.
    pub fn new(
        config: DataIngestionConfig,
        schema_file_path: impl AsRef<Path>,
        store: Arc<dyn DocumentStore>,
    ) -> Result<Self> {
        let schema = SchemaConfig::from_yaml_file(schema_file_path)?;
        Ok(Self::with_schema(config, schema, store))
    }

    /// Binds the stage to an already loaded schema.
    #[must_use]
    pub fn with_schema(
        config: DataIngestionConfig,
        schema: SchemaConfig,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            config,
            schema,
            data: SensorData::new(store),
        }
    }

    /// The stage config.
    #[must_use]
    pub fn config(&self) -> &DataIngestionConfig {
        &self.config
    }

    /// Exports the whole collection and writes it to the feature store file.
    ///
    /// The CSV write runs on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::EmptyDataset` if the collection has no records,
    /// plus store and write errors.
    pub async fn export_data_into_feature_store(&self) -> Result<Dataset> {
        let dataset = self
            .data
            .export_collection_as_dataset(&self.config.database_name, &self.config.collection_name)
            .await?;
        let path = self.config.feature_store_dir.clone();
        let dataset = tokio::task::spawn_blocking(move || {
            write_csv(&dataset, &path)?;
            tracing::info!(
                path = %path.display(),
                rows = dataset.n_rows(),
                "Wrote feature store export"
            );
            Ok::<_, SensorError>(dataset)
        })
        .await??;
        Ok(dataset)
    }

    /// Removes the schema's `drop_columns`; absent ones are only logged.
    #[must_use]
    pub fn drop_schema_columns(&self, dataset: &Dataset) -> Dataset {
        let (reduced, dropped) = dataset.drop_columns(&self.schema.drop_columns);
        for name in &self.schema.drop_columns {
            if !dropped.contains(name) {
                tracing::warn!(column = %name, "Drop column not present in export");
            }
        }
        reduced
    }

    /// Splits and writes both partitions.
    ///
    /// # Errors
    ///
    /// See [`split_train_test`]; also write errors.
    pub fn split_data_as_train_test(&self, dataset: &Dataset) -> Result<DataIngestionArtifact> {
        let (train, test) = split_train_test(
            dataset,
            self.config.train_test_split_ratio,
            self.config.random_seed,
        )?;
        write_csv(&train, &self.config.train_file_path)?;
        write_csv(&test, &self.config.test_file_path)?;
        tracing::info!(
            train_rows = train.n_rows(),
            test_rows = test.n_rows(),
            seeded = self.config.random_seed.is_some(),
            "Performed train test split"
        );
        Ok(DataIngestionArtifact {
            train_file_path: self.config.train_file_path.clone(),
            test_file_path: self.config.test_file_path.clone(),
        })
    }

    /// Runs the stage. Only the export awaits the store; the split and its
    /// writes run on the blocking pool.
    ///
    /// # Errors
    ///
    /// Any failure, wrapped as a `data_ingestion` stage error.
    pub async fn initiate_data_ingestion(&self) -> Result<DataIngestionArtifact> {
        async {
            let exported = self.export_data_into_feature_store().await?;
            let stage = self.clone();
            tokio::task::spawn_blocking(move || {
                let reduced = stage.drop_schema_columns(&exported);
                stage.split_data_as_train_test(&reduced)
            })
            .await?
        }
        .await
        .map_err(|e| e.in_stage(StageName::DataIngestion))
    }
}
