//! Import and export of sensor records.

use super::{Document, DocumentStore};
use crate::config::constants::DOCUMENT_ID_FIELD;
use crate::data::{read_csv, Dataset};
use crate::errors::{Result, SensorError, StoreError};
use std::path::Path;
use std::sync::Arc;

/// Moves sensor records between the document store and tables.
#[derive(Clone)]
pub struct SensorData {
    store: Arc<dyn DocumentStore>,
}

impl std::fmt::Debug for SensorData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorData")
            .field("store", &self.store.describe())
            .finish()
    }
}

impl SensorData {
    /// Wraps a store client.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Reads a whole collection into a table.
    ///
    /// The store's `_id` field is dropped and `"na"` strings become missing.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::EmptyDataset` if the collection is absent or has
    /// no documents, and `SensorError::Store` on backend failure.
    pub async fn export_collection_as_dataset(
        &self,
        database: &str,
        collection: &str,
    ) -> Result<Dataset> {
        let documents = match self.store.find_all(database, collection).await {
            Ok(documents) => documents,
            Err(StoreError::CollectionNotFound { .. }) => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let records: Vec<Document> = documents
            .into_iter()
            .map(|mut document| {
                document.remove(DOCUMENT_ID_FIELD);
                document
            })
            .collect();
        let dataset = Dataset::from_records(&records)?;

        if dataset.is_empty() {
            return Err(SensorError::EmptyDataset(format!(
                "collection {database}.{collection} has no records"
            )));
        }

        tracing::info!(
            database,
            collection,
            rows = dataset.n_rows(),
            columns = dataset.n_columns(),
            "Exported collection"
        );
        Ok(dataset)
    }

    /// Loads a headed CSV file into a collection.
    ///
    /// Returns the number of documents inserted.
    ///
    /// # Errors
    ///
    /// Returns CSV, IO or store errors.
    pub async fn save_csv_file(
        &self,
        file_path: impl AsRef<Path>,
        database: &str,
        collection: &str,
    ) -> Result<usize> {
        let dataset = read_csv(file_path.as_ref())?;
        let inserted = self
            .store
            .insert_many(database, collection, dataset.to_records())
            .await?;
        tracing::info!(
            file = %file_path.as_ref().display(),
            database,
            collection,
            inserted,
            "Imported CSV into store"
        );
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Cell;
    use crate::errors::ErrorKind;
    use crate::store::{MemoryStore, MockDocumentStore};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn test_export_drops_id_and_maps_na() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_many(
                "db",
                "sensor",
                vec![
                    json!({"_id": "1", "class": "neg", "aa_000": 10, "ab_000": "na"})
                        .as_object()
                        .cloned()
                        .unwrap(),
                    json!({"_id": "2", "class": "pos", "aa_000": 20, "ab_000": "3"})
                        .as_object()
                        .cloned()
                        .unwrap(),
                ],
            )
            .await
            .unwrap();

        let dataset = SensorData::new(store)
            .export_collection_as_dataset("db", "sensor")
            .await
            .unwrap();

        assert_eq!(dataset.column_names(), vec!["class", "aa_000", "ab_000"]);
        assert_eq!(
            dataset.column("ab_000").unwrap().values(),
            &[Cell::Missing, Cell::Number(3.0)]
        );
    }

    #[tokio::test]
    async fn test_export_absent_collection_is_empty_dataset() {
        let data = SensorData::new(Arc::new(MemoryStore::new()));
        let err = data.export_collection_as_dataset("db", "sensor").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyDataset);
    }

    #[tokio::test]
    async fn test_export_propagates_backend_failure() {
        let mut mock = MockDocumentStore::new();
        mock.expect_find_all()
            .times(1)
            .returning(|_, _| Err(StoreError::Io(std::io::Error::other("disk gone"))));
        mock.expect_describe().return_const("mock".to_string());

        let err = SensorData::new(Arc::new(mock))
            .export_collection_as_dataset("db", "sensor")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[tokio::test]
    async fn test_save_csv_file_then_export() {
        let tmp = tempfile::tempdir().unwrap();
        let csv_path = tmp.path().join("aps.csv");
        std::fs::write(&csv_path, "class,aa_000\nneg,1\npos,na\nneg,3\n").unwrap();

        let data = SensorData::new(Arc::new(MemoryStore::new()));
        let inserted = data.save_csv_file(&csv_path, "db", "sensor").await.unwrap();
        assert_eq!(inserted, 3);

        let dataset = data.export_collection_as_dataset("db", "sensor").await.unwrap();
        assert_eq!(dataset.n_rows(), 3);
        assert_eq!(dataset.column("aa_000").unwrap().values()[1], Cell::Missing);
    }
}
