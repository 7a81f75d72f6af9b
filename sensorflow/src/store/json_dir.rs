//! Filesystem document store: one JSON-lines file per collection.

use super::{Document, DocumentStore};
use crate::config::constants::DOCUMENT_ID_FIELD;
use crate::errors::StoreError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Stores `<root>/<database>/<collection>.jsonl`.
///
/// Documents without an `_id` get a generated one on insert.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    /// Creates a store rooted at `root`. Nothing is created until the first insert.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The store root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a collection file.
    #[must_use]
    pub fn collection_path(&self, database: &str, collection: &str) -> PathBuf {
        self.root.join(database).join(format!("{collection}.jsonl"))
    }
}

#[async_trait]
impl DocumentStore for JsonDirStore {
    async fn find_all(&self, database: &str, collection: &str) -> Result<Vec<Document>, StoreError> {
        let path = self.collection_path(database, collection);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::collection_not_found(database, collection));
            }
            Err(e) => return Err(e.into()),
        };

        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                serde_json::from_str::<Document>(line).map_err(|e| StoreError::MalformedDocument {
                    collection: collection.to_string(),
                    line: index + 1,
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    async fn insert_many(
        &self,
        database: &str,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<usize, StoreError> {
        let path = self.collection_path(database, collection);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        let mut buffer = String::new();
        for mut document in documents.iter().cloned() {
            document
                .entry(DOCUMENT_ID_FIELD)
                .or_insert_with(|| serde_json::Value::String(Uuid::new_v4().simple().to_string()));
            let line = serde_json::to_string(&document).map_err(|e| StoreError::MalformedDocument {
                collection: collection.to_string(),
                line: 0,
                reason: e.to_string(),
            })?;
            buffer.push_str(&line);
            buffer.push('\n');
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(buffer.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!(
            path = %path.display(),
            count = documents.len(),
            "Appended documents"
        );
        Ok(documents.len())
    }

    fn describe(&self) -> String {
        format!("jsonl:{}", self.root.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_ids_and_appends() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonDirStore::new(tmp.path());

        let written = store
            .insert_many("sensor_db", "sensor", vec![doc(json!({"aa_000": 1}))])
            .await
            .unwrap();
        assert_eq!(written, 1);
        store
            .insert_many("sensor_db", "sensor", vec![doc(json!({"_id": "fixed", "aa_000": 2}))])
            .await
            .unwrap();

        let docs = store.find_all("sensor_db", "sensor").await.unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs[0][DOCUMENT_ID_FIELD].is_string());
        assert_eq!(docs[1][DOCUMENT_ID_FIELD], json!("fixed"));
        assert!(tmp.path().join("sensor_db/sensor.jsonl").is_file());
    }

    #[tokio::test]
    async fn test_missing_collection() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonDirStore::new(tmp.path());
        let err = store.find_all("sensor_db", "sensor").await.unwrap_err();
        assert!(matches!(err, StoreError::CollectionNotFound { .. }));
    }

    #[tokio::test]
    async fn test_malformed_line_reports_position() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonDirStore::new(tmp.path());
        let path = store.collection_path("db", "sensor");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{\"a\": 1}\n\nnot json\n").unwrap();

        let err = store.find_all("db", "sensor").await.unwrap_err();
        assert!(matches!(err, StoreError::MalformedDocument { line: 3, .. }));
    }
}
