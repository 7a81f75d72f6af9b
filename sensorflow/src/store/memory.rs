//! In-process document store.

use super::{Document, DocumentStore};
use crate::errors::StoreError;
use async_trait::async_trait;
use dashmap::DashMap;

/// Collections held in memory, keyed by `(database, collection)`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: DashMap<(String, String), Vec<Document>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection, zero if absent.
    #[must_use]
    pub fn count(&self, database: &str, collection: &str) -> usize {
        self.collections
            .get(&(database.to_string(), collection.to_string()))
            .map_or(0, |docs| docs.len())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_all(&self, database: &str, collection: &str) -> Result<Vec<Document>, StoreError> {
        self.collections
            .get(&(database.to_string(), collection.to_string()))
            .map(|docs| docs.clone())
            .ok_or_else(|| StoreError::collection_not_found(database, collection))
    }

    async fn insert_many(
        &self,
        database: &str,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<usize, StoreError> {
        let written = documents.len();
        self.collections
            .entry((database.to_string(), collection.to_string()))
            .or_default()
            .extend(documents);
        Ok(written)
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
