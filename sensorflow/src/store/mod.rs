//! Document store port and backends.
//!
//! Sensor records live in a document store addressed by database and
//! collection. The pipeline only needs two operations, captured by
//! [`DocumentStore`]. One client is shared per process; [`connect`] creates
//! it on first use and returns the same instance afterwards.

mod json_dir;
mod memory;
mod sensor_data;

pub use json_dir::JsonDirStore;
pub use memory::MemoryStore;
pub use sensor_data::SensorData;

use crate::config::constants::STORE_URL;
use crate::errors::StoreError;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// A stored document.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// URL scheme selecting the in-memory backend.
pub const MEMORY_SCHEME: &str = "memory://";

/// URL scheme selecting the JSON-lines directory backend.
pub const FILE_SCHEME: &str = "file://";

/// Store location.
///
/// `memory://` selects [`MemoryStore`]; a filesystem path or a `file://` URL
/// selects [`JsonDirStore`] rooted there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend URL.
    #[serde(default = "default_url")]
    pub url: String,
}

fn default_url() -> String {
    STORE_URL.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { url: default_url() }
    }
}

impl StoreConfig {
    /// Creates a config for `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Opens a fresh client for this location.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidUrl` for an empty URL or an unknown scheme.
    pub fn open(&self) -> Result<Arc<dyn DocumentStore>, StoreError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(StoreError::InvalidUrl {
                url: self.url.clone(),
                reason: "empty".to_string(),
            });
        }
        if url == MEMORY_SCHEME {
            return Ok(Arc::new(MemoryStore::new()));
        }
        let root = match url.strip_prefix(FILE_SCHEME) {
            Some(path) if path.is_empty() => {
                return Err(StoreError::InvalidUrl {
                    url: self.url.clone(),
                    reason: "missing path".to_string(),
                })
            }
            Some(path) => PathBuf::from(path),
            None if url.contains("://") => {
                return Err(StoreError::InvalidUrl {
                    url: self.url.clone(),
                    reason: "unsupported scheme".to_string(),
                })
            }
            None => PathBuf::from(url),
        };
        Ok(Arc::new(JsonDirStore::new(root)))
    }
}

/// Minimal document store interface used by ingestion.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns every document of a collection, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::CollectionNotFound` if the collection does not exist.
    async fn find_all(&self, database: &str, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Appends documents to a collection, creating it if needed.
    ///
    /// Returns the number of documents written.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend cannot persist the documents.
    async fn insert_many(
        &self,
        database: &str,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<usize, StoreError>;

    /// Short backend description for logs.
    fn describe(&self) -> String;
}

static GLOBAL_STORE: Mutex<Option<Arc<dyn DocumentStore>>> = Mutex::new(None);

/// Returns the process-wide client, opening it from `config` on first use.
///
/// Later calls return the existing client regardless of `config`.
///
/// # Errors
///
/// Returns `StoreError::InvalidUrl` if the first open fails.
pub fn connect(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, StoreError> {
    let mut slot = GLOBAL_STORE.lock();
    if let Some(store) = slot.as_ref() {
        return Ok(Arc::clone(store));
    }
    let store = config.open()?;
    tracing::info!(backend = %store.describe(), "Document store client initialised");
    *slot = Some(Arc::clone(&store));
    Ok(store)
}

/// Installs `store` as the process-wide client, replacing any existing one.
pub fn install(store: Arc<dyn DocumentStore>) {
    *GLOBAL_STORE.lock() = Some(store);
}

/// Drops the process-wide client so the next [`connect`] opens a new one.
pub fn reset() {
    *GLOBAL_STORE.lock() = None;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_memory() {
        let store = StoreConfig::new("memory://").open().unwrap();
        assert_eq!(store.describe(), "memory");
    }

    #[test]
    fn test_open_paths() {
        let plain = StoreConfig::new("data/store").open().unwrap();
        assert!(plain.describe().contains("data/store"));

        let file = StoreConfig::new("file:///tmp/sensor").open().unwrap();
        assert!(file.describe().contains("/tmp/sensor"));
    }

    #[test]
    fn test_open_rejects_bad_urls() {
        for url in ["", "mongodb://localhost", "file://"] {
            assert!(
                matches!(StoreConfig::new(url).open(), Err(StoreError::InvalidUrl { .. })),
                "{url}"
            );
        }
    }

    #[test]
    fn test_default_url() {
        assert_eq!(StoreConfig::default().url, "data/store");
    }

    // The only test touching the global client.
    #[test]
    fn test_connect_is_init_once() {
        reset();
        let first = connect(&StoreConfig::new("memory://")).unwrap();
        let second = connect(&StoreConfig::new("some/other/path")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let replacement: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        install(Arc::clone(&replacement));
        assert!(Arc::ptr_eq(&connect(&StoreConfig::default()).unwrap(), &replacement));

        reset();
    }
}
