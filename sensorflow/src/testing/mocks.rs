//! Store doubles.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Notify, Semaphore};

use crate::errors::StoreError;
use crate::store::{Document, DocumentStore, MemoryStore};

/// A memory store whose reads block until [`GatedStore::release`] is called.
///
/// Used to hold a training run inside ingestion while a second trigger
/// arrives.
#[derive(Debug)]
pub struct GatedStore {
    inner: MemoryStore,
    gate: Semaphore,
    entered: Notify,
    find_calls: AtomicUsize,
}

impl GatedStore {
    /// Creates a closed gate over an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            gate: Semaphore::new(0),
            entered: Notify::new(),
            find_calls: AtomicUsize::new(0),
        }
    }

    /// The wrapped store, for seeding.
    #[must_use]
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    /// Waits until some reader is blocked at the gate.
    pub async fn wait_until_entered(&self) {
        self.entered.notified().await;
    }

    /// Lets all current and future reads through.
    pub fn release(&self) {
        self.gate.add_permits(Semaphore::MAX_PERMITS / 2);
    }

    /// Number of `find_all` calls so far.
    #[must_use]
    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for GatedStore {
    async fn find_all(&self, database: &str, collection: &str) -> Result<Vec<Document>, StoreError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| StoreError::Io(std::io::Error::other(e)))?;
        self.inner.find_all(database, collection).await
    }

    async fn insert_many(
        &self,
        database: &str,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<usize, StoreError> {
        self.inner.insert_many(database, collection, documents).await
    }

    fn describe(&self) -> String {
        "gated-memory".to_string()
    }
}

impl Default for GatedStore {
    fn default() -> Self {
        Self::new()
    }
}

/// A store whose every call fails with an IO error.
#[derive(Debug, Default)]
pub struct FailingStore {
    calls: AtomicUsize,
}

impl FailingStore {
    /// Creates the store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of calls received.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail(&self) -> StoreError {
        self.calls.fetch_add(1, Ordering::SeqCst);
        StoreError::Io(std::io::Error::other("store unavailable"))
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn find_all(&self, _database: &str, _collection: &str) -> Result<Vec<Document>, StoreError> {
        Err(self.fail())
    }

    async fn insert_many(
        &self,
        _database: &str,
        _collection: &str,
        _documents: Vec<Document>,
    ) -> Result<usize, StoreError> {
        Err(self.fail())
    }

    fn describe(&self) -> String {
        "failing".to_string()
    }
}
