//! In-memory Document Store

use crate::{CollectionPath, DocumentStore, StorageError, StoredDocument};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::watch;
use tracing::{debug, info};

struct Collection {
    documents: Vec<StoredDocument>,
    sender: watch::Sender<Vec<StoredDocument>>,
}

impl Collection {
    fn new() -> Self {
        let (sender, _) = watch::channel(Vec::new());
        Self {
            documents: Vec::new(),
            sender,
        }
    }
}

/// Document store held in process memory
pub struct MemoryStore {
    collections: Mutex<HashMap<CollectionPath, Collection>>,
    /// Fail every write (for exercising error paths)
    fail_writes: AtomicBool,
    /// Fail every read and watch
    fail_reads: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        info!("Creating in-memory document store");
        Self {
            collections: Mutex::new(HashMap::new()),
            fail_writes: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
        }
    }

    /// Make subsequent writes fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Make subsequent reads and watches fail
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::Relaxed);
    }

    /// Number of documents in a collection
    pub fn document_count(&self, path: &CollectionPath) -> usize {
        self.collections
            .lock()
            .map(|c| c.get(path).map_or(0, |col| col.documents.len()))
            .unwrap_or(0)
    }

    fn insert(
        &self,
        path: &CollectionPath,
        id: &str,
        data: serde_json::Value,
    ) -> Result<StoredDocument, StorageError> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(StorageError::WriteFailed(format!(
                "write rejected for {}",
                path
            )));
        }

        let mut collections = self
            .collections
            .lock()
            .map_err(|e| StorageError::WriteFailed(format!("Lock error: {}", e)))?;
        let collection = collections
            .entry(path.clone())
            .or_insert_with(Collection::new);

        if collection.documents.iter().any(|d| d.id == id) {
            return Err(StorageError::AlreadyExists {
                path: path.to_string(),
                id: id.to_string(),
            });
        }

        let document = StoredDocument {
            id: id.to_string(),
            timestamp: Utc::now(),
            data,
        };
        collection.documents.push(document.clone());
        collection.sender.send_replace(collection.documents.clone());

        debug!("Created document {} in {}", id, path);
        Ok(document)
    }

    fn snapshot(&self, path: &CollectionPath) -> Result<Vec<StoredDocument>, StorageError> {
        if self.fail_reads.load(Ordering::Relaxed) {
            return Err(StorageError::ReadFailed(format!("read rejected for {}", path)));
        }

        let collections = self
            .collections
            .lock()
            .map_err(|e| StorageError::ReadFailed(format!("Lock error: {}", e)))?;
        Ok(collections
            .get(path)
            .map(|c| c.documents.clone())
            .unwrap_or_default())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for MemoryStore {
    async fn create(
        &self,
        path: &CollectionPath,
        id: &str,
        data: serde_json::Value,
    ) -> Result<StoredDocument, StorageError> {
        self.insert(path, id, data)
    }

    async fn read_all(&self, path: &CollectionPath) -> Result<Vec<StoredDocument>, StorageError> {
        self.snapshot(path)
    }

    fn watch(
        &self,
        path: &CollectionPath,
    ) -> Result<watch::Receiver<Vec<StoredDocument>>, StorageError> {
        if self.fail_reads.load(Ordering::Relaxed) {
            return Err(StorageError::ReadFailed(format!("watch rejected for {}", path)));
        }

        let mut collections = self
            .collections
            .lock()
            .map_err(|e| StorageError::ReadFailed(format!("Lock error: {}", e)))?;
        let collection = collections
            .entry(path.clone())
            .or_insert_with(Collection::new);
        Ok(collection.sender.subscribe())
    }
}
