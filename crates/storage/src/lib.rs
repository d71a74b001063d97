//! Storage Layer
//!
//! Document store contract (write-once create, read-all, snapshot
//! subscriptions) with an in-memory implementation.

mod document;
mod memory;
mod subscription;

pub use document::{CollectionPath, StoredDocument};
pub use memory::MemoryStore;
pub use subscription::{subscribe, Subscription};

use std::future::Future;
use thiserror::Error;
use tokio::sync::watch;

/// Storage errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),
    #[error("Read failed: {0}")]
    ReadFailed(String),
    #[error("Document {id} already exists in {path}")]
    AlreadyExists { path: String, id: String },
}

/// Document store keyed by collection path and document id
///
/// Documents are written once and never updated. Watchers always receive the
/// complete current collection.
pub trait DocumentStore: Send + Sync + 'static {
    /// Write a new document and assign its server timestamp
    fn create(
        &self,
        path: &CollectionPath,
        id: &str,
        data: serde_json::Value,
    ) -> impl Future<Output = Result<StoredDocument, StorageError>> + Send;

    /// Read every document in a collection, oldest first
    fn read_all(
        &self,
        path: &CollectionPath,
    ) -> impl Future<Output = Result<Vec<StoredDocument>, StorageError>> + Send;

    /// Watch a collection. A missing collection starts as an empty snapshot.
    fn watch(
        &self,
        path: &CollectionPath,
    ) -> Result<watch::Receiver<Vec<StoredDocument>>, StorageError>;
}
