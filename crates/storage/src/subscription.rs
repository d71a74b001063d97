//! Callback-style collection subscriptions

use crate::{CollectionPath, DocumentStore, StorageError, StoredDocument};
use tokio::task::JoinHandle;
use tracing::debug;

/// Active subscription. Dropping it stops delivery.
pub struct Subscription {
    path: CollectionPath,
    handle: JoinHandle<()>,
}

impl Subscription {
    /// Stop delivering snapshots
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        debug!("Unsubscribing from {}", self.path);
        self.handle.abort();
    }
}

/// Deliver the current collection to `callback`, then every later snapshot.
///
/// Each delivery is the complete collection and replaces the previous one.
/// Must be called from within a tokio runtime.
pub fn subscribe<S, F>(
    store: &S,
    path: &CollectionPath,
    mut callback: F,
) -> Result<Subscription, StorageError>
where
    S: DocumentStore,
    F: FnMut(Vec<StoredDocument>) + Send + 'static,
{
    let mut rx = store.watch(path)?;
    let handle = tokio::spawn(async move {
        let initial = rx.borrow_and_update().clone();
        callback(initial);
        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();
            callback(snapshot);
        }
    });

    Ok(Subscription {
        path: path.clone(),
        handle,
    })
}
