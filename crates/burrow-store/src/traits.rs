use async_trait::async_trait;
use burrow_paths::PathKey;
use serde_json::Value;

use crate::batch::Batch;
use crate::document::Document;
use crate::error::StoreResult;

/// Outcome of a successful commit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommitReceipt {
    /// Operations applied.
    pub writes: usize,
    /// Store-wide commit counter after this commit.
    pub sequence: u64,
}

/// Client for a remote hierarchical document store.
///
/// All implementations must satisfy these invariants:
/// - `commit` applies every staged operation or none of them.
/// - Reads never observe an uncommitted batch.
/// - `create` of an existing document and `update` of a missing one fail the
///   entire commit.
/// - There is no cross-batch atomicity and no recursive delete.
///
/// Implementations are shared across request-handling tasks, hence
/// `Send + Sync`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a document.
    ///
    /// Returns `Ok(None)` if the document does not exist.
    async fn get(&self, key: &PathKey) -> StoreResult<Option<Document>>;

    /// Upper bound on operations per batch.
    fn max_batch_ops(&self) -> usize;

    /// A fresh, empty batch sized for this store.
    fn new_batch(&self) -> Batch {
        Batch::new(self.max_batch_ops())
    }

    /// Atomically apply a batch. The batch is consumed either way.
    async fn commit(&self, batch: Batch) -> StoreResult<CommitReceipt>;

    /// Keys of the documents one level beneath a document, across all of its
    /// subcollections.
    ///
    /// Documents that do not exist themselves but have descendants are
    /// included, so that walking the result reaches every stored descendant.
    async fn list_children(&self, key: &PathKey) -> StoreResult<Vec<PathKey>>;

    /// Keys of the documents directly in `collection` whose array `field`
    /// contains `value`.
    async fn query_array_contains(
        &self,
        collection: &PathKey,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<PathKey>>;

    /// Check whether a document exists.
    async fn exists(&self, key: &PathKey) -> StoreResult<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Read several documents.
    ///
    /// Default implementation calls `get()` for each key in turn. Backends
    /// may override with a batched read.
    async fn get_many(&self, keys: &[PathKey]) -> StoreResult<Vec<Option<Document>>> {
        let mut documents = Vec::with_capacity(keys.len());
        for key in keys {
            documents.push(self.get(key).await?);
        }
        Ok(documents)
    }
}
