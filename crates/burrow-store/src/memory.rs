use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use burrow_paths::PathKey;
use serde_json::Value;
use tracing::{debug, warn};

use crate::batch::{Batch, WriteOp};
use crate::config::StoreConfig;
use crate::document::Document;
use crate::error::{StoreError, StoreResult};
use crate::traits::{CommitReceipt, DocumentStore};

type DocumentMap = BTreeMap<PathKey, Document>;

/// In-memory, `BTreeMap`-based document store.
///
/// Intended for tests and embedding. Documents are held behind a `RwLock`;
/// a commit validates every operation against a private overlay and only
/// then publishes the overlay, so a failing batch leaves no trace. Commit
/// failures can be injected to exercise callers' atomicity handling.
pub struct InMemoryDocumentStore {
    documents: RwLock<DocumentMap>,
    max_batch_ops: usize,
    fail_next_commit: AtomicBool,
    fail_all_commits: AtomicBool,
    commits: AtomicU64,
}

impl InMemoryDocumentStore {
    /// Create an empty store with the default batch bound.
    pub fn new() -> Self {
        Self::from_config(&StoreConfig::default())
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self {
            documents: RwLock::new(BTreeMap::new()),
            max_batch_ops: config.max_batch_ops,
            fail_next_commit: AtomicBool::new(false),
            fail_all_commits: AtomicBool::new(false),
            commits: AtomicU64::new(0),
        }
    }

    /// Create an empty store with a custom batch bound.
    pub fn with_max_batch_ops(max_batch_ops: usize) -> Self {
        Self::from_config(&StoreConfig { max_batch_ops })
    }

    /// Make the next commit fail with [`StoreError::Unavailable`].
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Make every commit fail until switched off again.
    pub fn set_fail_commits(&self, fail: bool) {
        self.fail_all_commits.store(fail, Ordering::SeqCst);
    }

    /// Number of successful commits.
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::SeqCst)
    }

    /// Number of stored documents.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read_lock()?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.read_lock()?.is_empty())
    }

    /// All stored keys, sorted.
    pub fn keys(&self) -> StoreResult<Vec<PathKey>> {
        Ok(self.read_lock()?.keys().cloned().collect())
    }

    /// All stored documents, sorted by key.
    pub fn dump(&self) -> StoreResult<Vec<(PathKey, Document)>> {
        Ok(self
            .read_lock()?
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    /// Remove every document.
    pub fn clear(&self) -> StoreResult<()> {
        self.write_lock()?.clear();
        Ok(())
    }

    fn read_lock(&self) -> StoreResult<RwLockReadGuard<'_, DocumentMap>> {
        self.documents
            .read()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {e}")))
    }

    fn write_lock(&self) -> StoreResult<RwLockWriteGuard<'_, DocumentMap>> {
        self.documents
            .write()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {e}")))
    }

    fn injected_failure(&self) -> bool {
        self.fail_all_commits.load(Ordering::SeqCst)
            || self.fail_next_commit.swap(false, Ordering::SeqCst)
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a batch against the current contents and compute its effect
/// without touching them. `None` in the overlay marks a deletion.
fn plan_commit(
    documents: &DocumentMap,
    ops: Vec<WriteOp>,
) -> StoreResult<BTreeMap<PathKey, Option<Document>>> {
    let mut overlay: BTreeMap<PathKey, Option<Document>> = BTreeMap::new();
    for op in ops {
        let current = match overlay.get(op.key()) {
            Some(staged) => staged.clone(),
            None => documents.get(op.key()).cloned(),
        };
        match op {
            WriteOp::Create { key, document } => {
                if current.is_some() {
                    return Err(StoreError::AlreadyExists(key));
                }
                overlay.insert(key, Some(document));
            }
            WriteOp::Set { key, document } => {
                overlay.insert(key, Some(document));
            }
            WriteOp::Update { key, update } => {
                let Some(mut document) = current else {
                    return Err(StoreError::NotFound(key));
                };
                document.apply(&update);
                overlay.insert(key, Some(document));
            }
            WriteOp::Delete { key } => {
                overlay.insert(key, None);
            }
        }
    }
    Ok(overlay)
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, key: &PathKey) -> StoreResult<Option<Document>> {
        if !key.is_document() {
            return Err(StoreError::InvalidKey {
                key: key.clone(),
                reason: "get requires a document key".into(),
            });
        }
        Ok(self.read_lock()?.get(key).cloned())
    }

    fn max_batch_ops(&self) -> usize {
        self.max_batch_ops
    }

    async fn commit(&self, batch: Batch) -> StoreResult<CommitReceipt> {
        if batch.len() > self.max_batch_ops {
            return Err(StoreError::BatchTooLarge {
                staged: batch.len(),
                limit: self.max_batch_ops,
            });
        }
        if self.injected_failure() {
            warn!(ops = batch.len(), "injected commit failure");
            return Err(StoreError::Unavailable("injected commit failure".into()));
        }

        let writes = batch.len();
        let mut documents = self.write_lock()?;
        let overlay = plan_commit(&documents, batch.into_ops())?;
        for (key, document) in overlay {
            match document {
                Some(document) => {
                    documents.insert(key, document);
                }
                None => {
                    documents.remove(&key);
                }
            }
        }
        let sequence = self.commits.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(writes, sequence, "batch committed");
        Ok(CommitReceipt { writes, sequence })
    }

    async fn list_children(&self, key: &PathKey) -> StoreResult<Vec<PathKey>> {
        if !key.is_document() {
            return Err(StoreError::InvalidKey {
                key: key.clone(),
                reason: "children are listed under a document key".into(),
            });
        }
        let child_len = key.len() + 2;
        let documents = self.read_lock()?;
        let children: BTreeSet<PathKey> = documents
            .range(key.clone()..)
            .map(|(k, _)| k)
            .take_while(|k| k.starts_with(key))
            .filter_map(|k| k.truncated(child_len))
            .collect();
        Ok(children.into_iter().collect())
    }

    async fn query_array_contains(
        &self,
        collection: &PathKey,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<PathKey>> {
        if !collection.is_collection() {
            return Err(StoreError::InvalidKey {
                key: collection.clone(),
                reason: "queries run against a collection key".into(),
            });
        }
        let documents = self.read_lock()?;
        Ok(documents
            .range(collection.clone()..)
            .take_while(|(k, _)| k.starts_with(collection))
            .filter(|(k, doc)| k.len() == collection.len() + 1 && doc.array_contains(field, value))
            .map(|(k, _)| k.clone())
            .collect())
    }
}

impl std::fmt::Debug for InMemoryDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len().unwrap_or_default();
        f.debug_struct("InMemoryDocumentStore")
            .field("document_count", &count)
            .field("max_batch_ops", &self.max_batch_ops)
            .finish()
    }
}
