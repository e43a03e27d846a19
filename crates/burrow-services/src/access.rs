//! Single-document reads and writes that need no coordination.

use burrow_paths::{resolve_document, EntityKind, PathKey};
use burrow_store::{Document, DocumentStore, StoreError};
use serde::de::DeserializeOwned;

use crate::error::{ServiceError, ServiceResult};
use crate::model::from_document;

pub(crate) fn key(kind: EntityKind, ids: &[&str]) -> ServiceResult<PathKey> {
    Ok(resolve_document(kind, ids)?)
}

/// Read and decode a document, `None` if absent.
pub(crate) async fn read<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    key: &PathKey,
) -> ServiceResult<Option<T>> {
    match store.get(key).await? {
        Some(document) => Ok(Some(from_document(key, document)?)),
        None => Ok(None),
    }
}

/// Read and decode a document that must exist.
pub(crate) async fn require<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    key: &PathKey,
) -> ServiceResult<T> {
    read(store, key)
        .await?
        .ok_or_else(|| ServiceError::NotFound(key.clone()))
}

/// Fail with `NotFound` unless the document exists.
pub(crate) async fn ensure_exists(store: &dyn DocumentStore, key: &PathKey) -> ServiceResult<()> {
    if store.exists(key).await? {
        Ok(())
    } else {
        Err(ServiceError::NotFound(key.clone()))
    }
}

/// Create one document; fails with `AlreadyExists` if it is present.
pub(crate) async fn create(
    store: &dyn DocumentStore,
    key: PathKey,
    document: Document,
) -> ServiceResult<()> {
    let mut batch = store.new_batch();
    batch.create(key, document)?;
    store.commit(batch).await.map_err(|err| match err {
        StoreError::AlreadyExists(key) => ServiceError::AlreadyExists(key),
        other => ServiceError::Store(other),
    })?;
    Ok(())
}

/// Delete one leaf document that must exist.
pub(crate) async fn remove(store: &dyn DocumentStore, key: PathKey) -> ServiceResult<()> {
    ensure_exists(store, &key).await?;
    let mut batch = store.new_batch();
    batch.delete(key)?;
    store.commit(batch).await?;
    Ok(())
}
