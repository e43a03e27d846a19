use burrow_paths::PathKey;

use crate::document::{Document, DocumentUpdate};
use crate::error::{StoreError, StoreResult};

/// One staged mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum WriteOp {
    /// Write a new document; the commit fails if it exists.
    Create { key: PathKey, document: Document },
    /// Create or overwrite a document.
    Set { key: PathKey, document: Document },
    /// Transform fields of an existing document; the commit fails if absent.
    Update { key: PathKey, update: DocumentUpdate },
    /// Remove a document if present.
    Delete { key: PathKey },
}

impl WriteOp {
    pub fn key(&self) -> &PathKey {
        match self {
            WriteOp::Create { key, .. }
            | WriteOp::Set { key, .. }
            | WriteOp::Update { key, .. }
            | WriteOp::Delete { key } => key,
        }
    }

    /// Short operation label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            WriteOp::Create { .. } => "create",
            WriteOp::Set { .. } => "set",
            WriteOp::Update { .. } => "update",
            WriteOp::Delete { .. } => "delete",
        }
    }
}

/// A bounded set of mutations committed atomically.
///
/// A batch is owned by the operation that built it and consumed by
/// [`crate::DocumentStore::commit`]; it cannot be reused. Staging past the
/// bound fails with [`StoreError::BatchTooLarge`] and leaves the batch
/// unchanged, so nothing oversized ever reaches the store.
#[derive(Clone, Debug)]
pub struct Batch {
    ops: Vec<WriteOp>,
    max_ops: usize,
}

impl Batch {
    pub fn new(max_ops: usize) -> Self {
        Self {
            ops: Vec::new(),
            max_ops,
        }
    }

    pub fn create(&mut self, key: PathKey, document: Document) -> StoreResult<&mut Self> {
        self.stage(WriteOp::Create { key, document })
    }

    pub fn set(&mut self, key: PathKey, document: Document) -> StoreResult<&mut Self> {
        self.stage(WriteOp::Set { key, document })
    }

    pub fn update(&mut self, key: PathKey, update: DocumentUpdate) -> StoreResult<&mut Self> {
        self.stage(WriteOp::Update { key, update })
    }

    pub fn delete(&mut self, key: PathKey) -> StoreResult<&mut Self> {
        self.stage(WriteOp::Delete { key })
    }

    /// Stage a prepared operation.
    pub fn stage(&mut self, op: WriteOp) -> StoreResult<&mut Self> {
        if !op.key().is_document() {
            return Err(StoreError::InvalidKey {
                key: op.key().clone(),
                reason: format!("{} requires a document key", op.label()),
            });
        }
        if self.ops.len() >= self.max_ops {
            return Err(StoreError::BatchTooLarge {
                staged: self.ops.len() + 1,
                limit: self.max_ops,
            });
        }
        self.ops.push(op);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn max_ops(&self) -> usize {
        self.max_ops
    }

    /// Operations that can still be staged.
    pub fn remaining(&self) -> usize {
        self.max_ops.saturating_sub(self.ops.len())
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}
