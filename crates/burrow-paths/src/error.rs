//! Error types for path resolution.

use thiserror::Error;

use crate::kind::EntityKind;

/// Errors produced while building or parsing hierarchical keys.
///
/// All variants describe caller programming errors: they are raised before
/// any store access and are never worth retrying.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The identifier count matches neither the document nor the collection
    /// shape of the kind.
    #[error(
        "{kind} takes {document} identifiers for a document or {collection} for its collection, got {actual}"
    )]
    InvalidArity {
        kind: EntityKind,
        document: usize,
        collection: usize,
        actual: usize,
    },

    /// An identifier is empty or would corrupt the key layout.
    #[error("invalid identifier {id:?}: {reason}")]
    InvalidIdentifier { id: String, reason: String },

    /// A raw key string or a key navigation step is malformed.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },
}

/// Convenience alias for path operations.
pub type Result<T> = std::result::Result<T, PathError>;
