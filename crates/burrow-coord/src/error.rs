use burrow_paths::{PathError, PathKey};
use burrow_store::StoreError;
use thiserror::Error;

/// Errors returned by coordinator operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Arity or identifier problem; a caller bug, raised before any I/O.
    #[error(transparent)]
    Path(#[from] PathError),

    /// The target entity or a required ancestor does not exist.
    #[error("not found: {key}")]
    NotFound { key: PathKey },

    /// Another entity already holds the requested unique name.
    #[error("name already in use: {name}")]
    NameAlreadyInUse { name: String },

    /// An entity with the requested identifier already exists.
    #[error("entity already exists: {key}")]
    EntityExists { key: PathKey },

    /// The atomic commit failed; none of its operations were applied.
    #[error("commit failed: {0}")]
    StoreCommitFailed(#[source] StoreError),

    /// A cascading delete needs more operations than one batch allows.
    #[error("subtree of {root} needs {ops} operations, batch limit is {limit}")]
    SubtreeTooLarge {
        root: PathKey,
        ops: usize,
        limit: usize,
    },

    /// The request contradicts itself or exceeds a configured limit.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A stored document lacks a field the coordinator relies on.
    #[error("corrupt document {key}: {reason}")]
    CorruptDocument { key: PathKey, reason: String },

    /// A read or staging call to the store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl CoordError {
    /// Whether the caller is at fault (4xx-equivalent) rather than the
    /// infrastructure (5xx-equivalent).
    pub fn is_client_error(&self) -> bool {
        match self {
            CoordError::Path(_)
            | CoordError::NotFound { .. }
            | CoordError::NameAlreadyInUse { .. }
            | CoordError::EntityExists { .. }
            | CoordError::SubtreeTooLarge { .. }
            | CoordError::InvalidRequest(_) => true,
            CoordError::StoreCommitFailed(_)
            | CoordError::CorruptDocument { .. }
            | CoordError::Store(_) => false,
        }
    }
}

/// Result alias for coordinator operations.
pub type CoordResult<T> = Result<T, CoordError>;
