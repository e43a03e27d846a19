use burrow_paths::{PathError, PathKey};

/// Errors from document store operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// An `update` targeted a document that does not exist.
    #[error("document not found: {0}")]
    NotFound(PathKey),

    /// A `create` targeted a document that already exists.
    #[error("document already exists: {0}")]
    AlreadyExists(PathKey),

    /// More operations were staged than one batch may carry.
    #[error("batch too large: {staged} operations staged, limit is {limit}")]
    BatchTooLarge { staged: usize, limit: usize },

    /// A key of the wrong shape was used (e.g. a collection as a document).
    #[error("invalid key {key}: {reason}")]
    InvalidKey { key: PathKey, reason: String },

    /// Document payload is not a JSON object.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// A key could not be built.
    #[error("path error: {0}")]
    Path(#[from] PathError),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The backend refused or failed the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
