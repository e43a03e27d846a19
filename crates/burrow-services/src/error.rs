use burrow_coord::CoordError;
use burrow_paths::{PathError, PathKey};
use burrow_store::StoreError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(PathKey),

    #[error("already exists: {0}")]
    AlreadyExists(PathKey),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("malformed {key}: {reason}")]
    Malformed { key: PathKey, reason: String },

    #[error("coordinator error: {0}")]
    Coord(#[from] CoordError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("path error: {0}")]
    Path(#[from] PathError),
}

impl ServiceError {
    /// Whether the caller is at fault rather than the infrastructure.
    pub fn is_client_error(&self) -> bool {
        match self {
            ServiceError::NotFound(_)
            | ServiceError::AlreadyExists(_)
            | ServiceError::InvalidOperation(_)
            | ServiceError::Path(_) => true,
            ServiceError::Coord(err) => err.is_client_error(),
            ServiceError::Malformed { .. } | ServiceError::Store(_) => false,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
