use serde::{Deserialize, Serialize};

/// Maximum operations per atomic batch on the production store.
pub const DEFAULT_MAX_BATCH_OPS: usize = 500;

/// Store client settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Upper bound on staged operations per batch.
    pub max_batch_ops: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_batch_ops: DEFAULT_MAX_BATCH_OPS,
        }
    }
}
