use serde::{Deserialize, Serialize};

/// What a cascading delete does when its subtree does not fit in one batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OversizePolicy {
    /// Fail with `SubtreeTooLarge` before writing anything.
    #[default]
    Reject,
    /// Delete descendants in several batches, deepest first, and commit the
    /// root, its registry entry and its tag-index removals in a final batch.
    /// A failure part-way leaves the root, its name and its tags in place
    /// with some descendants already gone.
    Chunked,
}

/// Configuration for the consistency coordinator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Behavior for subtrees larger than one batch.
    pub oversize_policy: OversizePolicy,
    /// Only remove a registry entry when it still names the entity being
    /// deleted or renamed.
    pub verify_registry_owner: bool,
    /// Maximum tags one entity may carry.
    pub max_tags: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            oversize_policy: OversizePolicy::Reject,
            verify_registry_owner: true,
            max_tags: 32,
        }
    }
}

impl CoordinatorConfig {
    /// Defaults with chunked deletion of oversized subtrees.
    pub fn chunked() -> Self {
        Self {
            oversize_policy: OversizePolicy::Chunked,
            ..Default::default()
        }
    }
}
