//! Cascading subtree deletion.
//!
//! The store has no recursive delete, so the subtree is discovered with an
//! explicit worklist walk over `list_children`, then deleted deepest first
//! with the root last. A named root also loses its registry entry and its
//! tag-index memberships in the batch that deletes it.

use burrow_paths::{resolve_collection, resolve_document, EntityKind, PathKey};
use burrow_store::{Batch, DocumentUpdate};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::OversizePolicy;
use crate::coordinator::{required_name, Coordinator};
use crate::error::{CoordError, CoordResult};
use crate::named::{NamedKind, TAG_MEMBERS_FIELD};
use crate::registry::registry_key;

/// Everything a cascading delete will touch, computed from one snapshot of
/// reads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeletePlan {
    pub root: PathKey,
    /// Stored descendants of the root, deepest first.
    pub descendants: Vec<PathKey>,
    /// Unique name released by the delete, for named roots.
    pub name: Option<String>,
    /// Registry entry to delete, when it still belongs to the root.
    pub registry_entry: Option<PathKey>,
    /// Tag-index entries the name must be removed from.
    pub tag_indexes: Vec<PathKey>,
}

impl DeletePlan {
    /// Total operations needed to carry out the plan.
    pub fn op_count(&self) -> usize {
        self.descendants.len() + self.final_op_count()
    }

    /// Operations that must commit together with the root delete.
    pub fn final_op_count(&self) -> usize {
        1 + usize::from(self.registry_entry.is_some()) + self.tag_indexes.len()
    }
}

/// Outcome of a completed cascading delete.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    pub root: PathKey,
    /// Documents removed, root included.
    pub documents_deleted: usize,
    /// Index entries the released name was removed from.
    pub tag_indexes_updated: usize,
    pub registry_released: bool,
    /// Commits used; more than one only under the chunked policy.
    pub batches: usize,
}

impl Coordinator {
    /// Work out what deleting the document addressed by `ids` would do,
    /// without writing anything.
    pub async fn plan_delete(&self, kind: EntityKind, ids: &[&str]) -> CoordResult<DeletePlan> {
        let root = resolve_document(kind, ids)?;
        let document = self.read_required(&root).await?;
        let descendants = self.collect_descendants(&root).await?;

        let mut plan = DeletePlan {
            root,
            descendants,
            name: None,
            registry_entry: None,
            tag_indexes: Vec::new(),
        };
        let Some(named) = NamedKind::from_entity_kind(kind) else {
            return Ok(plan);
        };

        let (scope, id) = ids.split_at(ids.len() - 1);
        let name = required_name(named, &plan.root, &document)?;
        let name_key = registry_key(named, scope, &name)?;
        plan.registry_entry = self.owned_registry_entry(&name_key, id[0]).await?;

        if let Some(tag_kind) = named.tag_index_kind() {
            let collection = resolve_collection(tag_kind, scope)?;
            plan.tag_indexes = self
                .store()
                .query_array_contains(&collection, TAG_MEMBERS_FIELD, &Value::from(name.as_str()))
                .await?
                .into_iter()
                .filter(|key| !key.is_descendant_of(&plan.root))
                .collect();
        }
        plan.name = Some(name);
        Ok(plan)
    }

    /// Delete a document, all of its descendants and, for named kinds, its
    /// registry entry and tag-index memberships.
    ///
    /// Under [`OversizePolicy::Reject`] a subtree that does not fit in one
    /// batch fails with [`CoordError::SubtreeTooLarge`] before any write.
    pub async fn delete_subtree(&self, kind: EntityKind, ids: &[&str]) -> CoordResult<DeleteReport> {
        let plan = self.plan_delete(kind, ids).await?;
        self.execute_delete(plan).await
    }

    /// Carry out a plan produced by [`Coordinator::plan_delete`].
    pub async fn execute_delete(&self, plan: DeletePlan) -> CoordResult<DeleteReport> {
        let limit = self.store().max_batch_ops();
        let total = plan.op_count();
        debug!(root = %plan.root, ops = total, limit, "executing delete plan");

        let mut batches = 0;
        if total > limit {
            if self.config().oversize_policy == OversizePolicy::Reject || plan.final_op_count() > limit {
                return Err(CoordError::SubtreeTooLarge {
                    root: plan.root,
                    ops: total,
                    limit,
                });
            }
            warn!(root = %plan.root, ops = total, limit, "deleting oversized subtree in chunks");
            for chunk in plan.descendants.chunks(limit) {
                let mut batch = self.store().new_batch();
                for key in chunk {
                    batch.delete(key.clone())?;
                }
                self.commit_delete(batch, &plan.root, batches).await?;
                batches += 1;
            }
            let mut batch = self.store().new_batch();
            self.stage_root_removal(&mut batch, &plan)?;
            self.commit_delete(batch, &plan.root, batches).await?;
            batches += 1;
        } else {
            let mut batch = self.store().new_batch();
            for key in &plan.descendants {
                batch.delete(key.clone())?;
            }
            self.stage_root_removal(&mut batch, &plan)?;
            self.commit_delete(batch, &plan.root, batches).await?;
            batches += 1;
        }

        let report = DeleteReport {
            documents_deleted: plan.descendants.len() + 1,
            tag_indexes_updated: plan.tag_indexes.len(),
            registry_released: plan.registry_entry.is_some(),
            batches,
            root: plan.root,
        };
        info!(
            root = %report.root,
            documents = report.documents_deleted,
            batches = report.batches,
            "deleted subtree"
        );
        Ok(report)
    }

    /// Every stored descendant of `root`, deepest first. Keys at equal depth
    /// keep their natural order so plans are deterministic.
    async fn collect_descendants(&self, root: &PathKey) -> CoordResult<Vec<PathKey>> {
        let mut found = Vec::new();
        let mut pending = vec![root.clone()];
        while let Some(key) = pending.pop() {
            for child in self.store().list_children(&key).await? {
                pending.push(child.clone());
                found.push(child);
            }
        }
        found.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        Ok(found)
    }

    fn stage_root_removal(&self, batch: &mut Batch, plan: &DeletePlan) -> CoordResult<()> {
        batch.delete(plan.root.clone())?;
        if let Some(entry) = &plan.registry_entry {
            batch.delete(entry.clone())?;
        }
        if let Some(name) = &plan.name {
            for index in &plan.tag_indexes {
                batch.update(
                    index.clone(),
                    DocumentUpdate::new().array_remove(TAG_MEMBERS_FIELD, [name.as_str()]),
                )?;
            }
        }
        Ok(())
    }

    async fn commit_delete(&self, batch: Batch, root: &PathKey, committed: usize) -> CoordResult<()> {
        self.store().commit(batch).await.map_err(|err| {
            if committed > 0 {
                warn!(%root, committed, error = %err, "chunked delete stopped part-way");
            }
            CoordError::StoreCommitFailed(err)
        })?;
        Ok(())
    }
}
