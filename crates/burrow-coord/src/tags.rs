//! Tag indexes: one document per tag listing the names of the entities
//! carrying it. The entity mirrors its own tags in its `tags` field so both
//! directions can be read without a query.

use std::collections::BTreeSet;

use burrow_paths::{resolve_document, EntityKind};
use burrow_store::{Batch, Document, DocumentUpdate};
use serde_json::Value;
use tracing::{debug, info};

use crate::coordinator::{entity_key, required_name, staging_error, Coordinator};
use crate::error::{CoordError, CoordResult};
use crate::named::{NamedKind, TAGS_FIELD, TAG_MEMBERS_FIELD};

/// Membership changes to apply to one tag-index entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct IndexEdit {
    tag: String,
    remove: Vec<String>,
    add: Vec<String>,
}

impl IndexEdit {
    pub(crate) fn add(tag: &str, name: &str) -> Self {
        Self {
            tag: tag.to_string(),
            remove: Vec::new(),
            add: vec![name.to_string()],
        }
    }

    pub(crate) fn remove(tag: &str, name: &str) -> Self {
        Self {
            tag: tag.to_string(),
            remove: vec![name.to_string()],
            add: Vec::new(),
        }
    }

    pub(crate) fn rename(tag: &str, from: &str, to: &str) -> Self {
        Self {
            tag: tag.to_string(),
            remove: vec![from.to_string()],
            add: vec![to.to_string()],
        }
    }
}

impl Coordinator {
    /// Add and remove tags on a tagged entity. Returns the resulting tag set.
    ///
    /// The entity's `tags` field and every affected index entry change in one
    /// batch. Index entries are created on first use; an index entry whose
    /// last member leaves is kept with an empty member list.
    pub async fn update_tags(
        &self,
        kind: NamedKind,
        scope: &[&str],
        id: &str,
        add: &[&str],
        remove: &[&str],
    ) -> CoordResult<BTreeSet<String>> {
        let Some(tag_kind) = kind.tag_index_kind() else {
            return Err(CoordError::InvalidRequest(format!("{kind} entities carry no tags")));
        };
        let add = self.checked_tags(kind, add)?;
        let remove = self.checked_tags(kind, remove)?;
        if let Some(tag) = add.intersection(&remove).next() {
            return Err(CoordError::InvalidRequest(format!(
                "tag `{tag}` is both added and removed"
            )));
        }

        let entity_key = entity_key(kind, scope, id)?;
        let entity = self.read_required(&entity_key).await?;
        let name = required_name(kind, &entity_key, &entity)?;
        let current = entity.string_set(TAGS_FIELD);

        let added: Vec<&String> = add.difference(&current).collect();
        let removed: Vec<&String> = remove.intersection(&current).collect();
        let mut result = current.clone();
        for tag in &added {
            result.insert((*tag).clone());
        }
        for tag in &removed {
            result.remove(*tag);
        }
        if added.is_empty() && removed.is_empty() {
            debug!(%entity_key, "tag update changes nothing");
            return Ok(result);
        }
        if result.len() > self.config().max_tags {
            return Err(CoordError::InvalidRequest(format!(
                "{} tags exceed the limit of {}",
                result.len(),
                self.config().max_tags
            )));
        }

        let mut edits: Vec<IndexEdit> = added.iter().map(|tag| IndexEdit::add(tag, &name)).collect();
        edits.extend(removed.iter().map(|tag| IndexEdit::remove(tag, &name)));

        let mut batch = self.store().new_batch();
        let mut update = DocumentUpdate::new();
        if !added.is_empty() {
            update = update.array_union(TAGS_FIELD, added.iter().map(|tag| tag.as_str()));
        }
        if !removed.is_empty() {
            update = update.array_remove(TAGS_FIELD, removed.iter().map(|tag| tag.as_str()));
        }
        batch
            .update(entity_key.clone(), update)
            .map_err(staging_error)?;
        self.stage_index_edits(&mut batch, tag_kind, scope, edits)
            .await?;

        self.store()
            .commit(batch)
            .await
            .map_err(CoordError::StoreCommitFailed)?;
        info!(
            %entity_key,
            added = added.len(),
            removed = removed.len(),
            "updated tags"
        );
        Ok(result)
    }

    /// Stage index edits for tags within `scope`. Existing entries are
    /// updated with array transforms; missing ones are created when there is
    /// something to add and skipped otherwise.
    pub(crate) async fn stage_index_edits(
        &self,
        batch: &mut Batch,
        tag_kind: EntityKind,
        scope: &[&str],
        edits: Vec<IndexEdit>,
    ) -> CoordResult<()> {
        if edits.is_empty() {
            return Ok(());
        }
        let keys = edits
            .iter()
            .map(|edit| {
                let mut ids = scope.to_vec();
                ids.push(&edit.tag);
                resolve_document(tag_kind, &ids)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let existing = self.store().get_many(&keys).await?;

        for ((edit, key), current) in edits.into_iter().zip(keys).zip(existing) {
            match current {
                Some(_) => {
                    let mut update = DocumentUpdate::new();
                    if !edit.remove.is_empty() {
                        update = update.array_remove(TAG_MEMBERS_FIELD, edit.remove);
                    }
                    if !edit.add.is_empty() {
                        update = update.array_union(TAG_MEMBERS_FIELD, edit.add);
                    }
                    batch.update(key, update).map_err(staging_error)?;
                }
                None if !edit.add.is_empty() => {
                    let members = Document::new().with(TAG_MEMBERS_FIELD, Value::from(edit.add));
                    batch.create(key, members).map_err(staging_error)?;
                }
                None => debug!(%key, "no index entry to remove from"),
            }
        }
        Ok(())
    }
}
