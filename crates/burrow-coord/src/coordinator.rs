use std::collections::BTreeSet;
use std::sync::Arc;

use burrow_paths::{resolve_document, validate_identifier, EntityKind, PathKey};
use burrow_store::{Document, DocumentStore, DocumentUpdate, StoreError};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::CoordinatorConfig;
use crate::error::{CoordError, CoordResult};
use crate::named::{NamedKind, TAGS_FIELD};
use crate::registry::{registry_entry, registry_key};
use crate::tags::IndexEdit;

/// A document created together with a new named entity, directly beneath
/// it (e.g. the creator's membership entry of a new group).
#[derive(Clone, Debug, PartialEq)]
pub struct ChildDocument {
    pub kind: EntityKind,
    pub id: String,
    pub document: Document,
}

/// Request to create an entity that owns a unique name.
#[derive(Clone, Debug, PartialEq)]
pub struct NewNamedEntity {
    pub kind: NamedKind,
    /// Identifiers of the enclosing documents, outermost first.
    pub scope: Vec<String>,
    /// Caller-chosen identifier; a UUID v7 is generated when absent.
    pub id: Option<String>,
    pub name: String,
    pub fields: Document,
    pub tags: Vec<String>,
    pub children: Vec<ChildDocument>,
}

impl NewNamedEntity {
    pub fn new(kind: NamedKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            scope: Vec::new(),
            id: None,
            name: name.into(),
            fields: Document::new(),
            tags: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn in_scope<I, S>(mut self, scope: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope = scope.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_fields(mut self, fields: Document) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_child(mut self, kind: EntityKind, id: impl Into<String>, document: Document) -> Self {
        self.children.push(ChildDocument {
            kind,
            id: id.into(),
            document,
        });
        self
    }
}

/// Keeps groups of documents mutually consistent on a store that only
/// offers single-document operations and bounded atomic batches.
///
/// Every logical operation reads what it must validate, stages all of its
/// mutations into one batch and commits once. No lock is held between the
/// reads and the commit; see the crate docs for the consequences.
pub struct Coordinator {
    store: Arc<dyn DocumentStore>,
    config: CoordinatorConfig,
}

impl Coordinator {
    pub fn new(store: Arc<dyn DocumentStore>, config: CoordinatorConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Create a named entity, its registry entry, its tag-index memberships
    /// and its initial children in one atomic batch. Returns the entity id.
    ///
    /// Fails with [`CoordError::NameAlreadyInUse`] if the name is taken,
    /// before anything is written, and with [`CoordError::NotFound`] if the
    /// enclosing document of a nested kind is missing.
    pub async fn create_named(&self, request: NewNamedEntity) -> CoordResult<String> {
        let NewNamedEntity {
            kind,
            scope,
            id,
            name,
            fields,
            tags,
            children,
        } = request;
        let scope: Vec<&str> = scope.iter().map(String::as_str).collect();

        let id = match id {
            Some(id) => id,
            None => Uuid::now_v7().to_string(),
        };
        let entity_key = entity_key(kind, &scope, &id)?;
        let name_key = registry_key(kind, &scope, &name)?;
        let tags = self.checked_tags(kind, &tags[..])?;
        let child_keys = children
            .iter()
            .map(|child| child_key(kind, &scope, &id, child))
            .collect::<CoordResult<Vec<_>>>()?;

        self.ensure_name_free(&name_key, &name).await?;
        if let Some(parent) = owning_document(&entity_key) {
            self.read_required(&parent).await?;
        }

        let mut document = fields;
        document.set(kind.name_field(), name.as_str());
        if kind.tag_index_kind().is_some() {
            document.set(
                TAGS_FIELD,
                Value::from(tags.iter().cloned().collect::<Vec<_>>()),
            );
        }

        let mut batch = self.store.new_batch();
        batch
            .create(entity_key.clone(), document)
            .map_err(staging_error)?;
        batch
            .create(name_key.clone(), registry_entry(&id))
            .map_err(staging_error)?;
        if let Some(tag_kind) = kind.tag_index_kind() {
            let edits = tags
                .iter()
                .map(|tag| IndexEdit::add(tag, &name))
                .collect();
            self.stage_index_edits(&mut batch, tag_kind, &scope, edits)
                .await?;
        }
        for (child, key) in children.into_iter().zip(child_keys) {
            batch.create(key, child.document).map_err(staging_error)?;
        }

        debug!(%entity_key, ops = batch.len(), "staged named create");
        self.store
            .commit(batch)
            .await
            .map_err(|e| commit_error(e, &entity_key, &name_key, &name))?;
        info!(%kind, %entity_key, name = %name, "created named entity");
        Ok(id)
    }

    /// Change the unique name of an existing entity.
    ///
    /// Swaps the registry entry, rewrites the name field and moves the name
    /// inside every tag index the entity belongs to, in one batch. Renaming
    /// to the current name is a no-op.
    pub async fn rename(
        &self,
        kind: NamedKind,
        scope: &[&str],
        id: &str,
        new_name: &str,
    ) -> CoordResult<()> {
        let entity_key = entity_key(kind, scope, id)?;
        let new_key = registry_key(kind, scope, new_name)?;
        let entity = self.read_required(&entity_key).await?;
        let old_name = required_name(kind, &entity_key, &entity)?;
        if old_name == new_name {
            debug!(%entity_key, "rename to current name skipped");
            return Ok(());
        }
        let old_key = registry_key(kind, scope, &old_name)?;

        self.ensure_name_free(&new_key, new_name).await?;
        let owned_old_key = self.owned_registry_entry(&old_key, id).await?;

        let mut batch = self.store.new_batch();
        if let Some(old_key) = owned_old_key {
            batch.delete(old_key).map_err(staging_error)?;
        }
        batch
            .create(new_key.clone(), registry_entry(id))
            .map_err(staging_error)?;
        batch
            .update(
                entity_key.clone(),
                DocumentUpdate::new().set(kind.name_field(), new_name),
            )
            .map_err(staging_error)?;
        if let Some(tag_kind) = kind.tag_index_kind() {
            let edits = entity
                .string_set(TAGS_FIELD)
                .iter()
                .map(|tag| IndexEdit::rename(tag, &old_name, new_name))
                .collect();
            self.stage_index_edits(&mut batch, tag_kind, scope, edits)
                .await?;
        }

        debug!(%entity_key, ops = batch.len(), "staged rename");
        self.store
            .commit(batch)
            .await
            .map_err(|e| commit_error(e, &entity_key, &new_key, new_name))?;
        info!(%kind, %entity_key, from = %old_name, to = %new_name, "renamed entity");
        Ok(())
    }

    /// Read a document that must exist.
    pub(crate) async fn read_required(&self, key: &PathKey) -> CoordResult<Document> {
        self.store
            .get(key)
            .await?
            .ok_or_else(|| CoordError::NotFound { key: key.clone() })
    }

    /// Validate and deduplicate tags against the configured limits.
    pub(crate) fn checked_tags(
        &self,
        kind: NamedKind,
        tags: &[impl AsRef<str>],
    ) -> CoordResult<BTreeSet<String>> {
        if !tags.is_empty() && kind.tag_index_kind().is_none() {
            return Err(CoordError::InvalidRequest(format!("{kind} entities carry no tags")));
        }
        let mut set = BTreeSet::new();
        for tag in tags {
            let tag = tag.as_ref();
            validate_identifier(tag)?;
            set.insert(tag.to_string());
        }
        if set.len() > self.config.max_tags {
            return Err(CoordError::InvalidRequest(format!(
                "{} tags exceed the limit of {}",
                set.len(),
                self.config.max_tags
            )));
        }
        Ok(set)
    }
}

/// Document key of a named entity.
pub(crate) fn entity_key(kind: NamedKind, scope: &[&str], id: &str) -> CoordResult<PathKey> {
    let mut ids = scope.to_vec();
    ids.push(id);
    Ok(resolve_document(kind.entity_kind(), &ids)?)
}

/// The document that owns the collection `key` lives in.
pub(crate) fn owning_document(key: &PathKey) -> Option<PathKey> {
    key.parent().and_then(|collection| collection.parent())
}

/// The unique name stored on an entity document.
pub(crate) fn required_name(
    kind: NamedKind,
    key: &PathKey,
    entity: &Document,
) -> CoordResult<String> {
    entity
        .get_str(kind.name_field())
        .map(str::to_string)
        .ok_or_else(|| CoordError::CorruptDocument {
            key: key.clone(),
            reason: format!("missing `{}` field", kind.name_field()),
        })
}

fn child_key(
    kind: NamedKind,
    scope: &[&str],
    id: &str,
    child: &ChildDocument,
) -> CoordResult<PathKey> {
    let parent = kind.entity_kind();
    let nested_directly = child.kind.arity() == parent.arity() + 1
        && child.kind.collections().starts_with(parent.collections());
    if !nested_directly {
        return Err(CoordError::InvalidRequest(format!(
            "{} documents do not live directly under {parent}",
            child.kind
        )));
    }
    let mut ids = scope.to_vec();
    ids.push(id);
    ids.push(&child.id);
    Ok(resolve_document(child.kind, &ids)?)
}

/// Map a staging failure. Running out of room in the batch means the
/// request itself is too large for one atomic commit.
pub(crate) fn staging_error(err: StoreError) -> CoordError {
    match err {
        StoreError::BatchTooLarge { staged, limit } => CoordError::InvalidRequest(format!(
            "request needs at least {staged} operations, batch limit is {limit}"
        )),
        other => CoordError::Store(other),
    }
}

/// Map a failed commit. A lost race on the registry entry means another
/// writer claimed the name between the pre-check and the commit; a conflict
/// on the entity itself means the id is taken. Any other conflict (a tag
/// index entry created concurrently) is a failed commit the caller may retry.
fn commit_error(err: StoreError, entity_key: &PathKey, name_key: &PathKey, name: &str) -> CoordError {
    match err {
        StoreError::AlreadyExists(key) if &key == name_key => {
            warn!(%key, "name claimed by a concurrent writer");
            CoordError::NameAlreadyInUse {
                name: name.to_string(),
            }
        }
        StoreError::AlreadyExists(key) if &key == entity_key => CoordError::EntityExists { key },
        other => CoordError::StoreCommitFailed(other),
    }
}
