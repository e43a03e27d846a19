//! End-to-end coordinator behavior against the in-memory store.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use burrow_paths::{composite_id, EntityKind, PathKey};
use burrow_store::{
    Batch, CommitReceipt, Document, DocumentStore, InMemoryDocumentStore, StoreError, StoreResult,
};
use serde_json::Value;

use crate::{
    CoordError, Coordinator, CoordinatorConfig, NamedKind, NewNamedEntity, REGISTRY_ID_FIELD,
    TAGS_FIELD, TAG_MEMBERS_FIELD,
};

fn key(raw: &str) -> PathKey {
    PathKey::parse(raw).unwrap()
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn setup() -> (Arc<InMemoryDocumentStore>, Coordinator) {
    setup_with(InMemoryDocumentStore::new(), CoordinatorConfig::default())
}

fn setup_with(
    store: InMemoryDocumentStore,
    config: CoordinatorConfig,
) -> (Arc<InMemoryDocumentStore>, Coordinator) {
    let store = Arc::new(store);
    let coordinator = Coordinator::new(store.clone(), config);
    (store, coordinator)
}

async fn doc(store: &InMemoryDocumentStore, raw: &str) -> Option<Document> {
    store.get(&key(raw)).await.unwrap()
}

async fn members(store: &InMemoryDocumentStore, raw: &str) -> BTreeSet<String> {
    doc(store, raw)
        .await
        .map(|d| d.string_set(TAG_MEMBERS_FIELD))
        .unwrap_or_default()
}

async fn group(coordinator: &Coordinator, id: &str, name: &str, tags: &[&str]) {
    coordinator
        .create_named(
            NewNamedEntity::new(NamedKind::Group, name)
                .with_id(id)
                .with_tags(tags.iter().copied()),
        )
        .await
        .unwrap();
}

async fn forum(coordinator: &Coordinator, group: &str, id: &str, name: &str, tags: &[&str]) {
    coordinator
        .create_named(
            NewNamedEntity::new(NamedKind::Forum, name)
                .in_scope([group])
                .with_id(id)
                .with_tags(tags.iter().copied()),
        )
        .await
        .unwrap();
}

async fn seed(store: &InMemoryDocumentStore, keys: &[&str]) {
    for chunk in keys.chunks(store.max_batch_ops()) {
        let mut batch = store.new_batch();
        for raw in chunk {
            batch.set(key(raw), Document::new().with("seeded", true)).unwrap();
        }
        store.commit(batch).await.unwrap();
    }
}

/// Delegates to an in-memory store. Can hide tag-index entries from reads,
/// as if another writer created them between the read and the commit, and
/// can fail one chosen commit.
struct InterleavedStore {
    inner: Arc<InMemoryDocumentStore>,
    hide_tag_entries: bool,
    fail_commit: Option<u64>,
    commits: AtomicU64,
}

impl InterleavedStore {
    fn new(inner: Arc<InMemoryDocumentStore>) -> Self {
        Self {
            inner,
            hide_tag_entries: false,
            fail_commit: None,
            commits: AtomicU64::new(0),
        }
    }

    fn hiding_tag_entries(mut self) -> Self {
        self.hide_tag_entries = true;
        self
    }

    /// Fail the `n`th commit (zero-based) made through this store.
    fn failing_commit(mut self, n: u64) -> Self {
        self.fail_commit = Some(n);
        self
    }
}

#[async_trait]
impl DocumentStore for InterleavedStore {
    async fn get(&self, key: &PathKey) -> StoreResult<Option<Document>> {
        if self.hide_tag_entries && key.collection_name().ends_with("_tags") {
            return Ok(None);
        }
        self.inner.get(key).await
    }

    fn max_batch_ops(&self) -> usize {
        self.inner.max_batch_ops()
    }

    async fn commit(&self, batch: Batch) -> StoreResult<CommitReceipt> {
        let n = self.commits.fetch_add(1, Ordering::SeqCst);
        if self.fail_commit == Some(n) {
            return Err(StoreError::Unavailable("connection reset".into()));
        }
        self.inner.commit(batch).await
    }

    async fn list_children(&self, key: &PathKey) -> StoreResult<Vec<PathKey>> {
        self.inner.list_children(key).await
    }

    async fn query_array_contains(
        &self,
        collection: &PathKey,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<PathKey>> {
        self.inner.query_array_contains(collection, field, value).await
    }
}

// ---------------------------------------------------------------------------
// Named creation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_writes_entity_registry_and_indexes() {
    let (store, coordinator) = setup();
    group(&coordinator, "g1", "dogs", &["huskies", "pets"]).await;

    let entity = doc(&store, "groups/g1").await.unwrap();
    assert_eq!(entity.get_str("name"), Some("dogs"));
    assert_eq!(entity.string_set(TAGS_FIELD), set(&["huskies", "pets"]));

    let entry = doc(&store, "group_names/dogs").await.unwrap();
    assert_eq!(entry.get_str(REGISTRY_ID_FIELD), Some("g1"));

    assert_eq!(members(&store, "group_tags/huskies").await, set(&["dogs"]));
    assert_eq!(members(&store, "group_tags/pets").await, set(&["dogs"]));
    assert_eq!(store.commit_count(), 1);
}

#[tokio::test]
async fn create_generates_an_id_when_none_is_given() {
    let (store, coordinator) = setup();
    let id = coordinator
        .create_named(NewNamedEntity::new(NamedKind::Group, "dogs"))
        .await
        .unwrap();
    assert!(uuid::Uuid::parse_str(&id).is_ok());
    assert!(doc(&store, &format!("groups/{id}")).await.is_some());
}

#[tokio::test]
async fn create_rejects_a_taken_name_before_writing() {
    let (store, coordinator) = setup();
    group(&coordinator, "g1", "dogs", &[]).await;

    let err = coordinator
        .create_named(NewNamedEntity::new(NamedKind::Group, "dogs").with_id("g2"))
        .await
        .unwrap_err();
    assert_eq!(err, CoordError::NameAlreadyInUse { name: "dogs".into() });
    assert!(doc(&store, "groups/g2").await.is_none());
    assert_eq!(store.commit_count(), 1);
}

#[tokio::test]
async fn create_rejects_an_existing_id() {
    let (store, coordinator) = setup();
    group(&coordinator, "g1", "dogs", &[]).await;

    let err = coordinator
        .create_named(NewNamedEntity::new(NamedKind::Group, "cats").with_id("g1"))
        .await
        .unwrap_err();
    assert_eq!(err, CoordError::EntityExists { key: key("groups/g1") });
    assert!(doc(&store, "group_names/cats").await.is_none());
}

#[tokio::test]
async fn nested_create_requires_the_parent() {
    let (_store, coordinator) = setup();
    let err = coordinator
        .create_named(
            NewNamedEntity::new(NamedKind::Forum, "general")
                .in_scope(["nope"])
                .with_id("f1"),
        )
        .await
        .unwrap_err();
    assert_eq!(err, CoordError::NotFound { key: key("groups/nope") });
}

#[tokio::test]
async fn forum_names_are_scoped_per_group() {
    let (store, coordinator) = setup();
    group(&coordinator, "g1", "dogs", &[]).await;
    group(&coordinator, "g2", "cats", &[]).await;
    forum(&coordinator, "g1", "f1", "general", &[]).await;
    forum(&coordinator, "g2", "f2", "general", &[]).await;

    assert!(doc(&store, "groups/g1/forum_names/general").await.is_some());
    assert!(doc(&store, "groups/g2/forum_names/general").await.is_some());
    assert_eq!(
        coordinator
            .lookup_name(NamedKind::Forum, &["g2"], "general")
            .await
            .unwrap(),
        Some("f2".to_string())
    );
}

#[tokio::test]
async fn create_includes_initial_children() {
    let (store, coordinator) = setup();
    coordinator
        .create_named(
            NewNamedEntity::new(NamedKind::Group, "dogs")
                .with_id("g1")
                .with_child(EntityKind::Member, "u1", Document::new().with("role", "owner")),
        )
        .await
        .unwrap();
    let member = doc(&store, "groups/g1/members/u1").await.unwrap();
    assert_eq!(member.get_str("role"), Some("owner"));
    assert_eq!(store.commit_count(), 1);
}

#[tokio::test]
async fn children_must_nest_directly() {
    let (_store, coordinator) = setup();
    let err = coordinator
        .create_named(
            NewNamedEntity::new(NamedKind::Group, "dogs")
                .with_id("g1")
                .with_child(EntityKind::Message, "m1", Document::new()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoordError::InvalidRequest(_)));
}

#[tokio::test]
async fn users_carry_no_tags() {
    let (_store, coordinator) = setup();
    let err = coordinator
        .create_named(
            NewNamedEntity::new(NamedKind::User, "ada")
                .with_id("u1")
                .with_tags(["x"]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoordError::InvalidRequest(_)));

    coordinator
        .create_named(NewNamedEntity::new(NamedKind::User, "ada").with_id("u1"))
        .await
        .unwrap();
    let err = coordinator
        .update_tags(NamedKind::User, &[], "u1", &["x"], &[])
        .await
        .unwrap_err();
    assert!(matches!(err, CoordError::InvalidRequest(_)));
}

#[tokio::test]
async fn too_many_tags_are_rejected() {
    let config = CoordinatorConfig {
        max_tags: 2,
        ..Default::default()
    };
    let (_store, coordinator) = setup_with(InMemoryDocumentStore::new(), config);
    let err = coordinator
        .create_named(
            NewNamedEntity::new(NamedKind::Group, "dogs")
                .with_id("g1")
                .with_tags(["a", "b", "c"]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoordError::InvalidRequest(_)));
}

#[tokio::test]
async fn create_too_large_for_one_batch_is_rejected() {
    let (store, coordinator) = setup_with(
        InMemoryDocumentStore::with_max_batch_ops(3),
        CoordinatorConfig::default(),
    );
    let err = coordinator
        .create_named(
            NewNamedEntity::new(NamedKind::Group, "dogs")
                .with_id("g1")
                .with_tags(["a", "b", "c"]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoordError::InvalidRequest(_)));
    assert!(err.is_client_error());
    assert!(store.is_empty().unwrap());
}

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tag_index_follows_tag_updates() {
    let (store, coordinator) = setup();
    group(&coordinator, "g1", "dogs", &["huskies"]).await;
    group(&coordinator, "g2", "cats", &["huskies", "pets"]).await;
    assert_eq!(
        members(&store, "group_tags/huskies").await,
        set(&["dogs", "cats"])
    );

    let tags = coordinator
        .update_tags(NamedKind::Group, &[], "g1", &["pets"], &["huskies"])
        .await
        .unwrap();
    assert_eq!(tags, set(&["pets"]));

    assert_eq!(members(&store, "group_tags/huskies").await, set(&["cats"]));
    assert_eq!(members(&store, "group_tags/pets").await, set(&["cats", "dogs"]));
    let entity = doc(&store, "groups/g1").await.unwrap();
    assert_eq!(entity.string_set(TAGS_FIELD), set(&["pets"]));
}

#[tokio::test]
async fn retagging_moves_the_entity_between_indexes() {
    let (store, coordinator) = setup();
    group(&coordinator, "g1", "pack", &["dogs"]).await;
    coordinator
        .update_tags(NamedKind::Group, &[], "g1", &["huskies"], &[])
        .await
        .unwrap();
    coordinator
        .update_tags(NamedKind::Group, &[], "g1", &[], &["dogs"])
        .await
        .unwrap();

    assert!(!members(&store, "group_tags/dogs").await.contains("pack"));
    assert!(members(&store, "group_tags/huskies").await.contains("pack"));
}

#[tokio::test]
async fn tag_update_creates_missing_index_entries() {
    let (store, coordinator) = setup();
    group(&coordinator, "g1", "dogs", &[]).await;
    coordinator
        .update_tags(NamedKind::Group, &[], "g1", &["sled"], &[])
        .await
        .unwrap();
    assert_eq!(members(&store, "group_tags/sled").await, set(&["dogs"]));
}

#[tokio::test]
async fn tag_update_without_changes_commits_nothing() {
    let (store, coordinator) = setup();
    group(&coordinator, "g1", "dogs", &["huskies"]).await;
    let tags = coordinator
        .update_tags(NamedKind::Group, &[], "g1", &["huskies"], &["absent"])
        .await
        .unwrap();
    assert_eq!(tags, set(&["huskies"]));
    assert_eq!(store.commit_count(), 1);
}

#[tokio::test]
async fn tag_both_added_and_removed_is_rejected() {
    let (_store, coordinator) = setup();
    group(&coordinator, "g1", "dogs", &[]).await;
    let err = coordinator
        .update_tags(NamedKind::Group, &[], "g1", &["a"], &["a"])
        .await
        .unwrap_err();
    assert!(matches!(err, CoordError::InvalidRequest(_)));
}

#[tokio::test]
async fn tag_update_of_missing_entity() {
    let (_store, coordinator) = setup();
    let err = coordinator
        .update_tags(NamedKind::Group, &[], "g1", &["a"], &[])
        .await
        .unwrap_err();
    assert_eq!(err, CoordError::NotFound { key: key("groups/g1") });
}

#[tokio::test]
async fn tag_update_too_large_for_one_batch_is_rejected() {
    let (store, coordinator) = setup_with(
        InMemoryDocumentStore::with_max_batch_ops(3),
        CoordinatorConfig::default(),
    );
    group(&coordinator, "g1", "dogs", &[]).await;
    let before = store.dump().unwrap();

    let err = coordinator
        .update_tags(NamedKind::Group, &[], "g1", &["a", "b", "c"], &[])
        .await
        .unwrap_err();
    assert!(matches!(err, CoordError::InvalidRequest(_)));
    assert!(err.is_client_error());
    assert_eq!(store.dump().unwrap(), before);
}

// ---------------------------------------------------------------------------
// Rename
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rename_swaps_registry_and_indexes() {
    let (store, coordinator) = setup();
    group(&coordinator, "g1", "dogs", &["pets"]).await;
    group(&coordinator, "g2", "cats", &["pets"]).await;

    coordinator
        .rename(NamedKind::Group, &[], "g1", "wolves")
        .await
        .unwrap();

    assert!(doc(&store, "group_names/dogs").await.is_none());
    let entry = doc(&store, "group_names/wolves").await.unwrap();
    assert_eq!(entry.get_str(REGISTRY_ID_FIELD), Some("g1"));
    assert_eq!(
        doc(&store, "groups/g1").await.unwrap().get_str("name"),
        Some("wolves")
    );
    assert_eq!(members(&store, "group_tags/pets").await, set(&["cats", "wolves"]));
}

#[tokio::test]
async fn rename_to_a_taken_name_changes_nothing() {
    let (store, coordinator) = setup();
    group(&coordinator, "g1", "dogs", &[]).await;
    group(&coordinator, "g2", "cats", &[]).await;

    let err = coordinator
        .rename(NamedKind::Group, &[], "g1", "cats")
        .await
        .unwrap_err();
    assert_eq!(err, CoordError::NameAlreadyInUse { name: "cats".into() });
    assert_eq!(
        doc(&store, "group_names/dogs").await.unwrap().get_str(REGISTRY_ID_FIELD),
        Some("g1")
    );
    assert_eq!(
        doc(&store, "group_names/cats").await.unwrap().get_str(REGISTRY_ID_FIELD),
        Some("g2")
    );
}

#[tokio::test]
async fn rename_to_current_name_is_a_no_op() {
    let (store, coordinator) = setup();
    group(&coordinator, "g1", "dogs", &[]).await;
    coordinator
        .rename(NamedKind::Group, &[], "g1", "dogs")
        .await
        .unwrap();
    assert_eq!(store.commit_count(), 1);
}

#[tokio::test]
async fn released_names_can_be_claimed_again() {
    let (_store, coordinator) = setup();
    group(&coordinator, "g1", "dogs", &[]).await;
    coordinator
        .rename(NamedKind::Group, &[], "g1", "wolves")
        .await
        .unwrap();
    group(&coordinator, "g2", "dogs", &[]).await;
    assert_eq!(
        coordinator
            .lookup_name(NamedKind::Group, &[], "dogs")
            .await
            .unwrap(),
        Some("g2".to_string())
    );
}

// ---------------------------------------------------------------------------
// Cascading delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_removes_the_whole_subtree() {
    let (store, coordinator) = setup();
    group(&coordinator, "g1", "dogs", &["huskies"]).await;
    group(&coordinator, "g2", "cats", &["huskies"]).await;
    forum(&coordinator, "g1", "f1", "general", &["news"]).await;
    seed(
        &store,
        &[
            "groups/g1/forums/f1/messages/m1",
            "groups/g1/forums/f1/messages/m2",
        ],
    )
    .await;

    let report = coordinator
        .delete_subtree(EntityKind::Group, &["g1"])
        .await
        .unwrap();
    assert_eq!(report.documents_deleted, 6);
    assert_eq!(report.batches, 1);
    assert!(report.registry_released);
    assert_eq!(report.tag_indexes_updated, 1);

    let g1 = key("groups/g1");
    assert!(store.keys().unwrap().iter().all(|k| !k.starts_with(&g1)));
    assert!(doc(&store, "group_names/dogs").await.is_none());
    assert_eq!(members(&store, "group_tags/huskies").await, set(&["cats"]));
    assert!(doc(&store, "groups/g2").await.is_some());
}

#[tokio::test]
async fn plan_orders_deepest_first() {
    let (store, coordinator) = setup();
    group(&coordinator, "g1", "dogs", &[]).await;
    forum(&coordinator, "g1", "f1", "general", &[]).await;
    seed(&store, &["groups/g1/forums/f1/messages/m1"]).await;

    let plan = coordinator
        .plan_delete(EntityKind::Group, &["g1"])
        .await
        .unwrap();
    assert_eq!(plan.descendants[0], key("groups/g1/forums/f1/messages/m1"));
    let depths: Vec<usize> = plan.descendants.iter().map(PathKey::len).collect();
    assert!(depths.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(plan.name.as_deref(), Some("dogs"));
    assert_eq!(plan.registry_entry, Some(key("group_names/dogs")));
    assert_eq!(store.commit_count(), 3);
}

#[tokio::test]
async fn delete_reaches_documents_under_missing_parents() {
    let (store, coordinator) = setup();
    group(&coordinator, "g1", "dogs", &[]).await;
    seed(&store, &["groups/g1/forums/ghost/messages/m1"]).await;

    coordinator
        .delete_subtree(EntityKind::Group, &["g1"])
        .await
        .unwrap();
    assert!(store.is_empty().unwrap());
}

#[tokio::test]
async fn delete_of_unnamed_kind_with_composite_ids() {
    let (store, coordinator) = setup();
    let meal = composite_id("2024-05-01", "breakfast").unwrap();
    let meal_key = format!("users/u1/pets/p1/meals/{meal}");
    seed(
        &store,
        &[
            "users/u1",
            "users/u1/pets/p1",
            meal_key.as_str(),
            "users/u1/pets/p1/medications/med1/doses/d1",
        ],
    )
    .await;

    let report = coordinator
        .delete_subtree(EntityKind::Pet, &["u1", "p1"])
        .await
        .unwrap();
    assert_eq!(report.documents_deleted, 4);
    assert!(!report.registry_released);
    assert_eq!(store.keys().unwrap(), vec![key("users/u1")]);
}

#[tokio::test]
async fn delete_of_missing_root() {
    let (_store, coordinator) = setup();
    let err = coordinator
        .delete_subtree(EntityKind::Group, &["g1"])
        .await
        .unwrap_err();
    assert_eq!(err, CoordError::NotFound { key: key("groups/g1") });
}

#[tokio::test]
async fn delete_keeps_a_registry_entry_owned_by_someone_else() {
    let (store, coordinator) = setup();
    group(&coordinator, "g1", "dogs", &[]).await;
    let mut batch = store.new_batch();
    batch
        .set(key("group_names/dogs"), Document::new().with(REGISTRY_ID_FIELD, "g9"))
        .unwrap();
    store.commit(batch).await.unwrap();

    let report = coordinator
        .delete_subtree(EntityKind::Group, &["g1"])
        .await
        .unwrap();
    assert!(!report.registry_released);
    assert_eq!(
        doc(&store, "group_names/dogs").await.unwrap().get_str(REGISTRY_ID_FIELD),
        Some("g9")
    );
}

#[tokio::test]
async fn oversized_subtree_is_rejected_by_default() {
    let (store, coordinator) = setup_with(
        InMemoryDocumentStore::with_max_batch_ops(4),
        CoordinatorConfig::default(),
    );
    group(&coordinator, "g1", "dogs", &[]).await;
    seed(
        &store,
        &[
            "groups/g1/members/u1",
            "groups/g1/members/u2",
            "groups/g1/members/u3",
            "groups/g1/members/u4",
            "groups/g1/members/u5",
        ],
    )
    .await;
    let before = store.len().unwrap();

    let err = coordinator
        .delete_subtree(EntityKind::Group, &["g1"])
        .await
        .unwrap_err();
    assert_eq!(
        err,
        CoordError::SubtreeTooLarge {
            root: key("groups/g1"),
            ops: 7,
            limit: 4,
        }
    );
    assert_eq!(store.len().unwrap(), before);
}

#[tokio::test]
async fn oversized_subtree_is_chunked_when_configured() {
    let (store, coordinator) = setup_with(
        InMemoryDocumentStore::with_max_batch_ops(4),
        CoordinatorConfig::chunked(),
    );
    group(&coordinator, "g1", "dogs", &[]).await;
    seed(
        &store,
        &[
            "groups/g1/members/u1",
            "groups/g1/members/u2",
            "groups/g1/members/u3",
            "groups/g1/members/u4",
            "groups/g1/members/u5",
        ],
    )
    .await;

    let report = coordinator
        .delete_subtree(EntityKind::Group, &["g1"])
        .await
        .unwrap();
    assert_eq!(report.batches, 3);
    assert_eq!(report.documents_deleted, 6);
    assert!(store.is_empty().unwrap());
}

#[tokio::test]
async fn interrupted_chunked_delete_keeps_the_root_and_resumes() {
    let inner = Arc::new(InMemoryDocumentStore::with_max_batch_ops(4));
    let seeder = Coordinator::new(inner.clone(), CoordinatorConfig::default());
    group(&seeder, "g1", "dogs", &["huskies"]).await;
    seed(
        &inner,
        &[
            "groups/g1/members/u1",
            "groups/g1/members/u2",
            "groups/g1/members/u3",
            "groups/g1/members/u4",
            "groups/g1/members/u5",
        ],
    )
    .await;
    let store = InterleavedStore::new(inner.clone()).failing_commit(1);
    let coordinator = Coordinator::new(Arc::new(store), CoordinatorConfig::chunked());

    let err = coordinator
        .delete_subtree(EntityKind::Group, &["g1"])
        .await
        .unwrap_err();
    assert!(matches!(err, CoordError::StoreCommitFailed(_)));
    assert!(doc(&inner, "groups/g1").await.is_some());
    assert!(doc(&inner, "group_names/dogs").await.is_some());
    assert_eq!(members(&inner, "group_tags/huskies").await, set(&["dogs"]));
    let left = inner
        .keys()
        .unwrap()
        .into_iter()
        .filter(|k| k.to_string().starts_with("groups/g1/members/"))
        .count();
    assert_eq!(left, 1);

    let report = coordinator
        .delete_subtree(EntityKind::Group, &["g1"])
        .await
        .unwrap();
    assert_eq!(report.batches, 1);
    assert!(doc(&inner, "groups/g1").await.is_none());
    assert!(doc(&inner, "group_names/dogs").await.is_none());
    assert!(members(&inner, "group_tags/huskies").await.is_empty());
}

// ---------------------------------------------------------------------------
// Atomicity
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_delete_commit_leaves_everything_in_place() {
    let (store, coordinator) = setup();
    group(&coordinator, "g1", "dogs", &["huskies"]).await;
    forum(&coordinator, "g1", "f1", "general", &[]).await;
    let before = store.dump().unwrap();

    store.fail_next_commit();
    let err = coordinator
        .delete_subtree(EntityKind::Group, &["g1"])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoordError::StoreCommitFailed(StoreError::Unavailable(_))
    ));
    assert_eq!(store.dump().unwrap(), before);
}

#[tokio::test]
async fn failed_create_commit_claims_no_name() {
    let (store, coordinator) = setup();
    store.fail_next_commit();
    let err = coordinator
        .create_named(
            NewNamedEntity::new(NamedKind::Group, "dogs")
                .with_id("g1")
                .with_tags(["huskies"]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoordError::StoreCommitFailed(_)));
    assert!(store.is_empty().unwrap());

    group(&coordinator, "g1", "dogs", &[]).await;
}

#[tokio::test]
async fn failed_rename_commit_keeps_the_old_name() {
    let (store, coordinator) = setup();
    group(&coordinator, "g1", "dogs", &[]).await;
    store.fail_next_commit();
    assert!(coordinator
        .rename(NamedKind::Group, &[], "g1", "wolves")
        .await
        .is_err());
    assert!(doc(&store, "group_names/dogs").await.is_some());
    assert!(doc(&store, "group_names/wolves").await.is_none());
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_claim_a_name_once() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let coordinator = Arc::new(Coordinator::new(store.clone(), CoordinatorConfig::default()));

    let mut tasks = Vec::new();
    for i in 0..8 {
        let coordinator = Arc::clone(&coordinator);
        tasks.push(tokio::spawn(async move {
            coordinator
                .create_named(NewNamedEntity::new(NamedKind::Group, "dogs").with_id(format!("g{i}")))
                .await
        }));
    }

    let mut winners = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => winners += 1,
            Err(err) => assert_eq!(err, CoordError::NameAlreadyInUse { name: "dogs".into() }),
        }
    }
    assert_eq!(winners, 1);
    let groups = store
        .keys()
        .unwrap()
        .into_iter()
        .filter(|k| k.collection_name() == "groups")
        .count();
    assert_eq!(groups, 1);
}

#[tokio::test]
async fn lost_tag_index_race_on_create_is_a_failed_commit() {
    let (inner, seeder) = setup();
    group(&seeder, "g1", "dogs", &["huskies"]).await;
    let before = inner.dump().unwrap();
    let store = InterleavedStore::new(inner.clone()).hiding_tag_entries();
    let coordinator = Coordinator::new(Arc::new(store), CoordinatorConfig::default());

    let err = coordinator
        .create_named(
            NewNamedEntity::new(NamedKind::Group, "wolves")
                .with_id("g2")
                .with_tags(["huskies"]),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        CoordError::StoreCommitFailed(StoreError::AlreadyExists(key("group_tags/huskies")))
    );
    assert!(!err.is_client_error());
    assert_eq!(inner.dump().unwrap(), before);

    group(&seeder, "g2", "wolves", &["huskies"]).await;
    assert_eq!(
        members(&inner, "group_tags/huskies").await,
        set(&["dogs", "wolves"])
    );
}

#[tokio::test]
async fn lost_tag_index_race_on_rename_is_a_failed_commit() {
    let (inner, seeder) = setup();
    group(&seeder, "g1", "dogs", &["huskies"]).await;
    let before = inner.dump().unwrap();
    let store = InterleavedStore::new(inner.clone()).hiding_tag_entries();
    let coordinator = Coordinator::new(Arc::new(store), CoordinatorConfig::default());

    let err = coordinator
        .rename(NamedKind::Group, &[], "g1", "wolves")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        CoordError::StoreCommitFailed(StoreError::AlreadyExists(key("group_tags/huskies")))
    );
    assert_eq!(inner.dump().unwrap(), before);

    seeder
        .rename(NamedKind::Group, &[], "g1", "wolves")
        .await
        .unwrap();
    assert_eq!(members(&inner, "group_tags/huskies").await, set(&["wolves"]));
}
