use std::collections::BTreeSet;
use std::sync::Arc;

use burrow_coord::{Coordinator, DeleteReport, NamedKind, NewNamedEntity};
use burrow_paths::EntityKind;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::access;
use crate::error::ServiceResult;
use crate::model::{to_document, Forum, Message};

/// Forums within a group, and their messages. Forum names are unique per
/// group.
#[derive(Clone)]
pub struct ForumService {
    coordinator: Arc<Coordinator>,
}

impl ForumService {
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        Self { coordinator }
    }

    pub async fn create_forum(&self, group: &str, name: &str, tags: &[&str]) -> ServiceResult<Forum> {
        let id = Uuid::now_v7().to_string();
        let key = access::key(EntityKind::Forum, &[group, id.as_str()])?;
        let forum = Forum {
            id: String::new(),
            name: name.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: Utc::now(),
        };

        self.coordinator
            .create_named(
                NewNamedEntity::new(NamedKind::Forum, name)
                    .in_scope([group])
                    .with_id(id.as_str())
                    .with_fields(to_document(&key, &forum)?)
                    .with_tags(tags.iter().copied()),
            )
            .await?;
        info!(%group, forum = %id, name, "forum created");
        Ok(Forum { id, ..forum })
    }

    pub async fn get_forum(&self, group: &str, forum: &str) -> ServiceResult<Forum> {
        let key = access::key(EntityKind::Forum, &[group, forum])?;
        let record: Forum = access::require(self.coordinator.store().as_ref(), &key).await?;
        Ok(Forum {
            id: forum.to_string(),
            ..record
        })
    }

    pub async fn rename_forum(&self, group: &str, forum: &str, new_name: &str) -> ServiceResult<()> {
        self.coordinator
            .rename(NamedKind::Forum, &[group], forum, new_name)
            .await?;
        Ok(())
    }

    pub async fn update_forum_tags(
        &self,
        group: &str,
        forum: &str,
        add: &[&str],
        remove: &[&str],
    ) -> ServiceResult<BTreeSet<String>> {
        Ok(self
            .coordinator
            .update_tags(NamedKind::Forum, &[group], forum, add, remove)
            .await?)
    }

    /// Post a message to an existing forum.
    pub async fn post_message(
        &self,
        group: &str,
        forum: &str,
        author: &str,
        body: &str,
    ) -> ServiceResult<Message> {
        let store = self.coordinator.store().as_ref();
        access::ensure_exists(store, &access::key(EntityKind::Forum, &[group, forum])?).await?;

        let id = Uuid::now_v7().to_string();
        let key = access::key(EntityKind::Message, &[group, forum, id.as_str()])?;
        let message = Message {
            id: String::new(),
            author: author.to_string(),
            body: body.to_string(),
            posted_at: Utc::now(),
        };
        access::create(store, key.clone(), to_document(&key, &message)?).await?;
        info!(%key, %author, "message posted");
        Ok(Message { id, ..message })
    }

    pub async fn get_message(&self, group: &str, forum: &str, message: &str) -> ServiceResult<Message> {
        let key = access::key(EntityKind::Message, &[group, forum, message])?;
        let record: Message = access::require(self.coordinator.store().as_ref(), &key).await?;
        Ok(Message {
            id: message.to_string(),
            ..record
        })
    }

    /// Delete a forum with its messages, and release its name and tags.
    pub async fn delete_forum(&self, group: &str, forum: &str) -> ServiceResult<DeleteReport> {
        Ok(self
            .coordinator
            .delete_subtree(EntityKind::Forum, &[group, forum])
            .await?)
    }
}
