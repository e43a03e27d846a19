use std::collections::BTreeSet;
use std::sync::Arc;

use burrow_coord::{Coordinator, DeleteReport, NamedKind, NewNamedEntity};
use burrow_paths::EntityKind;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::access;
use crate::error::{ServiceError, ServiceResult};
use crate::model::{to_document, Group, Member, Role};

/// Groups and their memberships.
#[derive(Clone)]
pub struct GroupService {
    coordinator: Arc<Coordinator>,
}

impl GroupService {
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        Self { coordinator }
    }

    /// Create a group owned by an existing user, who becomes its first
    /// member.
    pub async fn create_group(
        &self,
        owner: &str,
        name: &str,
        description: &str,
        tags: &[&str],
    ) -> ServiceResult<Group> {
        let store = self.coordinator.store().as_ref();
        access::ensure_exists(store, &access::key(EntityKind::User, &[owner])?).await?;

        let now = Utc::now();
        let group = Group {
            id: String::new(),
            name: name.to_string(),
            description: description.to_string(),
            owner: owner.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: now,
        };
        let membership = Member {
            user: owner.to_string(),
            role: Role::Owner,
            joined_at: now,
        };
        let id = Uuid::now_v7().to_string();
        let group_key = access::key(EntityKind::Group, &[id.as_str()])?;
        let member_key = access::key(EntityKind::Member, &[id.as_str(), owner])?;

        self.coordinator
            .create_named(
                NewNamedEntity::new(NamedKind::Group, name)
                    .with_id(id.as_str())
                    .with_fields(to_document(&group_key, &group)?)
                    .with_tags(tags.iter().copied())
                    .with_child(EntityKind::Member, owner, to_document(&member_key, &membership)?),
            )
            .await?;
        info!(group = %id, %owner, name, "group created");
        Ok(Group { id, ..group })
    }

    pub async fn get_group(&self, group: &str) -> ServiceResult<Group> {
        let key = access::key(EntityKind::Group, &[group])?;
        let record: Group = access::require(self.coordinator.store().as_ref(), &key).await?;
        Ok(Group {
            id: group.to_string(),
            ..record
        })
    }

    /// Look a group up by its unique name.
    pub async fn find_group(&self, name: &str) -> ServiceResult<Option<Group>> {
        match self
            .coordinator
            .lookup_name(NamedKind::Group, &[], name)
            .await?
        {
            Some(id) => Ok(Some(self.get_group(&id).await?)),
            None => Ok(None),
        }
    }

    pub async fn rename_group(&self, group: &str, new_name: &str) -> ServiceResult<()> {
        self.coordinator
            .rename(NamedKind::Group, &[], group, new_name)
            .await?;
        Ok(())
    }

    pub async fn update_group_tags(
        &self,
        group: &str,
        add: &[&str],
        remove: &[&str],
    ) -> ServiceResult<BTreeSet<String>> {
        Ok(self
            .coordinator
            .update_tags(NamedKind::Group, &[], group, add, remove)
            .await?)
    }

    /// Add an existing user to an existing group.
    pub async fn join_group(&self, group: &str, user: &str) -> ServiceResult<Member> {
        let store = self.coordinator.store().as_ref();
        access::ensure_exists(store, &access::key(EntityKind::Group, &[group])?).await?;
        access::ensure_exists(store, &access::key(EntityKind::User, &[user])?).await?;

        let member = Member {
            user: user.to_string(),
            role: Role::Member,
            joined_at: Utc::now(),
        };
        let key = access::key(EntityKind::Member, &[group, user])?;
        access::create(store, key.clone(), to_document(&key, &member)?).await?;
        info!(%group, %user, "joined group");
        Ok(member)
    }

    /// Remove a member. The owner cannot leave; delete the group instead.
    pub async fn leave_group(&self, group: &str, user: &str) -> ServiceResult<()> {
        let store = self.coordinator.store().as_ref();
        let key = access::key(EntityKind::Member, &[group, user])?;
        let member: Member = access::require(store, &key).await?;
        if member.role == Role::Owner {
            return Err(ServiceError::InvalidOperation(format!(
                "{user} owns {group} and cannot leave it"
            )));
        }
        access::remove(store, key).await?;
        info!(%group, %user, "left group");
        Ok(())
    }

    pub async fn get_member(&self, group: &str, user: &str) -> ServiceResult<Option<Member>> {
        let key = access::key(EntityKind::Member, &[group, user])?;
        let member: Option<Member> = access::read(self.coordinator.store().as_ref(), &key).await?;
        Ok(member.map(|m| Member {
            user: user.to_string(),
            ..m
        }))
    }

    /// Delete a group with its members, forums and messages, and release its
    /// name and tags.
    pub async fn delete_group(&self, group: &str) -> ServiceResult<DeleteReport> {
        Ok(self
            .coordinator
            .delete_subtree(EntityKind::Group, &[group])
            .await?)
    }
}
