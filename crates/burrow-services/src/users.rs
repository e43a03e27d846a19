use std::sync::Arc;

use burrow_coord::{Coordinator, DeleteReport, NamedKind, NewNamedEntity};
use burrow_paths::EntityKind;
use chrono::Utc;
use tracing::info;

use crate::access;
use crate::error::ServiceResult;
use crate::model::{to_document, User};

/// User accounts. The uid comes from the authentication provider; usernames
/// are unique.
#[derive(Clone)]
pub struct UserService {
    coordinator: Arc<Coordinator>,
}

impl UserService {
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        Self { coordinator }
    }

    pub async fn create_user(&self, uid: &str, username: &str, display_name: &str) -> ServiceResult<User> {
        let key = access::key(EntityKind::User, &[uid])?;
        let user = User {
            id: uid.to_string(),
            username: username.to_string(),
            display_name: display_name.to_string(),
            created_at: Utc::now(),
        };
        self.coordinator
            .create_named(
                NewNamedEntity::new(NamedKind::User, username)
                    .with_id(uid)
                    .with_fields(to_document(&key, &user)?),
            )
            .await?;
        info!(%uid, username, "user created");
        Ok(user)
    }

    pub async fn get_user(&self, uid: &str) -> ServiceResult<User> {
        let key = access::key(EntityKind::User, &[uid])?;
        let record: User = access::require(self.coordinator.store().as_ref(), &key).await?;
        Ok(User {
            id: uid.to_string(),
            ..record
        })
    }

    pub async fn find_user(&self, username: &str) -> ServiceResult<Option<User>> {
        match self
            .coordinator
            .lookup_name(NamedKind::User, &[], username)
            .await?
        {
            Some(uid) => Ok(Some(self.get_user(&uid).await?)),
            None => Ok(None),
        }
    }

    pub async fn change_username(&self, uid: &str, new_username: &str) -> ServiceResult<()> {
        self.coordinator
            .rename(NamedKind::User, &[], uid, new_username)
            .await?;
        Ok(())
    }

    /// Delete a user with their pets and awards, and release the username.
    ///
    /// Memberships live under groups and are left to the group owners.
    pub async fn delete_user(&self, uid: &str) -> ServiceResult<DeleteReport> {
        Ok(self
            .coordinator
            .delete_subtree(EntityKind::User, &[uid])
            .await?)
    }
}
