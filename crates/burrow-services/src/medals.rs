use std::sync::Arc;

use burrow_coord::Coordinator;
use burrow_paths::EntityKind;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::access;
use crate::error::ServiceResult;
use crate::model::{to_document, Award, Medal};

/// Medals and the awards that grant them to users.
#[derive(Clone)]
pub struct MedalService {
    coordinator: Arc<Coordinator>,
}

impl MedalService {
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        Self { coordinator }
    }

    pub async fn create_medal(&self, title: &str, description: &str) -> ServiceResult<Medal> {
        let id = Uuid::now_v7().to_string();
        let key = access::key(EntityKind::Medal, &[id.as_str()])?;
        let medal = Medal {
            id: String::new(),
            title: title.to_string(),
            description: description.to_string(),
        };
        access::create(self.coordinator.store().as_ref(), key.clone(), to_document(&key, &medal)?).await?;
        info!(%key, title, "medal created");
        Ok(Medal { id, ..medal })
    }

    /// Award an existing medal to an existing user, once.
    pub async fn award_medal(&self, user: &str, medal: &str) -> ServiceResult<Award> {
        let store = self.coordinator.store().as_ref();
        access::ensure_exists(store, &access::key(EntityKind::User, &[user])?).await?;
        access::ensure_exists(store, &access::key(EntityKind::Medal, &[medal])?).await?;

        let key = access::key(EntityKind::Award, &[user, medal])?;
        let award = Award {
            medal: medal.to_string(),
            awarded_at: Utc::now(),
        };
        access::create(store, key.clone(), to_document(&key, &award)?).await?;
        info!(%user, %medal, "medal awarded");
        Ok(award)
    }

    pub async fn revoke_medal(&self, user: &str, medal: &str) -> ServiceResult<()> {
        let key = access::key(EntityKind::Award, &[user, medal])?;
        access::remove(self.coordinator.store().as_ref(), key).await?;
        info!(%user, %medal, "medal revoked");
        Ok(())
    }

    pub async fn has_medal(&self, user: &str, medal: &str) -> ServiceResult<bool> {
        let key = access::key(EntityKind::Award, &[user, medal])?;
        Ok(self.coordinator.store().exists(&key).await?)
    }
}
