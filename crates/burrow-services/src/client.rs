use std::sync::Arc;

use burrow_coord::{Coordinator, CoordinatorConfig};
use burrow_store::{DocumentStore, InMemoryDocumentStore};

use crate::forums::ForumService;
use crate::groups::GroupService;
use crate::medals::MedalService;
use crate::pets::PetService;
use crate::users::UserService;

/// Entry point bundling every entity service over one coordinator.
#[derive(Clone)]
pub struct Burrow {
    coordinator: Arc<Coordinator>,
}

impl Burrow {
    pub fn new(store: Arc<dyn DocumentStore>, config: CoordinatorConfig) -> Self {
        Self {
            coordinator: Arc::new(Coordinator::new(store, config)),
        }
    }

    /// Services over a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryDocumentStore::new()),
            CoordinatorConfig::default(),
        )
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    pub fn groups(&self) -> GroupService {
        GroupService::new(Arc::clone(&self.coordinator))
    }

    pub fn forums(&self) -> ForumService {
        ForumService::new(Arc::clone(&self.coordinator))
    }

    pub fn users(&self) -> UserService {
        UserService::new(Arc::clone(&self.coordinator))
    }

    pub fn pets(&self) -> PetService {
        PetService::new(Arc::clone(&self.coordinator))
    }

    pub fn medals(&self) -> MedalService {
        MedalService::new(Arc::clone(&self.coordinator))
    }
}
