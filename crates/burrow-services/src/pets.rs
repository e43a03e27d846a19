use std::sync::Arc;

use burrow_coord::{Coordinator, DeleteReport};
use burrow_paths::{composite_id, EntityKind, PathKey};
use chrono::{NaiveDate, Utc};
use tracing::info;
use uuid::Uuid;

use crate::access;
use crate::error::ServiceResult;
use crate::model::{to_document, Dose, Meal, Medication, Pet, DAY_FORMAT};

/// Pets and their care records.
#[derive(Clone)]
pub struct PetService {
    coordinator: Arc<Coordinator>,
}

impl PetService {
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        Self { coordinator }
    }

    pub async fn add_pet(&self, user: &str, name: &str, species: &str) -> ServiceResult<Pet> {
        let store = self.coordinator.store().as_ref();
        access::ensure_exists(store, &access::key(EntityKind::User, &[user])?).await?;

        let id = Uuid::now_v7().to_string();
        let key = access::key(EntityKind::Pet, &[user, id.as_str()])?;
        let pet = Pet {
            id: String::new(),
            name: name.to_string(),
            species: species.to_string(),
            added_at: Utc::now(),
        };
        access::create(store, key.clone(), to_document(&key, &pet)?).await?;
        info!(%key, "pet added");
        Ok(Pet { id, ..pet })
    }

    pub async fn get_pet(&self, user: &str, pet: &str) -> ServiceResult<Pet> {
        let key = access::key(EntityKind::Pet, &[user, pet])?;
        let record: Pet = access::require(self.coordinator.store().as_ref(), &key).await?;
        Ok(Pet {
            id: pet.to_string(),
            ..record
        })
    }

    /// Record a meal. A pet has at most one meal per day and label.
    pub async fn log_meal(
        &self,
        user: &str,
        pet: &str,
        day: NaiveDate,
        label: &str,
        notes: Option<&str>,
    ) -> ServiceResult<Meal> {
        let store = self.coordinator.store().as_ref();
        access::ensure_exists(store, &access::key(EntityKind::Pet, &[user, pet])?).await?;

        let key = meal_key(user, pet, day, label)?;
        let meal = Meal {
            day,
            label: label.to_string(),
            notes: notes.map(str::to_string),
            logged_at: Utc::now(),
        };
        access::create(store, key.clone(), to_document(&key, &meal)?).await?;
        info!(%key, "meal logged");
        Ok(meal)
    }

    pub async fn get_meal(
        &self,
        user: &str,
        pet: &str,
        day: NaiveDate,
        label: &str,
    ) -> ServiceResult<Option<Meal>> {
        let key = meal_key(user, pet, day, label)?;
        access::read(self.coordinator.store().as_ref(), &key).await
    }

    pub async fn add_medication(
        &self,
        user: &str,
        pet: &str,
        name: &str,
        dosage: &str,
    ) -> ServiceResult<Medication> {
        let store = self.coordinator.store().as_ref();
        access::ensure_exists(store, &access::key(EntityKind::Pet, &[user, pet])?).await?;

        let id = Uuid::now_v7().to_string();
        let key = access::key(EntityKind::Medication, &[user, pet, id.as_str()])?;
        let medication = Medication {
            id: String::new(),
            name: name.to_string(),
            dosage: dosage.to_string(),
            started_at: Utc::now(),
        };
        access::create(store, key.clone(), to_document(&key, &medication)?).await?;
        info!(%key, "medication added");
        Ok(Medication { id, ..medication })
    }

    /// Record a dose of an existing medication.
    pub async fn record_dose(
        &self,
        user: &str,
        pet: &str,
        medication: &str,
        amount: &str,
    ) -> ServiceResult<Dose> {
        let store = self.coordinator.store().as_ref();
        access::ensure_exists(
            store,
            &access::key(EntityKind::Medication, &[user, pet, medication])?,
        )
        .await?;

        let id = Uuid::now_v7().to_string();
        let key = access::key(EntityKind::Dose, &[user, pet, medication, id.as_str()])?;
        let dose = Dose {
            id: String::new(),
            amount: amount.to_string(),
            given_at: Utc::now(),
        };
        access::create(store, key.clone(), to_document(&key, &dose)?).await?;
        Ok(Dose { id, ..dose })
    }

    /// Delete a pet with its meals, medications and doses.
    pub async fn delete_pet(&self, user: &str, pet: &str) -> ServiceResult<DeleteReport> {
        Ok(self
            .coordinator
            .delete_subtree(EntityKind::Pet, &[user, pet])
            .await?)
    }
}

fn meal_key(user: &str, pet: &str, day: NaiveDate, label: &str) -> ServiceResult<PathKey> {
    let day = day.format(DAY_FORMAT).to_string();
    let id = composite_id(&day, label)?;
    access::key(EntityKind::Meal, &[user, pet, id.as_str()])
}
