//! Typed views of the stored documents.
//!
//! Each record serializes to exactly the fields of its document. The
//! identifier is part of the key, not the document, so it is skipped by
//! serde and filled in on read.

use std::collections::BTreeSet;

use burrow_paths::PathKey;
use burrow_store::Document;
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};

/// Date format of the day half of a meal identifier.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    #[serde(skip)]
    pub id: String,
    pub name: String,
    pub description: String,
    pub owner: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Member,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    #[serde(skip)]
    pub user: String,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forum {
    #[serde(skip)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(skip)]
    pub id: String,
    pub author: String,
    pub body: String,
    pub posted_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(skip)]
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    #[serde(skip)]
    pub id: String,
    pub name: String,
    pub species: String,
    pub added_at: DateTime<Utc>,
}

/// A meal, keyed by day and label together.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meal {
    pub day: NaiveDate,
    pub label: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub logged_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    #[serde(skip)]
    pub id: String,
    pub name: String,
    pub dosage: String,
    pub started_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dose {
    #[serde(skip)]
    pub id: String,
    pub amount: String,
    pub given_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medal {
    #[serde(skip)]
    pub id: String,
    pub title: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Award {
    #[serde(skip)]
    pub medal: String,
    pub awarded_at: DateTime<Utc>,
}

/// Serialize a record into the document stored at `key`.
pub(crate) fn to_document<T: Serialize>(key: &PathKey, record: &T) -> ServiceResult<Document> {
    let value = serde_json::to_value(record).map_err(|e| ServiceError::Malformed {
        key: key.clone(),
        reason: e.to_string(),
    })?;
    Ok(Document::from_value(value)?)
}

/// Deserialize the document stored at `key`.
pub(crate) fn from_document<T: DeserializeOwned>(key: &PathKey, document: Document) -> ServiceResult<T> {
    serde_json::from_value(document.into_value()).map_err(|e| ServiceError::Malformed {
        key: key.clone(),
        reason: e.to_string(),
    })
}
