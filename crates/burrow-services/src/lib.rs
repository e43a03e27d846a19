//! Entity services for Burrow.
//!
//! Thin domain operations over the [`burrow_coord::Coordinator`]. Anything
//! touching a unique name, a tag or a subtree goes through the coordinator;
//! single-document writes go straight to the store.
//!
//! [`Burrow`] is the main entry point for applications embedding Burrow.

mod access;
pub mod client;
pub mod error;
pub mod forums;
pub mod groups;
pub mod medals;
pub mod model;
pub mod pets;
pub mod users;

pub use client::Burrow;
pub use error::{ServiceError, ServiceResult};
pub use forums::ForumService;
pub use groups::GroupService;
pub use medals::MedalService;
pub use model::{Award, Dose, Forum, Group, Meal, Medal, Medication, Member, Message, Pet, Role, User};
pub use pets::PetService;
pub use users::UserService;

// Re-export key types
pub use burrow_coord::{CoordinatorConfig, DeleteReport, OversizePolicy};
pub use burrow_paths::{EntityKind, PathKey};
