//! Multi-document consistency for Burrow.
//!
//! The document store guarantees atomicity only within one bounded batch.
//! The [`Coordinator`] builds every logical operation that must keep several
//! documents in step into exactly one such batch:
//!
//! - [`Coordinator::create_named`] -- entity, name registry entry, tag-index
//!   memberships and initial children
//! - [`Coordinator::rename`] -- registry swap plus tag-index rewrite
//! - [`Coordinator::update_tags`] -- entity tag field plus index entries
//! - [`Coordinator::delete_subtree`] -- the whole subtree, deepest first,
//!   plus registry release and tag-index cleanup
//!
//! # Design Rules
//!
//! 1. Validation reads happen before staging; the commit happens once.
//! 2. Registry entries are written with conditional `create`, so two writers
//!    racing for one name cannot both succeed. The loser sees
//!    [`CoordError::NameAlreadyInUse`].
//! 3. A registry entry is only released by the entity it names.
//! 4. Subtrees larger than one batch are rejected unless
//!    [`OversizePolicy::Chunked`] is configured; chunked deletes give up
//!    whole-operation atomicity and always commit the root last.
//! 5. Between the validation reads and the commit, concurrent writers may
//!    add descendants that a delete will not see. Such stragglers stay
//!    reachable under their full key and are removed by a repeated delete.

pub mod cascade;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod named;
pub mod registry;
pub mod tags;

pub use cascade::{DeletePlan, DeleteReport};
pub use config::{CoordinatorConfig, OversizePolicy};
pub use coordinator::{ChildDocument, Coordinator, NewNamedEntity};
pub use error::{CoordError, CoordResult};
pub use named::{NamedKind, REGISTRY_ID_FIELD, TAGS_FIELD, TAG_MEMBERS_FIELD};

#[cfg(test)]
mod scenarios;
