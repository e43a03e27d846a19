//! Entity kinds that own a unique human-chosen name.

use std::fmt;

use burrow_paths::EntityKind;
use serde::{Deserialize, Serialize};

/// Registry entry field holding the owning entity's identifier.
pub const REGISTRY_ID_FIELD: &str = "id";

/// Entity field mirroring the entity's tag-index memberships.
pub const TAGS_FIELD: &str = "tags";

/// Tag-index field holding the names of the entities carrying the tag.
pub const TAG_MEMBERS_FIELD: &str = "names";

/// A kind whose name must be unique within its scope.
///
/// Scope is given by the identifiers of the enclosing documents: groups and
/// users are unique globally, forums within their group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedKind {
    Group,
    Forum,
    User,
}

impl NamedKind {
    pub const ALL: [NamedKind; 3] = [NamedKind::Group, NamedKind::Forum, NamedKind::User];

    /// Kind of the entity document itself.
    pub fn entity_kind(self) -> EntityKind {
        match self {
            NamedKind::Group => EntityKind::Group,
            NamedKind::Forum => EntityKind::Forum,
            NamedKind::User => EntityKind::User,
        }
    }

    /// Kind of the name registry entries.
    pub fn registry_kind(self) -> EntityKind {
        match self {
            NamedKind::Group => EntityKind::GroupName,
            NamedKind::Forum => EntityKind::ForumName,
            NamedKind::User => EntityKind::UsedName,
        }
    }

    /// Kind of the tag-index entries, for tagged kinds.
    pub fn tag_index_kind(self) -> Option<EntityKind> {
        match self {
            NamedKind::Group => Some(EntityKind::GroupTag),
            NamedKind::Forum => Some(EntityKind::ForumTag),
            NamedKind::User => None,
        }
    }

    /// Entity field holding the unique name.
    pub fn name_field(self) -> &'static str {
        match self {
            NamedKind::Group | NamedKind::Forum => "name",
            NamedKind::User => "username",
        }
    }

    /// Number of enclosing identifiers that scope the name.
    pub fn scope_len(self) -> usize {
        self.entity_kind().arity() - 1
    }

    /// The named kind stored as `kind`, if any.
    pub fn from_entity_kind(kind: EntityKind) -> Option<NamedKind> {
        NamedKind::ALL
            .into_iter()
            .find(|named| named.entity_kind() == kind)
    }
}

impl fmt::Display for NamedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.entity_kind().fmt(f)
    }
}
