//! The closed catalogue of document shapes.
//!
//! Each [`EntityKind`] has a fixed path template: a list of collection names,
//! each followed by one identifier. The number of collections is the kind's
//! arity, the number of identifiers a full document path takes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PathError;

/// A document shape with a fixed nesting depth and path template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// `users/{user}`
    User,
    /// `usernames/{name}`: username registry.
    UsedName,
    /// `groups/{group}`
    Group,
    /// `group_names/{name}`: group name registry.
    GroupName,
    /// `group_tags/{tag}`: tag index over group names.
    GroupTag,
    /// `medals/{medal}`: medal catalogue.
    Medal,
    /// `groups/{group}/members/{user}`
    Member,
    /// `groups/{group}/forums/{forum}`
    Forum,
    /// `groups/{group}/forum_names/{name}`: forum name registry, per group.
    ForumName,
    /// `groups/{group}/forum_tags/{tag}`: tag index over forum names, per group.
    ForumTag,
    /// `users/{user}/pets/{pet}`
    Pet,
    /// `users/{user}/awards/{medal}`
    Award,
    /// `groups/{group}/forums/{forum}/messages/{message}`
    Message,
    /// `users/{user}/pets/{pet}/meals/{day␟label}`. The last identifier is
    /// composite, see [`crate::ident::composite_id`].
    Meal,
    /// `users/{user}/pets/{pet}/medications/{medication}`
    Medication,
    /// `users/{user}/pets/{pet}/medications/{medication}/doses/{dose}`
    Dose,
}

impl EntityKind {
    /// Every kind, roots first.
    pub const ALL: [EntityKind; 16] = [
        EntityKind::User,
        EntityKind::UsedName,
        EntityKind::Group,
        EntityKind::GroupName,
        EntityKind::GroupTag,
        EntityKind::Medal,
        EntityKind::Member,
        EntityKind::Forum,
        EntityKind::ForumName,
        EntityKind::ForumTag,
        EntityKind::Pet,
        EntityKind::Award,
        EntityKind::Message,
        EntityKind::Meal,
        EntityKind::Medication,
        EntityKind::Dose,
    ];

    /// Collection names from the root inwards.
    pub fn collections(self) -> &'static [&'static str] {
        match self {
            EntityKind::User => &["users"],
            EntityKind::UsedName => &["usernames"],
            EntityKind::Group => &["groups"],
            EntityKind::GroupName => &["group_names"],
            EntityKind::GroupTag => &["group_tags"],
            EntityKind::Medal => &["medals"],
            EntityKind::Member => &["groups", "members"],
            EntityKind::Forum => &["groups", "forums"],
            EntityKind::ForumName => &["groups", "forum_names"],
            EntityKind::ForumTag => &["groups", "forum_tags"],
            EntityKind::Pet => &["users", "pets"],
            EntityKind::Award => &["users", "awards"],
            EntityKind::Message => &["groups", "forums", "messages"],
            EntityKind::Meal => &["users", "pets", "meals"],
            EntityKind::Medication => &["users", "pets", "medications"],
            EntityKind::Dose => &["users", "pets", "medications", "doses"],
        }
    }

    /// Placeholder names used when rendering the template.
    fn placeholders(self) -> &'static [&'static str] {
        match self {
            EntityKind::User => &["user"],
            EntityKind::UsedName | EntityKind::GroupName => &["name"],
            EntityKind::Group => &["group"],
            EntityKind::GroupTag => &["tag"],
            EntityKind::Medal => &["medal"],
            EntityKind::Member => &["group", "user"],
            EntityKind::Forum => &["group", "forum"],
            EntityKind::ForumName => &["group", "name"],
            EntityKind::ForumTag => &["group", "tag"],
            EntityKind::Pet => &["user", "pet"],
            EntityKind::Award => &["user", "medal"],
            EntityKind::Message => &["group", "forum", "message"],
            EntityKind::Meal => &["user", "pet", "day\u{241F}label"],
            EntityKind::Medication => &["user", "pet", "medication"],
            EntityKind::Dose => &["user", "pet", "medication", "dose"],
        }
    }

    /// Number of identifiers in a full document path.
    pub fn arity(self) -> usize {
        self.collections().len()
    }

    /// Nesting depth: 0 for documents in a root collection.
    pub fn depth(self) -> usize {
        self.arity() - 1
    }

    /// Whether the innermost identifier is a two-part composite.
    pub fn has_composite_id(self) -> bool {
        matches!(self, EntityKind::Meal)
    }

    /// Stable snake_case name.
    pub fn name(self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::UsedName => "used_name",
            EntityKind::Group => "group",
            EntityKind::GroupName => "group_name",
            EntityKind::GroupTag => "group_tag",
            EntityKind::Medal => "medal",
            EntityKind::Member => "member",
            EntityKind::Forum => "forum",
            EntityKind::ForumName => "forum_name",
            EntityKind::ForumTag => "forum_tag",
            EntityKind::Pet => "pet",
            EntityKind::Award => "award",
            EntityKind::Message => "message",
            EntityKind::Meal => "meal",
            EntityKind::Medication => "medication",
            EntityKind::Dose => "dose",
        }
    }

    /// Human-readable path template, e.g. `groups/{group}/forums/{forum}`.
    pub fn template(self) -> String {
        self.collections()
            .iter()
            .zip(self.placeholders())
            .map(|(collection, placeholder)| format!("{collection}/{{{placeholder}}}"))
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntityKind {
    type Err = PathError;

    /// Accepts `forum_name`, `forum-name`, `ForumName` and `forumname`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.name().replace('_', "") == wanted)
            .ok_or_else(|| PathError::InvalidPath {
                path: s.to_string(),
                reason: "unknown entity kind".into(),
            })
    }
}
