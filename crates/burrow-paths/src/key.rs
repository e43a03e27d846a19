use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PathError, Result};
use crate::ident::{validate_identifier, validate_segment};

/// Canonical hierarchical address of a document or a collection.
///
/// Segments alternate between collection names and identifiers, starting
/// with a collection. An even segment count addresses a document, an odd
/// count a collection. Ordering is segment-wise, so every descendant of a key
/// sorts directly after it and before the key's next sibling.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PathKey {
    segments: Vec<String>,
}

impl PathKey {
    /// Build from segments already validated by the caller.
    pub(crate) fn from_validated(segments: Vec<String>) -> Self {
        debug_assert!(!segments.is_empty());
        Self { segments }
    }

    /// Parse a `/`-delimited key such as `groups/g1/forums`.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(PathError::InvalidPath {
                path: raw.to_string(),
                reason: "path must not be empty".into(),
            });
        }
        let segments: Vec<String> = raw.split('/').map(str::to_string).collect();
        for segment in &segments {
            validate_segment(segment).map_err(|e| PathError::InvalidPath {
                path: raw.to_string(),
                reason: e.to_string(),
            })?;
        }
        Ok(Self { segments })
    }

    /// The raw segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_document(&self) -> bool {
        self.segments.len() % 2 == 0
    }

    pub fn is_collection(&self) -> bool {
        !self.is_document()
    }

    /// Trailing identifier of a document key; `None` for collections.
    pub fn id(&self) -> Option<&str> {
        if self.is_document() {
            self.segments.last().map(String::as_str)
        } else {
            None
        }
    }

    /// Name of the collection this key is, or lives in.
    pub fn collection_name(&self) -> &str {
        let index = if self.is_document() {
            self.segments.len() - 2
        } else {
            self.segments.len() - 1
        };
        &self.segments[index]
    }

    /// Nesting depth of the document or collection (0 at the root).
    pub fn depth(&self) -> usize {
        (self.segments.len() - 1) / 2
    }

    /// The enclosing key: a document's collection, or a collection's owning
    /// document. `None` for a root collection.
    pub fn parent(&self) -> Option<PathKey> {
        if self.segments.len() <= 1 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Address the document `id` inside this collection.
    pub fn doc(&self, id: &str) -> Result<PathKey> {
        if !self.is_collection() {
            return Err(PathError::InvalidPath {
                path: self.to_string(),
                reason: "documents can only be addressed inside a collection".into(),
            });
        }
        validate_segment(id)?;
        let mut segments = self.segments.clone();
        segments.push(id.to_string());
        Ok(Self { segments })
    }

    /// Address the subcollection `name` under this document.
    pub fn collection(&self, name: &str) -> Result<PathKey> {
        if !self.is_document() {
            return Err(PathError::InvalidPath {
                path: self.to_string(),
                reason: "subcollections can only be nested under a document".into(),
            });
        }
        validate_identifier(name)?;
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Ok(Self { segments })
    }

    /// This key cut down to its first `len` segments, or `None` when `len` is
    /// zero or longer than the key.
    pub fn truncated(&self, len: usize) -> Option<PathKey> {
        if len == 0 || len > self.segments.len() {
            return None;
        }
        Some(Self {
            segments: self.segments[..len].to_vec(),
        })
    }

    /// Whether `prefix` is this key or one of its ancestors.
    pub fn starts_with(&self, prefix: &PathKey) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Whether this key lies strictly beneath `ancestor`.
    pub fn is_descendant_of(&self, ancestor: &PathKey) -> bool {
        self.segments.len() > ancestor.segments.len() && self.starts_with(ancestor)
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl fmt::Debug for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PathKey({self})")
    }
}

impl TryFrom<String> for PathKey {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<PathKey> for String {
    fn from(key: PathKey) -> Self {
        key.to_string()
    }
}
