//! Resolution of `(kind, identifiers)` pairs into [`PathKey`]s.
//!
//! A kind of arity N accepts exactly N identifiers (its document path) or
//! N − 1 identifiers (the collection the document lives in). Identifiers are
//! interleaved with the kind's collection names from the root inwards.

use crate::error::{PathError, Result};
use crate::ident::{validate_composite, validate_identifier};
use crate::key::PathKey;
use crate::kind::EntityKind;

/// Resolve a kind and its identifiers to a document or collection key.
///
/// # Examples
///
/// ```
/// use burrow_paths::{resolve, EntityKind, PathError};
///
/// assert_eq!(
///     resolve(EntityKind::Forum, &["g1", "f1"]).unwrap().to_string(),
///     "groups/g1/forums/f1"
/// );
/// assert_eq!(
///     resolve(EntityKind::Forum, &["g1"]).unwrap().to_string(),
///     "groups/g1/forums"
/// );
/// assert!(matches!(
///     resolve::<&str>(EntityKind::Forum, &[]),
///     Err(PathError::InvalidArity { .. })
/// ));
/// ```
pub fn resolve<S: AsRef<str>>(kind: EntityKind, ids: &[S]) -> Result<PathKey> {
    let arity = kind.arity();
    if ids.len() != arity && ids.len() + 1 != arity {
        return Err(arity_error(kind, ids.len()));
    }

    let full_document = ids.len() == arity;
    let mut segments = Vec::with_capacity(ids.len() * 2 + 1);
    for (position, (collection, id)) in kind.collections().iter().zip(ids).enumerate() {
        let id = id.as_ref();
        let innermost = full_document && position + 1 == arity;
        let checked = if innermost && kind.has_composite_id() {
            validate_composite(id)
        } else {
            validate_identifier(id)
        };
        checked.map_err(|e| match e {
            PathError::InvalidIdentifier { id, reason } => PathError::InvalidIdentifier {
                id,
                reason: format!("{kind} identifier #{position}: {reason}"),
            },
            other => other,
        })?;
        segments.push((*collection).to_string());
        segments.push(id.to_string());
    }
    if !full_document {
        segments.push(kind.collections()[arity - 1].to_string());
    }
    Ok(PathKey::from_validated(segments))
}

/// Resolve a full document key; only N identifiers are accepted.
pub fn resolve_document<S: AsRef<str>>(kind: EntityKind, ids: &[S]) -> Result<PathKey> {
    if ids.len() != kind.arity() {
        return Err(arity_error(kind, ids.len()));
    }
    resolve(kind, ids)
}

/// Resolve a parent collection key; only N − 1 identifiers are accepted.
pub fn resolve_collection<S: AsRef<str>>(kind: EntityKind, ids: &[S]) -> Result<PathKey> {
    if ids.len() + 1 != kind.arity() {
        return Err(arity_error(kind, ids.len()));
    }
    resolve(kind, ids)
}

fn arity_error(kind: EntityKind, actual: usize) -> PathError {
    PathError::InvalidArity {
        kind,
        document: kind.arity(),
        collection: kind.arity() - 1,
        actual,
    }
}
