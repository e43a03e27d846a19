//! Identifier validation and composite identifiers.
//!
//! Valid identifiers:
//! - Must be non-empty and at most [`MAX_IDENTIFIER_BYTES`] bytes
//! - Must not contain `/` or NUL
//! - Must not be `.` or `..`
//! - Must not look like a reserved `__name__` identifier
//! - Must not contain [`COMPOSITE_DELIMITER`]
//!
//! The one exception to "one identifier per segment" is the composite key
//! used by meal entries: two values joined by [`COMPOSITE_DELIMITER`]. A
//! component that already contains the delimiter is rejected rather than
//! producing a key that splits back differently.

use crate::error::{PathError, Result};

/// Reserved separator for composite identifiers (U+241F SYMBOL FOR UNIT
/// SEPARATOR). Never valid inside a caller-supplied identifier.
pub const COMPOSITE_DELIMITER: char = '\u{241F}';

/// Upper bound on the encoded size of one identifier.
pub const MAX_IDENTIFIER_BYTES: usize = 1500;

/// Characters that are forbidden anywhere in an identifier.
const FORBIDDEN_CHARS: &[char] = &['/', '\0'];

fn invalid(id: &str, reason: impl Into<String>) -> PathError {
    PathError::InvalidIdentifier {
        id: id.to_string(),
        reason: reason.into(),
    }
}

/// Validate a single identifier, returning `Ok(())` if it may be used as a
/// path segment.
///
/// # Examples
///
/// ```
/// use burrow_paths::validate_identifier;
///
/// assert!(validate_identifier("g1").is_ok());
/// assert!(validate_identifier("Huskies of Oslo").is_ok());
/// assert!(validate_identifier("").is_err());
/// assert!(validate_identifier("a/b").is_err());
/// ```
pub fn validate_identifier(id: &str) -> Result<()> {
    validate_segment(id)?;

    if id.contains(COMPOSITE_DELIMITER) {
        return Err(invalid(
            id,
            format!("contains reserved delimiter: {COMPOSITE_DELIMITER:?}"),
        ));
    }

    if id.len() > 4 && id.starts_with("__") && id.ends_with("__") {
        return Err(invalid(id, "'__name__' identifiers are reserved"));
    }

    Ok(())
}

/// Validate one raw key segment. Looser than [`validate_identifier`]: a
/// stored composite identifier legitimately contains the delimiter.
pub(crate) fn validate_segment(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(invalid(id, "identifier must not be empty"));
    }

    if id.len() > MAX_IDENTIFIER_BYTES {
        return Err(invalid(
            id,
            format!("identifier exceeds {MAX_IDENTIFIER_BYTES} bytes"),
        ));
    }

    for ch in FORBIDDEN_CHARS {
        if id.contains(*ch) {
            return Err(invalid(id, format!("contains forbidden character: {ch:?}")));
        }
    }

    if id == "." || id == ".." {
        return Err(invalid(id, "must not be '.' or '..'"));
    }

    Ok(())
}

/// Join two values into the composite identifier of a meal entry.
///
/// Both halves must be valid identifiers on their own, which also guarantees
/// neither contains the delimiter.
///
/// ```
/// use burrow_paths::{composite_id, split_composite_id};
///
/// let id = composite_id("2024-05-01", "breakfast").unwrap();
/// assert_eq!(split_composite_id(&id), Some(("2024-05-01", "breakfast")));
/// ```
pub fn composite_id(first: &str, second: &str) -> Result<String> {
    validate_identifier(first)?;
    validate_identifier(second)?;
    Ok(format!("{first}{COMPOSITE_DELIMITER}{second}"))
}

/// Split a composite identifier back into its two halves.
///
/// Returns `None` unless the input holds exactly one delimiter with a
/// non-empty value on both sides.
pub fn split_composite_id(id: &str) -> Option<(&str, &str)> {
    let (first, second) = id.split_once(COMPOSITE_DELIMITER)?;
    if first.is_empty() || second.is_empty() || second.contains(COMPOSITE_DELIMITER) {
        return None;
    }
    Some((first, second))
}

/// Validate an identifier that must be a composite produced by
/// [`composite_id`].
pub(crate) fn validate_composite(id: &str) -> Result<()> {
    let (first, second) = split_composite_id(id)
        .ok_or_else(|| invalid(id, "expected a composite identifier of two parts"))?;
    validate_identifier(first)?;
    validate_identifier(second)
}
