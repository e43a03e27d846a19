//! Hierarchical path resolution for Burrow documents.
//!
//! Every document in the backing store lives at a `/`-delimited key made of
//! alternating collection names and identifiers, e.g.
//! `groups/g1/forums/f1/messages/m1`. This crate owns the mapping from a
//! typed [`EntityKind`] plus its identifiers to that key. It performs no I/O
//! and is shared verbatim by read and write paths.
//!
//! # Modules
//!
//! - [`error`] -- [`PathError`], the only error this crate produces
//! - [`kind`] -- the closed [`EntityKind`] catalogue and its path templates
//! - [`key`] -- [`PathKey`], a validated segment list
//! - [`ident`] -- identifier validation and composite identifiers
//! - [`resolve`] -- [`resolve()`] and its document/collection variants
//!
//! # Example
//!
//! ```
//! use burrow_paths::{resolve, EntityKind};
//!
//! let forum = resolve(EntityKind::Forum, &["g1", "f1"]).unwrap();
//! assert_eq!(forum.to_string(), "groups/g1/forums/f1");
//!
//! let forums = resolve(EntityKind::Forum, &["g1"]).unwrap();
//! assert_eq!(forums.to_string(), "groups/g1/forums");
//! assert!(forum.starts_with(&forums));
//! ```

pub mod error;
pub mod ident;
pub mod key;
pub mod kind;
pub mod resolve;

pub use error::{PathError, Result};
pub use ident::{composite_id, split_composite_id, validate_identifier, COMPOSITE_DELIMITER};
pub use key::PathKey;
pub use kind::EntityKind;
pub use resolve::{resolve, resolve_collection, resolve_document};
