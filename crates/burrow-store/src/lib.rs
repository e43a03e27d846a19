//! Document store client for Burrow.
//!
//! The backing database is a remote hierarchical document store: documents
//! live in collections, collections nest under documents, and the only
//! multi-document guarantee is a bounded atomic batch. This crate specifies
//! that contract as the [`DocumentStore`] trait and ships an in-memory
//! implementation with the same semantics for tests and embedding.
//!
//! # Write Semantics
//!
//! A [`Batch`] stages four kinds of operations, applied all-or-nothing by
//! [`DocumentStore::commit`]:
//!
//! - `create` -- fails the whole commit if the document already exists
//! - `set` -- creates or overwrites
//! - `update` -- applies [`FieldTransform`]s; fails if the document is absent
//! - `delete` -- idempotent
//!
//! Batches are single-use: `commit` takes the batch by value.
//!
//! # Design Rules
//!
//! 1. "Not found" is `Ok(None)`, never an error, on reads.
//! 2. No read observes a batch before it commits.
//! 3. A batch larger than the store's bound is rejected before it is sent.
//! 4. There is no recursive delete; callers enumerate with `list_children`.

pub mod batch;
pub mod config;
pub mod document;
pub mod error;
pub mod memory;
pub mod traits;

pub use batch::{Batch, WriteOp};
pub use config::{StoreConfig, DEFAULT_MAX_BATCH_OPS};
pub use document::{Document, DocumentUpdate, FieldTransform};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryDocumentStore;
pub use traits::{CommitReceipt, DocumentStore};
