//! # LexDB Core
//!
//! Typed records with automatically maintained secondary indexes, stored
//! in an ordered key-value store.
//!
//! This crate provides:
//! - [`Schema`]: entities, typed attributes and index tags
//! - [`keys`]: the layout of primary records, index entries and counters
//! - [`index`]: derivation of a record's index entries and update deltas
//! - [`Database`]: create / get / update, each one atomic batch
//! - [`AllOf`] and [`EqualOn`]: lazy snapshot iterators
//! - [`Collection`]: a typed facade over [`Entity`] types
//!
//! Queries are equality lookups on one index; there are no range queries,
//! no deletes and no multi-record transactions.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod collection;
mod config;
mod database;
mod error;
mod ids;
pub mod index;
pub mod keys;
mod locks;
pub mod payload;
mod query;
mod schema;
mod stats;

pub use collection::{field, Collection, Entity};
pub use config::{Config, IdStrategy};
pub use database::Database;
pub use error::{CoreError, CoreResult};
pub use index::{declared_indexes, index_entries, IndexDelta};
pub use query::{AllOf, EqualOn};
pub use schema::{AttributeDescriptor, EntityDescriptor, Schema, ValueKind};
pub use stats::{EntityStats, OperationSnapshot, OperationStats, VerifyReport};

pub use lexdb_codec::{Record, Scalar, ScalarKind, Value};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
