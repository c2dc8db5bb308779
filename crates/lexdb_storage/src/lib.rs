//! # LexDB Storage
//!
//! Ordered key-value store trait and implementations for LexDB.
//!
//! This crate provides the lowest-level storage abstraction for LexDB.
//! Stores are **opaque ordered maps** - they do not interpret the keys or
//! values they hold.
//!
//! ## Design Principles
//!
//! - Three primitives: point get, atomic batch write, ordered prefix scan
//! - Prefix scans observe a point-in-time snapshot
//! - No knowledge of LexDB key layouts, records or indexes
//! - Must be `Send + Sync` for concurrent access
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing and ephemeral storage
//! - [`FileStore`] - Log-backed persistent storage
//!
//! ## Example
//!
//! ```rust
//! use lexdb_storage::{InMemoryStore, OrderedStore, WriteBatch};
//!
//! let store = InMemoryStore::new();
//! let mut batch = WriteBatch::new();
//! batch.put(b"a/1".to_vec(), b"hello".to_vec());
//! batch.put(b"a/2".to_vec(), b"world".to_vec());
//! store.write(batch).unwrap();
//!
//! let values: Vec<_> = store
//!     .scan_prefix(b"a/")
//!     .unwrap()
//!     .map(|kv| kv.unwrap().1)
//!     .collect();
//! assert_eq!(values, vec![b"hello".to_vec(), b"world".to_vec()]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod batch;
mod error;
mod file;
mod memory;
mod store;

pub use batch::{BatchOp, WriteBatch};
pub use error::{StorageError, StorageResult};
pub use file::{FileStore, FileStoreOptions, LOG_MAGIC};
pub use memory::InMemoryStore;
pub use store::{KvIter, KvPair, OrderedStore};
