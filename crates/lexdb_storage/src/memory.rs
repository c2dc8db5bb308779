//! In-memory ordered store for testing.

use crate::batch::WriteBatch;
use crate::error::StorageResult;
use crate::store::{apply_batch, KvIter, OrderedStore, PrefixCursor, Table};
use parking_lot::RwLock;
use std::sync::Arc;

/// An in-memory ordered store.
///
/// This store keeps all data in a sorted map and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral databases that don't need persistence
///
/// # Snapshots
///
/// The table lives behind an `Arc`. Cursors clone the `Arc`; a batch applied
/// while a cursor is alive copies the table first, so the cursor keeps its
/// point-in-time view.
///
/// # Example
///
/// ```rust
/// use lexdb_storage::{InMemoryStore, OrderedStore, WriteBatch};
///
/// let store = InMemoryStore::new();
/// let mut batch = WriteBatch::new();
/// batch.put(b"user/1".to_vec(), b"alice".to_vec());
/// store.write(batch).unwrap();
/// assert_eq!(store.scan_prefix(b"user/").unwrap().count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    table: RwLock<Arc<Table>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `entries`.
    #[must_use]
    pub fn with_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Vec<u8>, Vec<u8>)>,
    {
        Self {
            table: RwLock::new(Arc::new(entries.into_iter().collect())),
        }
    }

    /// Returns the number of keys stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    /// Returns true if the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    /// Returns a copy of every key/value pair, in key order.
    ///
    /// Useful for testing and debugging.
    #[must_use]
    pub fn entries(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.table
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl OrderedStore for InMemoryStore {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.table.read().get(key).cloned())
    }

    fn write(&self, batch: WriteBatch) -> StorageResult<()> {
        let mut table = self.table.write();
        apply_batch(Arc::make_mut(&mut table), batch);
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> StorageResult<KvIter> {
        let snapshot = Arc::clone(&self.table.read());
        Ok(Box::new(PrefixCursor::new(snapshot, prefix)))
    }
}
