//! Ordered store trait definition and the shared snapshot cursor.

use crate::batch::{BatchOp, WriteBatch};
use crate::error::StorageResult;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

/// A key/value pair yielded by a prefix scan.
pub type KvPair = (Vec<u8>, Vec<u8>);

/// Iterator returned by [`OrderedStore::scan_prefix`].
pub type KvIter = Box<dyn Iterator<Item = StorageResult<KvPair>> + Send>;

/// Sorted map that backs the bundled stores.
pub(crate) type Table = BTreeMap<Vec<u8>, Vec<u8>>;

/// An ordered, byte-sorted key-value store.
///
/// This is everything the record engine needs from a storage engine. The
/// store does not interpret keys or values.
///
/// # Invariants
///
/// - `write` applies a batch indivisibly: concurrent readers and iterators
///   observe either none or all of its operations
/// - `scan_prefix` yields keys in ascending byte order and observes the
///   state as of the call (later writes are invisible to it)
/// - Implementations must be `Send + Sync`
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For testing and ephemeral data
/// - [`super::FileStore`] - Log-backed persistent store
pub trait OrderedStore: Send + Sync {
    /// Point lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying read fails.
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    /// Applies a batch atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch could not be made durable. In that
    /// case none of its operations are visible.
    fn write(&self, batch: WriteBatch) -> StorageResult<()>;

    /// Opens a snapshot cursor over every key starting with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cursor cannot be created.
    fn scan_prefix(&self, prefix: &[u8]) -> StorageResult<KvIter>;

    /// Pushes buffered writes to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    fn flush(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Applies every op of `batch` to `table`, in order.
pub(crate) fn apply_batch(table: &mut Table, batch: WriteBatch) {
    for op in batch.into_ops() {
        match op {
            BatchOp::Put { key, value } => {
                table.insert(key, value);
            }
            BatchOp::Delete { key } => {
                table.remove(&key);
            }
        }
    }
}

/// Cursor over an immutable table snapshot, bounded by a key prefix.
///
/// Holding the `Arc` pins the snapshot; writers copy the table instead of
/// mutating it while a cursor is alive.
pub(crate) struct PrefixCursor {
    snapshot: Arc<Table>,
    prefix: Vec<u8>,
    lower: Bound<Vec<u8>>,
    done: bool,
}

impl PrefixCursor {
    pub(crate) fn new(snapshot: Arc<Table>, prefix: &[u8]) -> Self {
        Self {
            snapshot,
            prefix: prefix.to_vec(),
            lower: Bound::Included(prefix.to_vec()),
            done: false,
        }
    }
}

impl Iterator for PrefixCursor {
    type Item = StorageResult<KvPair>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = self
            .snapshot
            .range((self.lower.clone(), Bound::Unbounded))
            .next()
            .map(|(k, v)| (k.clone(), v.clone()));
        match next {
            Some((key, value)) if key.starts_with(&self.prefix) => {
                self.lower = Bound::Excluded(key.clone());
                Some(Ok((key, value)))
            }
            _ => {
                self.done = true;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(keys: &[&[u8]]) -> Arc<Table> {
        Arc::new(keys.iter().map(|k| (k.to_vec(), Vec::new())).collect())
    }

    #[test]
    fn cursor_stays_within_prefix() {
        let snapshot = table(&[b"a/1", b"a/2", b"ab/1", b"b/1"]);
        let keys: Vec<_> = PrefixCursor::new(snapshot, b"a/")
            .map(|r| r.unwrap().0)
            .collect();
        assert_eq!(keys, vec![b"a/1".to_vec(), b"a/2".to_vec()]);
    }

    #[test]
    fn cursor_empty_prefix_scans_everything() {
        let snapshot = table(&[b"x", b"y"]);
        assert_eq!(PrefixCursor::new(snapshot, b"").count(), 2);
    }

    #[test]
    fn apply_batch_in_order() {
        let mut t = Table::new();
        let mut batch = WriteBatch::new();
        batch.put(b"k".to_vec(), b"1".to_vec());
        batch.delete(b"k".to_vec());
        batch.put(b"j".to_vec(), b"2".to_vec());
        apply_batch(&mut t, batch);
        assert!(!t.contains_key(b"k".as_slice()));
        assert_eq!(t.get(b"j".as_slice()), Some(&b"2".to_vec()));
    }
}
