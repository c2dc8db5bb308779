//! Lazy record iterators.
//!
//! Both iterators run over a snapshot prefix scan opened when they are
//! created; writes made afterwards do not change which keys they visit.
//! Dropping an iterator early is always fine.

use crate::error::{CoreError, CoreResult};
use crate::keys;
use crate::payload;
use crate::schema::Schema;
use lexdb_codec::Record;
use lexdb_storage::{KvIter, OrderedStore};
use std::sync::Arc;

/// Every record of one entity, in ascending identifier order.
///
/// Returned by [`Database::all_of`](crate::Database::all_of).
pub struct AllOf {
    schema: Arc<Schema>,
    entity: String,
    prefix: Vec<u8>,
    cursor: KvIter,
}

impl AllOf {
    pub(crate) fn new(
        store: &dyn OrderedStore,
        schema: Arc<Schema>,
        entity: &str,
    ) -> CoreResult<Self> {
        schema.entity(entity)?;
        let prefix = keys::primary_prefix(entity);
        let cursor = store.scan_prefix(&prefix)?;
        Ok(Self {
            schema,
            entity: entity.to_string(),
            prefix,
            cursor,
        })
    }
}

impl Iterator for AllOf {
    type Item = CoreResult<(i64, Record)>;

    fn next(&mut self) -> Option<Self::Item> {
        let (key, value) = match self.cursor.next()? {
            Ok(pair) => pair,
            Err(e) => return Some(Err(e.into())),
        };
        Some(keys::parse_identifier(&self.prefix, &key).and_then(|id| {
            let record = payload::decode(&self.schema, &self.entity, &value)?;
            Ok((id, record))
        }))
    }
}

impl std::fmt::Debug for AllOf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AllOf").field("entity", &self.entity).finish()
    }
}

/// Records whose index holds one value, in ascending identifier order.
///
/// Each entry is resolved to its record at the time it is reached. An entry
/// without a live record yields [`CoreError::DanglingIndexEntry`] for that
/// item and iteration continues.
///
/// Returned by [`Database::equal_on`](crate::Database::equal_on).
pub struct EqualOn {
    store: Arc<dyn OrderedStore>,
    schema: Arc<Schema>,
    entity: String,
    index: String,
    prefix: Vec<u8>,
    cursor: KvIter,
}

impl EqualOn {
    pub(crate) fn new(
        store: Arc<dyn OrderedStore>,
        schema: Arc<Schema>,
        entity: &str,
        index: &str,
        prefix: Vec<u8>,
    ) -> CoreResult<Self> {
        let cursor = store.scan_prefix(&prefix)?;
        Ok(Self {
            store,
            schema,
            entity: entity.to_string(),
            index: index.to_string(),
            prefix,
            cursor,
        })
    }

    fn resolve(&self, id: i64) -> CoreResult<(i64, Record)> {
        let bytes = self
            .store
            .get(&keys::primary_key(&self.entity, id))?
            .ok_or_else(|| CoreError::dangling(&self.entity, &self.index, id))?;
        Ok((id, payload::decode(&self.schema, &self.entity, &bytes)?))
    }
}

impl Iterator for EqualOn {
    type Item = CoreResult<(i64, Record)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let key = match self.cursor.next()? {
                Ok((key, _)) => key,
                Err(e) => return Some(Err(e.into())),
            };
            // Entries of longer values share the prefix but leave more than
            // one integer behind it.
            if let Some(id) = keys::identifier_after(&self.prefix, &key) {
                return Some(self.resolve(id));
            }
        }
    }
}

impl std::fmt::Debug for EqualOn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EqualOn")
            .field("entity", &self.entity)
            .field("index", &self.index)
            .finish()
    }
}
