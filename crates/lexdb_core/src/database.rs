//! Database facade.

use crate::collection::{Collection, Entity};
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::ids::IdAllocator;
use crate::index::{self, IndexDelta};
use crate::keys;
use crate::locks::LockStripes;
use crate::payload;
use crate::query::{AllOf, EqualOn};
use crate::schema::Schema;
use crate::stats::{EntityStats, OperationStats, VerifyReport};
use lexdb_codec::{Record, Scalar};
use lexdb_storage::{FileStore, FileStoreOptions, InMemoryStore, OrderedStore, WriteBatch};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The main database handle.
///
/// `Database` stores records of the entities declared in its [`Schema`]
/// and keeps their secondary indexes in step:
/// - [`create`](Self::create) writes a record and all its index entries
/// - [`update`](Self::update) rewrites a record and swaps stale entries
///   for new ones
/// - [`all_of`](Self::all_of) and [`equal_on`](Self::equal_on) iterate
///
/// Every mutation is a single atomic batch on the underlying store.
///
/// # Example
///
/// ```
/// use lexdb_core::{Database, EntityDescriptor, Record, Schema, ValueKind};
///
/// let schema = Schema::new(vec![EntityDescriptor::new("Person")
///     .with_attribute("name", ValueKind::Text)
///     .with_indexed("age", ValueKind::Int, "age")])
/// .unwrap();
/// let db = Database::open_in_memory(schema).unwrap();
///
/// let id = db
///     .create("Person", &Record::new().with("name", "Ada").with("age", 36i64))
///     .unwrap();
///
/// let found: Vec<_> = db
///     .equal_on("Person", "age", 36i64)
///     .unwrap()
///     .map(|r| r.unwrap().0)
///     .collect();
/// assert_eq!(found, vec![id]);
/// ```
pub struct Database {
    config: Config,
    schema: Arc<Schema>,
    store: Arc<dyn OrderedStore>,
    /// Present when opened from a directory.
    file: Option<Arc<FileStore>>,
    ids: IdAllocator,
    create_locks: HashMap<String, Mutex<()>>,
    update_locks: LockStripes,
    operations: OperationStats,
}

impl Database {
    /// Opens (or creates) a database stored in the directory at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Storage`] if the directory is missing and
    /// `create_if_missing` is off, is locked by another process, or holds a
    /// log that cannot be read.
    pub fn open(path: &Path, schema: Schema, config: Config) -> CoreResult<Self> {
        let options = FileStoreOptions::default()
            .create_if_missing(config.create_if_missing)
            .sync_on_write(config.sync_on_write);
        let file = Arc::new(FileStore::open(path, options)?);
        let store: Arc<dyn OrderedStore> = file.clone();
        let mut db = Self::open_with_store(store, schema, config)?;
        db.file = Some(file);
        Ok(db)
    }

    /// Opens an empty database held in memory.
    ///
    /// # Errors
    ///
    /// Does not fail with the default configuration.
    pub fn open_in_memory(schema: Schema) -> CoreResult<Self> {
        Self::open_with_store(Arc::new(InMemoryStore::new()), schema, Config::default())
    }

    /// Opens a database over any ordered store.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if `max_id_attempts` is zero.
    pub fn open_with_store(
        store: Arc<dyn OrderedStore>,
        schema: Schema,
        config: Config,
    ) -> CoreResult<Self> {
        if config.max_id_attempts == 0 {
            return Err(CoreError::invalid_argument("max_id_attempts must be positive"));
        }
        let create_locks: HashMap<String, Mutex<()>> = schema
            .entity_names()
            .map(|name| (name.to_string(), Mutex::new(())))
            .collect();
        info!(
            entities = create_locks.len(),
            id_strategy = ?config.id_strategy,
            "database opened"
        );
        Ok(Self {
            ids: IdAllocator::new(config.id_strategy, config.max_id_attempts),
            update_locks: LockStripes::new(config.lock_stripes),
            create_locks,
            schema: Arc::new(schema),
            store,
            file: None,
            config,
            operations: OperationStats::new(),
        })
    }

    /// The schema this database was opened with.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The configuration this database was opened with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Directory of a file-backed database.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.file.as_deref().map(FileStore::path)
    }

    /// Size of the data log of a file-backed database, in bytes.
    #[must_use]
    pub fn log_size(&self) -> Option<u64> {
        self.file.as_deref().map(FileStore::log_size)
    }

    /// Running operation counters.
    #[must_use]
    pub fn operations(&self) -> &OperationStats {
        &self.operations
    }

    /// Creates a record and returns its new identifier.
    ///
    /// The record, its index entries and (for sequential identifiers) the
    /// advanced counter are written in one batch.
    ///
    /// # Errors
    ///
    /// - [`CoreError::UnknownEntity`] if the entity is not declared
    /// - [`CoreError::Encoding`] if the record does not match the entity
    /// - [`CoreError::IdSpaceExhausted`] if no free identifier was found
    /// - [`CoreError::Storage`] if the write fails; nothing is stored then
    pub fn create(&self, entity: &str, record: &Record) -> CoreResult<i64> {
        let payload = payload::encode(&self.schema, entity, record)?;
        let lock = self
            .create_locks
            .get(entity)
            .ok_or_else(|| CoreError::unknown_entity(entity))?;
        let _guard = lock.lock();

        let mut batch = WriteBatch::new();
        let id = self.ids.allocate(self.store.as_ref(), entity, &mut batch)?;
        let entries = index::index_entries(&self.schema, entity, record, id)?;
        let size = payload.len() as u64;
        let index_count = entries.len();

        batch.put(keys::primary_key(entity, id), payload);
        for key in entries {
            batch.put(key, Vec::new());
        }
        self.store.write(batch)?;

        self.operations.record_create(size);
        debug!(entity, id, index_entries = index_count, "record created");
        Ok(id)
    }

    /// Fetches a record.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if no record has this identifier
    /// - [`CoreError::Decoding`] if the stored payload is not a valid record
    pub fn get(&self, entity: &str, id: i64) -> CoreResult<Record> {
        self.schema.entity(entity)?;
        self.operations.record_read();
        let bytes = self
            .store
            .get(&keys::primary_key(entity, id))?
            .ok_or_else(|| CoreError::not_found(entity, id))?;
        payload::decode(&self.schema, entity, &bytes)
    }

    /// Returns true if a record with this identifier exists.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownEntity`] or a storage error.
    pub fn exists(&self, entity: &str, id: i64) -> CoreResult<bool> {
        self.schema.entity(entity)?;
        Ok(self.store.get(&keys::primary_key(entity, id))?.is_some())
    }

    /// Replaces an existing record.
    ///
    /// The previous record's index entries are recomputed from the stored
    /// payload. Entries it has and the new record lacks are deleted, new
    /// ones are added, and the primary value is overwritten, all in one
    /// batch. Updates of the same record are serialized.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if no record has this identifier; nothing
    ///   is written
    /// - [`CoreError::Encoding`] if the record does not match the entity
    /// - [`CoreError::Decoding`] if the stored payload is unreadable
    pub fn update(&self, entity: &str, id: i64, record: &Record) -> CoreResult<()> {
        let payload = payload::encode(&self.schema, entity, record)?;
        let new_entries = index::index_entries(&self.schema, entity, record, id)?;

        let _guard = self.update_locks.lock(entity, id);
        let key = keys::primary_key(entity, id);
        let previous = self
            .store
            .get(&key)?
            .ok_or_else(|| CoreError::not_found(entity, id))?;
        let previous = payload::decode(&self.schema, entity, &previous)?;
        let old_entries = index::index_entries(&self.schema, entity, &previous, id)?;
        let delta = IndexDelta::between(&old_entries, &new_entries);
        let (removed, added) = (delta.removed.len(), delta.added.len());
        let size = payload.len() as u64;

        let mut batch = WriteBatch::new();
        batch.put(key, payload);
        delta.apply_to(&mut batch);
        self.store.write(batch)?;

        self.operations.record_update(size);
        debug!(entity, id, removed, added, "record updated");
        Ok(())
    }

    /// Iterates every record of `entity` in ascending identifier order.
    ///
    /// The iterator reads a snapshot taken now; each call starts a fresh
    /// one.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownEntity`] or a storage error.
    pub fn all_of(&self, entity: &str) -> CoreResult<AllOf> {
        let iter = AllOf::new(self.store.as_ref(), Arc::clone(&self.schema), entity)?;
        self.operations.record_scan();
        Ok(iter)
    }

    /// Iterates the records whose `index` holds `value`, in ascending
    /// identifier order.
    ///
    /// # Errors
    ///
    /// - [`CoreError::UnknownEntity`] or [`CoreError::UnknownIndex`]
    /// - [`CoreError::Encoding`] if `value` is not of the index's kind
    pub fn equal_on(
        &self,
        entity: &str,
        index: &str,
        value: impl Into<Scalar>,
    ) -> CoreResult<EqualOn> {
        let value = value.into();
        let kind = self.schema.index_kind(entity, index)?;
        if value.kind() != kind {
            return Err(CoreError::encoding(format!(
                "index {entity}.{index} holds {kind} values, got {}",
                value.kind()
            )));
        }
        let prefix = keys::index_value_prefix(entity, index, &value);
        let iter = EqualOn::new(
            Arc::clone(&self.store),
            Arc::clone(&self.schema),
            entity,
            index,
            prefix,
        )?;
        self.operations.record_index_lookup();
        Ok(iter)
    }

    /// Typed access to the entity `T` maps to.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownEntity`] if `T::NAME` is not declared.
    pub fn collection<T: Entity>(&self) -> CoreResult<Collection<'_, T>> {
        self.schema.entity(T::NAME)?;
        Ok(Collection::new(self))
    }

    /// Compares an entity's index entries with the set its records imply.
    ///
    /// Primary and index keys are read from two separate snapshots, so
    /// writes running concurrently can show up as findings.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownEntity`], or any error reading records.
    pub fn verify(&self, entity: &str) -> CoreResult<VerifyReport> {
        let (records, expected) = self.expected_entries(entity)?;
        let actual = self.stored_entries(entity)?;

        let report = VerifyReport {
            entity: entity.to_string(),
            records,
            index_entries: actual.len(),
            dangling: actual.difference(&expected).cloned().collect(),
            missing: expected.difference(&actual).cloned().collect(),
        };
        if report.is_consistent() {
            info!(entity, records, "indexes verified");
        } else {
            warn!(
                entity,
                dangling = report.dangling.len(),
                missing = report.missing.len(),
                "index verification found inconsistencies"
            );
        }
        Ok(report)
    }

    /// Rewrites an entity's index entries from its records and returns how
    /// many entries it now has.
    ///
    /// Creates and updates of the entity wait until the rebuild is written.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownEntity`], or any error reading records
    /// or writing the batch.
    pub fn rebuild_indexes(&self, entity: &str) -> CoreResult<usize> {
        let lock = self
            .create_locks
            .get(entity)
            .ok_or_else(|| CoreError::unknown_entity(entity))?;
        let _create = lock.lock();
        let _updates = self.update_locks.lock_all();

        let (records, expected) = self.expected_entries(entity)?;
        let actual = self.stored_entries(entity)?;
        let delta = IndexDelta::between(&actual, &expected);
        let (removed, added) = (delta.removed.len(), delta.added.len());

        if !delta.is_empty() {
            let mut batch = WriteBatch::new();
            delta.apply_to(&mut batch);
            self.store.write(batch)?;
        }
        info!(entity, records, removed, added, "indexes rebuilt");
        Ok(expected.len())
    }

    /// Record and index entry counts of every entity.
    ///
    /// # Errors
    ///
    /// Returns a storage error if a scan fails.
    pub fn stats(&self) -> CoreResult<BTreeMap<String, EntityStats>> {
        let mut out = BTreeMap::new();
        for entity in self.schema.entity_names() {
            let stats = EntityStats {
                records: self.count_prefix(&keys::primary_prefix(entity))?,
                index_entries: self.count_prefix(&keys::index_namespace(entity))?,
            };
            out.insert(entity.to_string(), stats);
        }
        Ok(out)
    }

    /// Writes buffered data to durable storage.
    ///
    /// # Errors
    ///
    /// Returns a storage error if syncing fails.
    pub fn flush(&self) -> CoreResult<()> {
        Ok(self.store.flush()?)
    }

    /// Rewrites the data log of a file-backed database as a single
    /// snapshot. Does nothing in memory.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the new log cannot be written.
    pub fn compact(&self) -> CoreResult<()> {
        if let Some(file) = &self.file {
            file.compact()?;
        }
        Ok(())
    }

    fn expected_entries(&self, entity: &str) -> CoreResult<(usize, BTreeSet<Vec<u8>>)> {
        let mut records = 0;
        let mut expected = BTreeSet::new();
        for item in AllOf::new(self.store.as_ref(), Arc::clone(&self.schema), entity)? {
            let (id, record) = item?;
            records += 1;
            expected.extend(index::index_entries(&self.schema, entity, &record, id)?);
        }
        Ok((records, expected))
    }

    fn stored_entries(&self, entity: &str) -> CoreResult<BTreeSet<Vec<u8>>> {
        self.store
            .scan_prefix(&keys::index_namespace(entity))?
            .map(|item| item.map(|(key, _)| key).map_err(CoreError::from))
            .collect()
    }

    fn count_prefix(&self, prefix: &[u8]) -> CoreResult<u64> {
        let mut count = 0;
        for item in self.store.scan_prefix(prefix)? {
            item?;
            count += 1;
        }
        Ok(count)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path())
            .field("entities", &self.create_locks.len())
            .field("config", &self.config)
            .finish()
    }
}
