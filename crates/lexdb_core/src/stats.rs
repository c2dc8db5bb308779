//! Database statistics and maintenance reports.
//!
//! [`OperationStats`] counts operations as they happen; [`EntityStats`] and
//! [`VerifyReport`] are computed on demand by scanning the store.
//!
//! ```rust,ignore
//! let db = Database::open_in_memory(schema)?;
//! db.create("Person", &record)?;
//!
//! let ops = db.operations().snapshot();
//! println!("creates: {}", ops.creates);
//!
//! for (entity, stats) in db.stats()? {
//!     println!("{entity}: {} records", stats.records);
//! }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Running operation counters.
///
/// All counters are atomic and can be read while operations are in progress.
#[derive(Debug, Default)]
pub struct OperationStats {
    creates: AtomicU64,
    updates: AtomicU64,
    reads: AtomicU64,
    scans: AtomicU64,
    index_lookups: AtomicU64,
    bytes_written: AtomicU64,
}

impl OperationStats {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_create(&self, bytes: u64) {
        self.creates.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_update(&self, bytes: u64) {
        self.updates.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_scan(&self) {
        self.scans.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_index_lookup(&self) {
        self.index_lookups.fetch_add(1, Ordering::Relaxed);
    }

    /// Records created.
    pub fn creates(&self) -> u64 {
        self.creates.load(Ordering::Relaxed)
    }

    /// Records updated.
    pub fn updates(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }

    /// Point reads by identifier.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Full entity scans started.
    ///
    /// High scan counts may indicate missing indexes.
    pub fn scans(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }

    /// Index equality lookups started.
    pub fn index_lookups(&self) -> u64 {
        self.index_lookups.load(Ordering::Relaxed)
    }

    /// Payload bytes written by creates and updates.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all counters.
    pub fn snapshot(&self) -> OperationSnapshot {
        OperationSnapshot {
            creates: self.creates(),
            updates: self.updates(),
            reads: self.reads(),
            scans: self.scans(),
            index_lookups: self.index_lookups(),
            bytes_written: self.bytes_written(),
        }
    }
}

/// A point-in-time copy of [`OperationStats`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OperationSnapshot {
    /// Records created.
    pub creates: u64,
    /// Records updated.
    pub updates: u64,
    /// Point reads by identifier.
    pub reads: u64,
    /// Full entity scans started.
    pub scans: u64,
    /// Index equality lookups started.
    pub index_lookups: u64,
    /// Payload bytes written.
    pub bytes_written: u64,
}

/// Stored size of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntityStats {
    /// Number of primary records.
    pub records: u64,
    /// Number of index entries across all of the entity's indexes.
    pub index_entries: u64,
}

/// Result of checking an entity's indexes against its records.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VerifyReport {
    /// Entity checked.
    pub entity: String,
    /// Number of primary records.
    pub records: usize,
    /// Number of index entries found.
    pub index_entries: usize,
    /// Entries not derivable from any live record.
    pub dangling: Vec<Vec<u8>>,
    /// Entries a live record requires but the store lacks.
    pub missing: Vec<Vec<u8>>,
}

impl VerifyReport {
    /// True if the index set matches the records exactly.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.dangling.is_empty() && self.missing.is_empty()
    }
}
