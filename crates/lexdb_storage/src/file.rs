//! Log-backed persistent ordered store.
//!
//! The store directory has the following layout:
//!
//! ```text
//! <store_path>/
//! ├─ LOCK        # Advisory lock for single-process access
//! └─ data.log    # Append-only log of write batches
//! ```
//!
//! Each log record is framed as:
//!
//! ```text
//! | magic "LXB1" (4) | payload_len u32 LE (4) | payload | crc32 u32 LE (4) |
//! ```
//!
//! The checksum covers magic, length and payload. The payload is an encoded
//! [`WriteBatch`]. On open the log is replayed into an in-memory table. A
//! record that runs past the end of the file (a crash mid-append) is a torn
//! tail and is truncated away. A complete record with a bad magic, checksum
//! or batch fails the open and the file is left as it is.

use crate::batch::{compute_crc32, WriteBatch};
use crate::error::{StorageError, StorageResult};
use crate::store::{apply_batch, KvIter, OrderedStore, PrefixCursor, Table};
use fs2::FileExt;
use parking_lot::{Mutex, RwLock};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

const LOCK_FILE: &str = "LOCK";
const LOG_FILE: &str = "data.log";
const LOG_TEMP: &str = "data.log.tmp";

/// Magic bytes identifying a log record.
pub const LOG_MAGIC: [u8; 4] = *b"LXB1";

const HEADER_SIZE: usize = 8;
const TRAILER_SIZE: usize = 4;

/// Options for opening a [`FileStore`].
#[derive(Debug, Clone)]
pub struct FileStoreOptions {
    /// Whether to create the directory if it doesn't exist.
    pub create_if_missing: bool,
    /// Whether to fsync the log after every batch.
    pub sync_on_write: bool,
}

impl Default for FileStoreOptions {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            sync_on_write: true,
        }
    }
}

impl FileStoreOptions {
    /// Sets whether to create the directory if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to fsync after every batch.
    #[must_use]
    pub const fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }
}

#[derive(Debug)]
struct LogFile {
    file: File,
    len: u64,
    /// Set when a failed append could not be rolled back; the bytes after
    /// `len` are unknown.
    poisoned: bool,
}

impl LogFile {
    fn new(file: File, len: u64) -> Self {
        Self {
            file,
            len,
            poisoned: false,
        }
    }

    fn ensure_writable(&self) -> StorageResult<()> {
        if self.poisoned {
            return Err(StorageError::corrupted(
                "data log holds a partial record from a failed write; compact or reopen the store",
            ));
        }
        Ok(())
    }

    /// Cuts the file back to the last acknowledged record.
    fn rollback(&mut self) -> io::Result<()> {
        self.file.set_len(self.len)?;
        self.file.seek(SeekFrom::Start(self.len))?;
        Ok(())
    }
}

/// A persistent ordered store.
///
/// Reads are served from an in-memory table rebuilt from `data.log` on open.
/// Writes append one framed record per batch and only become visible after
/// the append (and fsync, if enabled) succeeded.
///
/// # Thread Safety
///
/// Writers serialize on the log mutex. Readers never wait for I/O.
///
/// # Example
///
/// ```no_run
/// use lexdb_storage::{FileStore, FileStoreOptions, OrderedStore, WriteBatch};
/// use std::path::Path;
///
/// let store = FileStore::open(Path::new("data"), FileStoreOptions::default()).unwrap();
/// let mut batch = WriteBatch::new();
/// batch.put(b"k".to_vec(), b"v".to_vec());
/// store.write(batch).unwrap();
/// ```
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    options: FileStoreOptions,
    log: Mutex<LogFile>,
    table: RwLock<Arc<Table>>,
    _lock_file: File,
}

impl FileStore {
    /// Opens or creates a store in directory `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory doesn't exist and `create_if_missing` is false
    /// - Another process holds the lock (`Locked`)
    /// - A complete log record is invalid (`Corrupted`)
    /// - I/O errors occur
    pub fn open(path: &Path, options: FileStoreOptions) -> StorageResult<Self> {
        if !path.exists() {
            if !options.create_if_missing {
                return Err(StorageError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            fs::create_dir_all(path)?;
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;
        lock_file
            .try_lock_exclusive()
            .map_err(|_| StorageError::Locked {
                path: path.to_path_buf(),
            })?;

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOG_FILE))?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        let (table, valid_len, batches) = replay(&bytes)?;

        if valid_len < bytes.len() {
            warn!(
                path = ?path,
                valid_len,
                file_len = bytes.len(),
                "truncating torn tail of data log"
            );
            file.set_len(valid_len as u64)?;
            file.sync_all()?;
        }
        file.seek(SeekFrom::Start(valid_len as u64))?;

        info!(path = ?path, batches, keys = table.len(), "opened file store");

        Ok(Self {
            path: path.to_path_buf(),
            options,
            log: Mutex::new(LogFile::new(file, valid_len as u64)),
            table: RwLock::new(Arc::new(table)),
            _lock_file: lock_file,
        })
    }

    /// Returns the store directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the current size of the data log in bytes.
    #[must_use]
    pub fn log_size(&self) -> u64 {
        self.log.lock().len
    }

    /// Rewrites the log as a single batch holding the live table.
    ///
    /// The new log is written to a temporary file, synced and renamed over
    /// the old one, so a crash leaves either the old or the new log. The
    /// handle used for later appends is the one the new log was written
    /// through. The table only holds acknowledged batches, so compaction
    /// also clears a log poisoned by a failed write.
    ///
    /// # Errors
    ///
    /// Returns an error if the new log cannot be written or installed.
    pub fn compact(&self) -> StorageResult<()> {
        let mut log = self.log.lock();
        let snapshot = Arc::clone(&self.table.read());

        let mut batch = WriteBatch::new();
        for (key, value) in snapshot.iter() {
            batch.put(key.clone(), value.clone());
        }
        let record = frame(&batch)?;

        let temp_path = self.path.join(LOG_TEMP);
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        file.write_all(&record)?;
        file.sync_all()?;
        fs::rename(&temp_path, self.path.join(LOG_FILE))?;

        let before = log.len;
        *log = LogFile::new(file, record.len() as u64);
        sync_directory(&self.path)?;
        info!(before, after = log.len, keys = snapshot.len(), "compacted data log");
        Ok(())
    }
}

impl OrderedStore for FileStore {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.table.read().get(key).cloned())
    }

    fn write(&self, batch: WriteBatch) -> StorageResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let record = frame(&batch)?;

        let mut log = self.log.lock();
        log.ensure_writable()?;
        let mut appended = log.file.write_all(&record);
        if appended.is_ok() && self.options.sync_on_write {
            appended = log.file.sync_data();
        }
        if let Err(err) = appended {
            // Drop whatever part of the record reached the file.
            if let Err(rollback) = log.rollback() {
                log.poisoned = true;
                warn!(
                    error = %rollback,
                    len = log.len,
                    "could not roll back failed append; refusing further writes"
                );
            }
            return Err(err.into());
        }
        log.len += record.len() as u64;
        debug!(ops = batch.len(), bytes = record.len(), "appended batch");

        let mut table = self.table.write();
        apply_batch(Arc::make_mut(&mut table), batch);
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> StorageResult<KvIter> {
        let snapshot = Arc::clone(&self.table.read());
        Ok(Box::new(PrefixCursor::new(snapshot, prefix)))
    }

    fn flush(&self) -> StorageResult<()> {
        let mut log = self.log.lock();
        log.file.flush()?;
        log.file.sync_all()?;
        Ok(())
    }
}

/// Frames an encoded batch as a log record.
fn frame(batch: &WriteBatch) -> StorageResult<Vec<u8>> {
    let payload = batch.encode()?;
    let len = u32::try_from(payload.len())
        .map_err(|_| StorageError::corrupted("batch exceeds maximum record size"))?;

    let mut record = Vec::with_capacity(HEADER_SIZE + payload.len() + TRAILER_SIZE);
    record.extend_from_slice(&LOG_MAGIC);
    record.extend_from_slice(&len.to_le_bytes());
    record.extend_from_slice(&payload);
    let crc = compute_crc32(&record);
    record.extend_from_slice(&crc.to_le_bytes());
    Ok(record)
}

#[cfg(unix)]
fn sync_directory(path: &Path) -> StorageResult<()> {
    File::open(path)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_directory(_path: &Path) -> StorageResult<()> {
    Ok(())
}

/// Replays log bytes, returning the table, the length of the valid prefix
/// and the number of batches applied.
fn replay(bytes: &[u8]) -> StorageResult<(Table, usize, usize)> {
    let mut table = Table::new();
    let mut offset = 0;
    let mut batches = 0;

    while offset < bytes.len() {
        match read_record(&bytes[offset..], offset)? {
            Some((batch, consumed)) => {
                apply_batch(&mut table, batch);
                offset += consumed;
                batches += 1;
            }
            None => break,
        }
    }
    Ok((table, offset, batches))
}

/// Parses the record at `offset`. `Ok(None)` means it runs past the end of
/// the log.
fn read_record(bytes: &[u8], offset: usize) -> StorageResult<Option<(WriteBatch, usize)>> {
    if bytes.len() < HEADER_SIZE {
        return Ok(None);
    }
    if bytes[..4] != LOG_MAGIC {
        return Err(StorageError::corrupted(format!(
            "invalid magic at offset {offset}"
        )));
    }
    let len = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    let body_end = HEADER_SIZE.saturating_add(len);
    let total = body_end.saturating_add(TRAILER_SIZE);
    if bytes.len() < total {
        return Ok(None);
    }

    let stored = u32::from_le_bytes([
        bytes[body_end],
        bytes[body_end + 1],
        bytes[body_end + 2],
        bytes[body_end + 3],
    ]);
    let computed = compute_crc32(&bytes[..body_end]);
    if stored != computed {
        return Err(StorageError::corrupted(format!(
            "checksum mismatch at offset {offset}: stored {stored:#010x}, computed {computed:#010x}"
        )));
    }
    let batch = WriteBatch::decode(&bytes[HEADER_SIZE..body_end]).map_err(|e| {
        StorageError::corrupted(format!("undecodable batch at offset {offset}: {e}"))
    })?;
    Ok(Some((batch, total)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::tempdir;

    fn put(store: &FileStore, key: &[u8], value: &[u8]) {
        let mut batch = WriteBatch::new();
        batch.put(key.to_vec(), value.to_vec());
        store.write(batch).unwrap();
    }

    #[test]
    fn file_data_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = FileStore::open(dir.path(), FileStoreOptions::default()).unwrap();
            put(&store, b"a", b"1");
            put(&store, b"b", b"2");
            let mut batch = WriteBatch::new();
            batch.delete(b"a".to_vec());
            store.write(batch).unwrap();
        }

        let store = FileStore::open(dir.path(), FileStoreOptions::default()).unwrap();
        assert_eq!(store.get(b"a").unwrap(), None);
        assert_eq!(store.get(b"b").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn file_second_open_is_locked() {
        let dir = tempdir().unwrap();
        let _store = FileStore::open(dir.path(), FileStoreOptions::default()).unwrap();
        let second = FileStore::open(dir.path(), FileStoreOptions::default());
        assert!(matches!(second, Err(StorageError::Locked { .. })));
    }

    #[test]
    fn file_missing_dir_without_create_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent");
        let result = FileStore::open(&path, FileStoreOptions::default().create_if_missing(false));
        assert!(matches!(result, Err(StorageError::NotFound { .. })));
    }

    #[test]
    fn file_torn_tail_is_truncated() {
        let dir = tempdir().unwrap();
        let good_len;
        {
            let store = FileStore::open(dir.path(), FileStoreOptions::default()).unwrap();
            put(&store, b"kept", b"1");
            good_len = store.log_size();
        }

        // Simulate a crash halfway through the next append.
        let mut batch = WriteBatch::new();
        batch.put(b"lost".to_vec(), b"2".to_vec());
        let record = frame(&batch).unwrap();
        let mut file = OpenOptions::new()
            .append(true)
            .open(dir.path().join(LOG_FILE))
            .unwrap();
        file.write_all(&record[..record.len() / 2]).unwrap();
        drop(file);

        let store = FileStore::open(dir.path(), FileStoreOptions::default()).unwrap();
        assert_eq!(store.get(b"kept").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get(b"lost").unwrap(), None);
        assert_eq!(store.log_size(), good_len);

        put(&store, b"after", b"3");
        drop(store);
        let store = FileStore::open(dir.path(), FileStoreOptions::default()).unwrap();
        assert_eq!(store.get(b"after").unwrap(), Some(b"3".to_vec()));
    }

    /// Writes one batch, then `more` batches, and returns the length of the
    /// first record.
    fn write_records(dir: &Path, more: u8) -> usize {
        let store = FileStore::open(dir, FileStoreOptions::default()).unwrap();
        put(&store, b"k0", b"first");
        let first_len = store.log_size() as usize;
        for i in 1..=more {
            put(&store, &[b'k', b'0' + i], b"later");
        }
        first_len
    }

    fn assert_open_fails_untouched(dir: &Path, corrupted: &[u8]) {
        let log_path = dir.join(LOG_FILE);
        fs::write(&log_path, corrupted).unwrap();

        let result = FileStore::open(dir, FileStoreOptions::default());
        assert!(matches!(result, Err(StorageError::Corrupted(_))), "{result:?}");
        assert_eq!(fs::read(&log_path).unwrap(), corrupted);
    }

    #[test]
    fn file_bad_checksum_in_first_record_fails_open() {
        let dir = tempdir().unwrap();
        let first_len = write_records(dir.path(), 5);

        let mut bytes = fs::read(dir.path().join(LOG_FILE)).unwrap();
        bytes[first_len - 1] ^= 0xFF;
        assert_open_fails_untouched(dir.path(), &bytes);
    }

    #[test]
    fn file_bad_checksum_in_last_record_fails_open() {
        let dir = tempdir().unwrap();
        write_records(dir.path(), 2);

        let mut bytes = fs::read(dir.path().join(LOG_FILE)).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert_open_fails_untouched(dir.path(), &bytes);
    }

    #[test]
    fn file_bad_magic_fails_open() {
        let dir = tempdir().unwrap();
        let first_len = write_records(dir.path(), 3);

        let mut bytes = fs::read(dir.path().join(LOG_FILE)).unwrap();
        bytes[first_len] = b'X';
        assert_open_fails_untouched(dir.path(), &bytes);
    }

    #[test]
    fn file_undecodable_batch_fails_open() {
        let dir = tempdir().unwrap();
        // A correctly framed record whose payload is not a batch.
        let payload = [0xFFu8; 3];
        let mut record = LOG_MAGIC.to_vec();
        record.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        record.extend_from_slice(&payload);
        let crc = compute_crc32(&record);
        record.extend_from_slice(&crc.to_le_bytes());
        assert_open_fails_untouched(dir.path(), &record);
    }

    #[test]
    fn file_poisoned_log_refuses_writes_until_compacted() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path(), FileStoreOptions::default()).unwrap();
        put(&store, b"a", b"1");
        store.log.lock().poisoned = true;

        let mut batch = WriteBatch::new();
        batch.put(b"b".to_vec(), b"2".to_vec());
        assert!(matches!(store.write(batch), Err(StorageError::Corrupted(_))));
        assert_eq!(store.get(b"b").unwrap(), None);

        store.compact().unwrap();
        put(&store, b"c", b"3");
        drop(store);

        let store = FileStore::open(dir.path(), FileStoreOptions::default()).unwrap();
        assert_eq!(store.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get(b"b").unwrap(), None);
        assert_eq!(store.get(b"c").unwrap(), Some(b"3".to_vec()));
    }

    #[test]
    fn file_compact_keeps_live_data() {
        let dir = tempdir().unwrap();
        {
            let store = FileStore::open(dir.path(), FileStoreOptions::default()).unwrap();
            for i in 0..20u8 {
                put(&store, b"counter", &[i]);
            }
            put(&store, b"other", b"x");
            let before = store.log_size();
            store.compact().unwrap();
            assert!(store.log_size() < before);
            put(&store, b"post", b"y");
        }

        let store = FileStore::open(dir.path(), FileStoreOptions::default()).unwrap();
        assert_eq!(store.get(b"counter").unwrap(), Some(vec![19]));
        assert_eq!(store.get(b"other").unwrap(), Some(b"x".to_vec()));
        assert_eq!(store.get(b"post").unwrap(), Some(b"y".to_vec()));
    }

    #[test]
    fn file_compact_appends_to_new_log() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path(), FileStoreOptions::default()).unwrap();
        for i in 0..10u8 {
            put(&store, b"k", &[i]);
        }
        store.compact().unwrap();
        put(&store, b"after", b"1");

        assert!(!dir.path().join(LOG_TEMP).exists());
        let on_disk = fs::metadata(dir.path().join(LOG_FILE)).unwrap().len();
        assert_eq!(on_disk, store.log_size());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn truncated_log_replays_complete_records(
            values in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..24), 1..8),
            cut in any::<prop::sample::Index>(),
        ) {
            let mut log = Vec::new();
            let mut ends = Vec::new();
            for (i, value) in values.iter().enumerate() {
                let mut batch = WriteBatch::new();
                batch.put(vec![i as u8], value.clone());
                log.extend_from_slice(&frame(&batch).unwrap());
                ends.push(log.len());
            }

            let cut = cut.index(log.len() + 1);
            let (table, valid_len, batches) = replay(&log[..cut]).unwrap();
            let complete = ends.iter().filter(|&&end| end <= cut).count();
            prop_assert_eq!(batches, complete);
            prop_assert_eq!(table.len(), complete);
            prop_assert_eq!(valid_len, if complete == 0 { 0 } else { ends[complete - 1] });
        }
    }

    #[test]
    fn file_scan_prefix() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path(), FileStoreOptions::default()).unwrap();
        put(&store, b"x/2", b"");
        put(&store, b"x/1", b"");
        put(&store, b"y/1", b"");
        let keys: Vec<_> = store
            .scan_prefix(b"x/")
            .unwrap()
            .map(|r| r.unwrap().0)
            .collect();
        assert_eq!(keys, vec![b"x/1".to_vec(), b"x/2".to_vec()]);
    }
}
