//! Test fixtures and database helpers.
//!
//! Provides convenience functions for setting up test databases
//! and common test scenarios.

use lexdb_core::{Config, Database, Schema};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A test database with automatic cleanup.
pub struct TestDatabase {
    /// The database instance.
    pub db: Database,
    schema: Schema,
    config: Config,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: Option<TempDir>,
}

impl TestDatabase {
    /// Creates a new in-memory test database.
    pub fn memory(schema: Schema) -> Self {
        Self {
            db: Database::open_in_memory(schema.clone()).expect("Failed to open in-memory database"),
            schema,
            config: Config::default(),
            temp_dir: None,
        }
    }

    /// Creates a new file-based test database in a temporary directory.
    pub fn file(schema: Schema) -> Self {
        Self::file_with_config(schema, Config::new().sync_on_write(false))
    }

    /// Creates a file-based test database with a custom configuration.
    pub fn file_with_config(schema: Schema, config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("db");
        let db = Database::open(&path, schema.clone(), config.clone())
            .expect("Failed to open file database");
        Self {
            db,
            schema,
            config,
            temp_dir: Some(temp_dir),
        }
    }

    /// Returns the database directory if file-based, None if in-memory.
    pub fn path(&self) -> Option<PathBuf> {
        self.temp_dir.as_ref().map(|d| d.path().join("db"))
    }

    /// Closes and reopens a file-based database, as after a restart.
    ///
    /// # Panics
    ///
    /// Panics for in-memory databases, which do not survive a restart.
    pub fn reopen(self) -> Self {
        let path = self.path().expect("Only file databases can be reopened");
        let Self {
            db,
            schema,
            config,
            temp_dir,
        } = self;
        drop(db);
        let db = Database::open(&path, schema.clone(), config.clone())
            .expect("Failed to reopen file database");
        Self {
            db,
            schema,
            config,
            temp_dir,
        }
    }
}

impl std::ops::Deref for TestDatabase {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

/// Runs a test with a temporary in-memory database.
///
/// # Example
///
/// ```rust,ignore
/// use lexdb_testkit::{person_schema, with_temp_db};
///
/// #[test]
/// fn my_test() {
///     with_temp_db(person_schema(), |db| {
///         assert_eq!(db.all_of("Person").unwrap().count(), 0);
///     });
/// }
/// ```
pub fn with_temp_db<F, R>(schema: Schema, f: F) -> R
where
    F: FnOnce(&Database) -> R,
{
    let test_db = TestDatabase::memory(schema);
    f(&test_db.db)
}

/// Runs a test with a temporary file-based database.
pub fn with_file_db<F, R>(schema: Schema, f: F) -> R
where
    F: FnOnce(&Database, &Path) -> R,
{
    let test_db = TestDatabase::file(schema);
    let path = test_db.path().expect("File database should have a path");
    f(&test_db.db, &path)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use crate::schemas::{person_schema, Person};

    /// Creates an in-memory database holding `count` sample people and
    /// returns it with their identifiers.
    pub fn populated_people(count: usize) -> (TestDatabase, Vec<i64>) {
        let test_db = TestDatabase::memory(person_schema());
        let ids = {
            let people = test_db
                .collection::<Person>()
                .expect("Person is declared");
            (0..count)
                .map(|n| people.create(&Person::sample(n)).expect("Failed to create person"))
                .collect()
        };
        (test_db, ids)
    }
}
