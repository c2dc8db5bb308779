//! File-backed databases across reopen.

use lexdb_core::{
    Config, CoreError, Database, EntityDescriptor, IdStrategy, Record, Schema, ValueKind,
};
use lexdb_storage::StorageError;
use tempfile::tempdir;

fn schema() -> Schema {
    Schema::new(vec![EntityDescriptor::new("Note")
        .with_attribute("body", ValueKind::Text)
        .with_indexed("tags", ValueKind::list(ValueKind::Text), "tag")])
    .unwrap()
}

fn note(body: &str, tags: Vec<&str>) -> Record {
    Record::new().with("body", body).with("tags", tags)
}

fn config() -> Config {
    Config::new().sync_on_write(false)
}

#[test]
fn records_and_indexes_survive_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("db");

    let (a, b) = {
        let db = Database::open(&path, schema(), config()).unwrap();
        let a = db.create("Note", &note("first", vec!["x"])).unwrap();
        let b = db.create("Note", &note("second", vec!["x", "y"])).unwrap();
        db.update("Note", a, &note("first!", vec!["z"])).unwrap();
        db.flush().unwrap();
        (a, b)
    };

    let db = Database::open(&path, schema(), config()).unwrap();
    assert_eq!(db.path(), Some(path.as_path()));
    assert_eq!(db.get("Note", a).unwrap(), note("first!", vec!["z"]));
    assert_eq!(db.get("Note", b).unwrap(), note("second", vec!["x", "y"]));

    let tagged_x: Vec<_> = db.equal_on("Note", "tag", "x").unwrap().map(|r| r.unwrap().0).collect();
    assert_eq!(tagged_x, vec![b]);
    assert!(db.verify("Note").unwrap().is_consistent());
}

#[test]
fn sequential_ids_continue_after_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("db");

    {
        let db = Database::open(&path, schema(), config()).unwrap();
        assert_eq!(db.create("Note", &note("a", vec![])).unwrap(), 1);
        assert_eq!(db.create("Note", &note("b", vec![])).unwrap(), 2);
    }

    let db = Database::open(&path, schema(), config()).unwrap();
    assert_eq!(db.create("Note", &note("c", vec![])).unwrap(), 3);
}

#[test]
fn compaction_keeps_contents() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("db");

    {
        let db = Database::open(&path, schema(), config()).unwrap();
        let id = db.create("Note", &note("v0", vec!["t0"])).unwrap();
        for i in 1..20 {
            let tag = format!("t{i}");
            db.update("Note", id, &note(&format!("v{i}"), vec![tag.as_str()])).unwrap();
        }
        let before = db.log_size().unwrap();
        db.compact().unwrap();
        assert!(db.log_size().unwrap() < before);
    }

    let db = Database::open(&path, schema(), config()).unwrap();
    assert_eq!(db.get("Note", 1).unwrap(), note("v19", vec!["t19"]));
    assert_eq!(db.stats().unwrap()["Note"].index_entries, 1);
    assert_eq!(db.create("Note", &note("next", vec![])).unwrap(), 2);
}

#[test]
fn second_open_is_locked_out() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("db");
    let _db = Database::open(&path, schema(), config()).unwrap();

    assert!(matches!(
        Database::open(&path, schema(), config()),
        Err(CoreError::Storage(StorageError::Locked { .. }))
    ));
}

#[test]
fn missing_directory_without_create() {
    let dir = tempdir().unwrap();
    let result = Database::open(
        &dir.path().join("absent"),
        schema(),
        config().create_if_missing(false),
    );
    assert!(matches!(result, Err(CoreError::Storage(_))));
}

#[test]
fn random_ids_survive_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("db");
    let config = config().id_strategy(IdStrategy::Random);

    let id = {
        let db = Database::open(&path, schema(), config.clone()).unwrap();
        db.create("Note", &note("r", vec!["k"])).unwrap()
    };

    let db = Database::open(&path, schema(), config).unwrap();
    assert_eq!(db.get("Note", id).unwrap(), note("r", vec!["k"]));
}
