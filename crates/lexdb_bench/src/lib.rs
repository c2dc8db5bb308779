//! Benchmark utilities.

use lexdb_core::{EntityDescriptor, Record, Schema, ValueKind};
use rand::distributions::Alphanumeric;
use rand::Rng;

/// Random alphanumeric text of `len` characters.
pub fn random_text(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Random bytes of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Schema with one `Item` entity: an unindexed body, an indexed `bucket`
/// and a list of indexed tags.
///
/// # Panics
///
/// Never; the descriptor is valid.
pub fn item_schema() -> Schema {
    Schema::new([EntityDescriptor::new("Item")
        .with_attribute("body", ValueKind::Text)
        .with_indexed("bucket", ValueKind::Int, "bucket")
        .with_indexed("tags", ValueKind::list(ValueKind::Text), "tag")])
    .expect("bench schema is valid")
}

/// An `Item` record with a body of `body_len` characters, in one of
/// `buckets` buckets and carrying `tags` tags.
pub fn item(body_len: usize, buckets: i64, tags: usize) -> Record {
    let mut rng = rand::thread_rng();
    let tags: Vec<String> = (0..tags).map(|i| format!("tag-{}", rng.gen_range(0..8) + i)).collect();
    Record::new()
        .with("body", random_text(body_len))
        .with("bucket", rng.gen_range(0..buckets.max(1)))
        .with("tags", tags)
}
