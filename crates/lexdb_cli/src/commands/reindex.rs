//! Reindex command implementation.

use super::CliResult;
use lexdb_core::Database;

/// Runs the reindex command.
pub fn run(db: &Database, entity: &str) -> CliResult<()> {
    let entries = db.rebuild_indexes(entity)?;
    db.flush()?;
    println!("✓ Rebuilt {entries} index entries for {entity}");
    Ok(())
}
