//! Get command implementation.

use super::{record_line, CliResult};
use lexdb_core::Database;

/// Runs the get command.
pub fn run(db: &Database, entity: &str, id: i64) -> CliResult<()> {
    let record = db.get(entity, id)?;
    println!("{}", record_line(id, &record)?);
    Ok(())
}
