//! Dump command implementation.

use super::{record_line, CliResult};
use lexdb_core::Database;
use std::io::{self, Write};

/// Writes every record of `entity` as one JSON line, in identifier order.
pub fn write_records(db: &Database, entity: &str, out: &mut dyn Write) -> CliResult<usize> {
    let mut count = 0;
    for item in db.all_of(entity)? {
        let (id, record) = item?;
        writeln!(out, "{}", record_line(id, &record)?)?;
        count += 1;
    }
    Ok(count)
}

/// Runs the dump command.
pub fn run(db: &Database, entity: &str) -> CliResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_records(db, entity, &mut out)?;
    out.flush()?;
    Ok(())
}
