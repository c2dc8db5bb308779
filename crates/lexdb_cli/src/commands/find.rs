//! Find command implementation.

use super::{parse_scalar, record_line, CliResult};
use lexdb_core::Database;
use std::io::{self, Write};

/// Writes the records whose `index` holds `raw`, parsed according to the
/// index's kind. Entries whose record is missing are reported and skipped.
pub fn write_matches(
    db: &Database,
    entity: &str,
    index: &str,
    raw: &str,
    out: &mut dyn Write,
) -> CliResult<usize> {
    let kind = db.schema().index_kind(entity, index)?;
    let value = parse_scalar(raw, kind)?;

    let mut count = 0;
    for item in db.equal_on(entity, index, value)? {
        match item {
            Ok((id, record)) => {
                writeln!(out, "{}", record_line(id, &record)?)?;
                count += 1;
            }
            Err(e) => eprintln!("warning: {e}"),
        }
    }
    Ok(count)
}

/// Runs the find command.
pub fn run(db: &Database, entity: &str, index: &str, raw: &str) -> CliResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let count = write_matches(db, entity, index, raw, &mut out)?;
    out.flush()?;
    eprintln!("{count} matching records");
    Ok(())
}
