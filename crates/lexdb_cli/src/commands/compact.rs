//! Compact command implementation.

use super::CliResult;
use lexdb_core::Database;

/// Runs the compact command.
pub fn run(db: &Database) -> CliResult<()> {
    let Some(before) = db.log_size() else {
        println!("In-memory database; nothing to compact");
        return Ok(());
    };

    db.compact()?;
    let after = db.log_size().unwrap_or(before);

    if let Some(path) = db.path() {
        println!("Compacted data log at {}", path.display());
    }
    println!("  Size before: {before} bytes");
    println!("  Size after:  {after} bytes");
    println!(
        "  Space saved: {} bytes ({:.1}%)",
        before.saturating_sub(after),
        if before > 0 {
            (before.saturating_sub(after) as f64 / before as f64) * 100.0
        } else {
            0.0
        }
    );
    Ok(())
}
