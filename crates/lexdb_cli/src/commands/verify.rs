//! Verify command implementation.

use super::{hex, CliError, CliResult};
use lexdb_core::{Database, VerifyReport};
use tracing::warn;

/// Verifies one entity, or every declared entity.
pub fn check(db: &Database, entity: Option<&str>) -> CliResult<Vec<VerifyReport>> {
    let names: Vec<String> = match entity {
        Some(name) => vec![name.to_string()],
        None => db.schema().entity_names().map(str::to_string).collect(),
    };
    names
        .iter()
        .map(|name| db.verify(name).map_err(CliError::from))
        .collect()
}

/// Runs the verify command.
pub fn run(db: &Database, entity: Option<&str>) -> CliResult<()> {
    let reports = check(db, entity)?;

    for report in &reports {
        print_report(report);
    }

    println!();
    let failed = reports.iter().filter(|r| !r.is_consistent()).count();
    if failed == 0 {
        println!("✓ Index verification passed");
        Ok(())
    } else {
        warn!(entities = failed, "index verification failed");
        println!("✗ Index verification failed");
        Err(CliError::Inconsistent { entities: failed })
    }
}

fn print_report(report: &VerifyReport) {
    println!("{}:", report.entity);
    println!("  Records:        {}", report.records);
    println!("  Index entries:  {}", report.index_entries);
    println!("  Dangling:       {}", report.dangling.len());
    println!("  Missing:        {}", report.missing.len());

    for key in &report.dangling {
        println!("    - dangling {}", hex(key));
    }
    for key in &report.missing {
        println!("    - missing  {}", hex(key));
    }
}
