//! Inspect command implementation.

use super::CliResult;
use lexdb_core::{Database, OperationSnapshot};
use serde::Serialize;

/// Database inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Database path.
    pub path: String,
    /// Size of the data log in bytes.
    pub log_size: u64,
    /// Per-entity statistics, in name order.
    pub entities: Vec<EntitySummary>,
    /// Operations performed by this process (opening replays none).
    pub operations: OperationSummary,
}

/// Statistics for a single entity.
#[derive(Debug, Serialize)]
pub struct EntitySummary {
    /// Entity name.
    pub name: String,
    /// Number of primary records.
    pub records: u64,
    /// Number of index entries.
    pub index_entries: u64,
    /// Declared index names.
    pub indexes: Vec<String>,
}

/// Serializable copy of the operation counters.
#[derive(Debug, Serialize)]
pub struct OperationSummary {
    creates: u64,
    updates: u64,
    reads: u64,
    scans: u64,
    index_lookups: u64,
    bytes_written: u64,
}

impl From<OperationSnapshot> for OperationSummary {
    fn from(s: OperationSnapshot) -> Self {
        Self {
            creates: s.creates,
            updates: s.updates,
            reads: s.reads,
            scans: s.scans,
            index_lookups: s.index_lookups,
            bytes_written: s.bytes_written,
        }
    }
}

/// Gathers statistics for every declared entity.
pub fn collect(db: &Database) -> CliResult<InspectResult> {
    let mut entities = Vec::new();
    for (name, stats) in db.stats()? {
        let indexes = db.schema().indexes(&name)?.keys().cloned().collect();
        entities.push(EntitySummary {
            name,
            records: stats.records,
            index_entries: stats.index_entries,
            indexes,
        });
    }

    let path = db
        .path()
        .map_or_else(|| "<memory>".to_string(), |p| p.display().to_string());

    Ok(InspectResult {
        path,
        log_size: db.log_size().unwrap_or(0),
        entities,
        operations: db.operations().snapshot().into(),
    })
}

/// Runs the inspect command.
pub fn run(db: &Database, format: &str) -> CliResult<()> {
    let result = collect(db)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            println!("LexDB Database: {}", result.path);
            println!();
            println!("Data log: {} bytes", result.log_size);
            println!();
            println!("Entities:");
            for entity in &result.entities {
                println!(
                    "  {:<20} {:>10} records {:>10} index entries",
                    entity.name, entity.records, entity.index_entries
                );
                if !entity.indexes.is_empty() {
                    println!("    indexes: {}", entity.indexes.join(", "));
                }
            }
        }
    }

    Ok(())
}
