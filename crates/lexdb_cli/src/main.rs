//! LexDB CLI
//!
//! Command-line tools for LexDB databases.
//!
//! # Commands
//!
//! - `inspect` - Display per-entity statistics and log size
//! - `verify` - Check indexes against primary records
//! - `reindex` - Rebuild the indexes of one entity
//! - `dump` - Print every record of an entity as JSON lines
//! - `get` - Print one record
//! - `find` - Print the records whose index holds a value
//! - `compact` - Rewrite the data log as a single snapshot

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// LexDB command-line database tools.
#[derive(Parser)]
#[command(name = "lexdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the database directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Path to the schema file (JSON)
    #[arg(global = true, short, long)]
    schema: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display database statistics
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Verify that indexes match the stored records
    Verify {
        /// Only check this entity (default: all)
        #[arg(short, long)]
        entity: Option<String>,
    },

    /// Rebuild every index of an entity from its records
    Reindex {
        /// Entity to reindex
        #[arg(short, long)]
        entity: String,
    },

    /// Dump all records of an entity as JSON lines
    Dump {
        /// Entity to dump
        #[arg(short, long)]
        entity: String,
    },

    /// Print one record
    Get {
        /// Entity name
        #[arg(short, long)]
        entity: String,

        /// Record identifier
        #[arg(short, long, allow_hyphen_values = true)]
        id: i64,
    },

    /// Print the records whose index holds a value
    Find {
        /// Entity name
        #[arg(short, long)]
        entity: String,

        /// Index name
        #[arg(short = 'x', long)]
        index: String,

        /// Value to look up, parsed according to the index kind
        #[arg(short = 'q', long, allow_hyphen_values = true)]
        value: String,
    },

    /// Rewrite the data log as a single snapshot
    Compact,

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Commands::Version = cli.command {
        println!("LexDB CLI v{}", env!("CARGO_PKG_VERSION"));
        println!("LexDB Core v{}", lexdb_core::VERSION);
        return Ok(());
    }

    let path = cli.path.ok_or("Database path required")?;
    let schema = cli.schema.ok_or("Schema file required")?;
    let db = commands::open(&path, &schema)?;

    match cli.command {
        Commands::Inspect { format } => commands::inspect::run(&db, &format)?,
        Commands::Verify { entity } => commands::verify::run(&db, entity.as_deref())?,
        Commands::Reindex { entity } => commands::reindex::run(&db, &entity)?,
        Commands::Dump { entity } => commands::dump::run(&db, &entity)?,
        Commands::Get { entity, id } => commands::get::run(&db, &entity, id)?,
        Commands::Find {
            entity,
            index,
            value,
        } => commands::find::run(&db, &entity, &index, &value)?,
        Commands::Compact => commands::compact::run(&db)?,
        Commands::Version => {}
    }

    Ok(())
}
