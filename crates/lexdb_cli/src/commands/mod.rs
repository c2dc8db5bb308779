//! CLI command implementations.

pub mod compact;
pub mod dump;
pub mod find;
pub mod get;
pub mod inspect;
pub mod reindex;
pub mod verify;

use lexdb_core::{Config, CoreError, Database, Record, Scalar, ScalarKind, Schema, Value};
use serde_json::{Map, Value as Json};
use std::path::Path;
use thiserror::Error;

/// Errors reported by the CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// The schema file could not be read.
    #[error("cannot read schema file {path}: {source}")]
    SchemaFile {
        /// Path given on the command line.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A value given on the command line does not parse as the index kind.
    #[error("'{value}' is not a valid {kind}")]
    InvalidValue {
        /// Raw argument.
        value: String,
        /// Kind the index expects.
        kind: ScalarKind,
    },

    /// Verification found inconsistent indexes.
    #[error("verification failed: {entities} inconsistent entities")]
    Inconsistent {
        /// Number of inconsistent entities.
        entities: usize,
    },

    /// A database operation failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Output could not be written.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Output could not be serialized.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Opens an existing database with the schema stored at `schema`.
pub fn open(path: &Path, schema: &Path) -> CliResult<Database> {
    let json = std::fs::read_to_string(schema).map_err(|source| CliError::SchemaFile {
        path: schema.display().to_string(),
        source,
    })?;
    let schema = Schema::from_json(&json)?;
    Ok(Database::open(
        path,
        schema,
        Config::default().create_if_missing(false),
    )?)
}

/// Parses a command-line argument as a scalar of `kind`.
pub fn parse_scalar(raw: &str, kind: ScalarKind) -> CliResult<Scalar> {
    let invalid = || CliError::InvalidValue {
        value: raw.to_string(),
        kind,
    };
    Ok(match kind {
        ScalarKind::Int => Scalar::Int(raw.parse().map_err(|_| invalid())?),
        ScalarKind::Uint => Scalar::Uint(raw.parse().map_err(|_| invalid())?),
        ScalarKind::Bool => Scalar::Bool(raw.parse().map_err(|_| invalid())?),
        ScalarKind::Text => Scalar::Text(raw.to_string()),
    })
}

/// Converts a record to a JSON object, attributes in name order.
pub fn record_to_json(record: &Record) -> Json {
    Json::Object(
        record
            .iter()
            .map(|(name, value)| (name.to_string(), value_to_json(value)))
            .collect::<Map<_, _>>(),
    )
}

fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Int(n) => Json::from(*n),
        Value::Uint(n) => Json::from(*n),
        Value::Text(s) => Json::from(s.as_str()),
        Value::Bool(b) => Json::from(*b),
        Value::Record(r) => record_to_json(r),
        Value::List(items) => Json::Array(items.iter().map(value_to_json).collect()),
    }
}

/// One output line: identifier and record.
pub fn record_line(id: i64, record: &Record) -> CliResult<String> {
    let mut line = Map::new();
    line.insert("id".to_string(), Json::from(id));
    line.insert("record".to_string(), record_to_json(record));
    Ok(serde_json::to_string(&Json::Object(line))?)
}

/// Lowercase hex of a raw key.
pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
