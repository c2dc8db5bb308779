//! Entity trait for typed collections.

use crate::error::{CoreError, CoreResult};
use crate::schema::EntityDescriptor;
use lexdb_codec::{Record, Value};

/// Trait for Rust types stored as records of one entity.
///
/// # Example
///
/// ```
/// use lexdb_core::{field, CoreResult, Entity, EntityDescriptor, Record, ValueKind};
///
/// struct City {
///     name: String,
///     population: u64,
/// }
///
/// impl Entity for City {
///     const NAME: &'static str = "City";
///
///     fn descriptor() -> EntityDescriptor {
///         EntityDescriptor::new(Self::NAME)
///             .with_indexed("name", ValueKind::Text, "name")
///             .with_attribute("population", ValueKind::Uint)
///     }
///
///     fn to_record(&self) -> Record {
///         Record::new()
///             .with("name", self.name.as_str())
///             .with("population", self.population)
///     }
///
///     fn from_record(record: &Record) -> CoreResult<Self> {
///         Ok(City {
///             name: field(record, "name", |v| v.as_text().map(str::to_string))?,
///             population: field(record, "population", |v| v.as_uint())?,
///         })
///     }
/// }
/// ```
pub trait Entity: Sized {
    /// Entity name in the schema.
    const NAME: &'static str;

    /// Descriptor to include in the schema.
    fn descriptor() -> EntityDescriptor;

    /// Converts to a record of the entity's shape.
    fn to_record(&self) -> Record;

    /// Converts back from a stored record.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Decoding`] if the record lacks a field or holds
    /// one of the wrong kind.
    fn from_record(record: &Record) -> CoreResult<Self>;
}

/// Reads one attribute of `record` through `convert`.
///
/// # Errors
///
/// Returns [`CoreError::Decoding`] if the attribute is missing or `convert`
/// returns `None`.
pub fn field<T>(
    record: &Record,
    name: &str,
    convert: impl FnOnce(&Value) -> Option<T>,
) -> CoreResult<T> {
    let value = record
        .get(name)
        .ok_or_else(|| CoreError::decoding(format!("missing attribute {name}")))?;
    convert(value).ok_or_else(|| {
        CoreError::decoding(format!(
            "attribute {name} has unexpected kind {}",
            value.type_name()
        ))
    })
}
