//! Record payloads.
//!
//! Records are stored as CBOR maps. CBOR has one integer type, so reading a
//! payload back is driven by the entity descriptor: it decides between
//! `Int` and `Uint`, and which maps are nested records.

use crate::error::{CoreError, CoreResult};
use crate::schema::{EntityDescriptor, Schema, ValueKind};
use lexdb_codec::cbor::{cbor_i64, cbor_type_name, cbor_u64};
use lexdb_codec::{decode_cbor, encode_record, CborValue, Record, Value};

/// Checks that `record` has exactly the shape of `entity`.
///
/// # Errors
///
/// Returns [`CoreError::Encoding`] on a missing, undeclared or mistyped
/// attribute, and [`CoreError::UnknownEntity`] for an undeclared entity.
pub fn validate(schema: &Schema, entity: &str, record: &Record) -> CoreResult<()> {
    validate_record(schema, schema.entity(entity)?, record)
}

fn validate_record(schema: &Schema, descriptor: &EntityDescriptor, record: &Record) -> CoreResult<()> {
    for (name, _) in record.iter() {
        if descriptor.attribute(name).is_none() {
            return Err(CoreError::encoding(format!(
                "{} has no attribute {name}",
                descriptor.name()
            )));
        }
    }
    for attr in descriptor.attributes() {
        let value = record.get(&attr.name).ok_or_else(|| {
            CoreError::encoding(format!("{} is missing {}", descriptor.name(), attr.name))
        })?;
        validate_value(schema, &attr.kind, value).map_err(|e| match e {
            CoreError::Encoding { message } => {
                CoreError::encoding(format!("{}.{}: {message}", descriptor.name(), attr.name))
            }
            other => other,
        })?;
    }
    Ok(())
}

fn validate_value(schema: &Schema, kind: &ValueKind, value: &Value) -> CoreResult<()> {
    match (kind, value) {
        (ValueKind::Int, Value::Int(_))
        | (ValueKind::Uint, Value::Uint(_))
        | (ValueKind::Text, Value::Text(_))
        | (ValueKind::Bool, Value::Bool(_)) => Ok(()),
        (ValueKind::Entity(name), Value::Record(inner)) => {
            validate_record(schema, schema.entity(name)?, inner)
        }
        (ValueKind::List(inner), Value::List(items)) => items
            .iter()
            .try_for_each(|item| validate_value(schema, inner, item)),
        (kind, value) => Err(CoreError::encoding(format!(
            "expected {kind}, found {}",
            value.type_name()
        ))),
    }
}

/// Validates and serializes a record.
///
/// # Errors
///
/// See [`validate`].
pub fn encode(schema: &Schema, entity: &str, record: &Record) -> CoreResult<Vec<u8>> {
    validate(schema, entity, record)?;
    Ok(encode_record(record)?)
}

/// Deserializes a payload into a record of `entity`.
///
/// # Errors
///
/// Returns [`CoreError::Decoding`] if the bytes are not CBOR or do not have
/// the entity's shape.
pub fn decode(schema: &Schema, entity: &str, bytes: &[u8]) -> CoreResult<Record> {
    let descriptor = schema.entity(entity)?;
    let tree = decode_cbor(bytes)?;
    decode_record(schema, descriptor, tree)
}

fn decode_record(schema: &Schema, descriptor: &EntityDescriptor, tree: CborValue) -> CoreResult<Record> {
    let entries = match tree {
        CborValue::Map(entries) => entries,
        other => {
            return Err(CoreError::decoding(format!(
                "{} payload is a {}, not a map",
                descriptor.name(),
                cbor_type_name(&other)
            )))
        }
    };
    if entries.len() != descriptor.attributes().len() {
        return Err(CoreError::decoding(format!(
            "{} payload has {} attributes, expected {}",
            descriptor.name(),
            entries.len(),
            descriptor.attributes().len()
        )));
    }

    let mut record = Record::new();
    for (key, item) in entries {
        let CborValue::Text(name) = key else {
            return Err(CoreError::decoding(format!(
                "{} payload has a non-text key",
                descriptor.name()
            )));
        };
        let attr = descriptor.attribute(&name).ok_or_else(|| {
            CoreError::decoding(format!("{} has no attribute {name}", descriptor.name()))
        })?;
        let value = decode_value(schema, &attr.kind, item).map_err(|e| match e {
            CoreError::Decoding { message } => {
                CoreError::decoding(format!("{}.{name}: {message}", descriptor.name()))
            }
            other => other,
        })?;
        if record.set(name.clone(), value).is_some() {
            return Err(CoreError::decoding(format!(
                "{}.{name} appears twice",
                descriptor.name()
            )));
        }
    }
    Ok(record)
}

fn decode_value(schema: &Schema, kind: &ValueKind, item: CborValue) -> CoreResult<Value> {
    Ok(match (kind, item) {
        (ValueKind::Int, item) => Value::Int(cbor_i64(&item)?),
        (ValueKind::Uint, item) => Value::Uint(cbor_u64(&item)?),
        (ValueKind::Text, CborValue::Text(s)) => Value::Text(s),
        (ValueKind::Bool, CborValue::Bool(b)) => Value::Bool(b),
        (ValueKind::Entity(name), item) => {
            Value::Record(decode_record(schema, schema.entity(name)?, item)?)
        }
        (ValueKind::List(inner), CborValue::Array(items)) => Value::List(
            items
                .into_iter()
                .map(|item| decode_value(schema, inner, item))
                .collect::<CoreResult<_>>()?,
        ),
        (kind, item) => {
            return Err(CoreError::decoding(format!(
                "expected {kind}, found {}",
                cbor_type_name(&item)
            )))
        }
    })
}
