//! Secondary index maintenance.
//!
//! Every indexed attribute reachable from an entity, through nested
//! entities and lists of them, feeds the owning entity's index namespace.
//! [`index_entries`] derives the complete set of entry keys of one record;
//! [`IndexDelta`] turns two such sets into the minimal set of store writes.

use crate::error::{CoreError, CoreResult};
use crate::keys;
use crate::schema::{EntityDescriptor, Schema, ValueKind};
use lexdb_codec::{Record, Scalar, ScalarKind, Value};
use lexdb_storage::WriteBatch;
use std::collections::{BTreeMap, BTreeSet};

/// Every index reachable from `entity`, with the kind of value it holds.
///
/// # Errors
///
/// Returns [`CoreError::UnknownEntity`] if the entity is not declared.
pub fn declared_indexes(schema: &Schema, entity: &str) -> CoreResult<BTreeMap<String, ScalarKind>> {
    schema.indexes(entity).cloned()
}

/// Walks the entity graph from `entity`. The graph must be acyclic.
pub(crate) fn flatten_declared(
    entities: &BTreeMap<String, EntityDescriptor>,
    entity: &str,
) -> CoreResult<BTreeMap<String, ScalarKind>> {
    let mut out = BTreeMap::new();
    collect_declared(entities, entity, &mut out)?;
    Ok(out)
}

fn collect_declared(
    entities: &BTreeMap<String, EntityDescriptor>,
    entity: &str,
    out: &mut BTreeMap<String, ScalarKind>,
) -> CoreResult<()> {
    let descriptor = entities
        .get(entity)
        .ok_or_else(|| CoreError::unknown_entity(entity))?;
    for attr in descriptor.attributes() {
        if let Some(nested) = attr.kind.nested_entity() {
            collect_declared(entities, nested, out)?;
            continue;
        }
        let Some(index) = &attr.index else { continue };
        let kind = match &attr.kind {
            ValueKind::List(inner) => inner.scalar(),
            other => other.scalar(),
        }
        .ok_or_else(|| CoreError::schema(format!("{entity}.{} cannot be indexed", attr.name)))?;
        match out.get(index) {
            Some(existing) if *existing != kind => {
                return Err(CoreError::schema(format!(
                    "index {index} reachable from {entity} is fed with both {existing} and {kind}"
                )));
            }
            _ => {
                out.insert(index.clone(), kind);
            }
        }
    }
    Ok(())
}

/// The full set of index entry keys of one record.
///
/// Scalar attributes give one key, lists of scalars one key per distinct
/// element, and nested records contribute their own indexed attributes
/// under the owning entity.
///
/// # Errors
///
/// Returns [`CoreError::UnknownEntity`] for an undeclared entity and
/// [`CoreError::Encoding`] if the record does not have the entity's shape.
pub fn index_entries(
    schema: &Schema,
    entity: &str,
    record: &Record,
    id: i64,
) -> CoreResult<BTreeSet<Vec<u8>>> {
    let mut out = BTreeSet::new();
    collect_entries(schema, schema.entity(entity)?, record, &mut |index: &str, value: &Scalar| {
        out.insert(keys::index_key(entity, index, value, id));
    })?;
    Ok(out)
}

fn collect_entries(
    schema: &Schema,
    descriptor: &EntityDescriptor,
    record: &Record,
    emit: &mut dyn FnMut(&str, &Scalar),
) -> CoreResult<()> {
    for attr in descriptor.attributes() {
        let value = record.get(&attr.name).ok_or_else(|| {
            CoreError::encoding(format!("{} is missing {}", descriptor.name(), attr.name))
        })?;
        match (&attr.kind, value) {
            (ValueKind::Entity(nested), Value::Record(inner)) => {
                collect_entries(schema, schema.entity(nested)?, inner, emit)?;
            }
            (ValueKind::List(kind), Value::List(items)) => {
                for item in items {
                    match (kind.as_ref(), item) {
                        (ValueKind::Entity(nested), Value::Record(inner)) => {
                            collect_entries(schema, schema.entity(nested)?, inner, emit)?;
                        }
                        _ => {
                            if let Some(index) = &attr.index {
                                emit(index, &scalar_of(descriptor, &attr.name, kind, item)?);
                            }
                        }
                    }
                }
            }
            (kind, value) => {
                if let Some(index) = &attr.index {
                    emit(index, &scalar_of(descriptor, &attr.name, kind, value)?);
                }
            }
        }
    }
    Ok(())
}

fn scalar_of(
    descriptor: &EntityDescriptor,
    attribute: &str,
    kind: &ValueKind,
    value: &Value,
) -> CoreResult<Scalar> {
    match (kind.scalar(), value.to_scalar()) {
        (Some(expected), Some(scalar)) if scalar.kind() == expected => Ok(scalar),
        _ => Err(CoreError::encoding(format!(
            "{}.{attribute} expects {kind}, found {}",
            descriptor.name(),
            value.type_name()
        ))),
    }
}

/// Store writes turning one index entry set into another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexDelta {
    /// Entries to delete.
    pub removed: Vec<Vec<u8>>,
    /// Entries to put.
    pub added: Vec<Vec<u8>>,
}

impl IndexDelta {
    /// Computes `old − new` as removals and `new − old` as additions.
    /// Keys in both sets are left alone.
    #[must_use]
    pub fn between(old: &BTreeSet<Vec<u8>>, new: &BTreeSet<Vec<u8>>) -> Self {
        Self {
            removed: old.difference(new).cloned().collect(),
            added: new.difference(old).cloned().collect(),
        }
    }

    /// Returns true if nothing changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }

    /// Appends the deletes, then the puts, to `batch`.
    pub fn apply_to(self, batch: &mut WriteBatch) {
        for key in self.removed {
            batch.delete(key);
        }
        for key in self.added {
            batch.put(key, Vec::new());
        }
    }
}
