//! Entity schemas.
//!
//! A [`Schema`] is the set of entities a database stores. Each
//! [`EntityDescriptor`] lists typed attributes in declaration order; an
//! attribute may carry an index name, in which case every record's value for
//! it is mirrored into that secondary index.
//!
//! Schemas are built in code or loaded from JSON:
//!
//! ```
//! use lexdb_core::{EntityDescriptor, Schema, ValueKind};
//!
//! let schema = Schema::new(vec![
//!     EntityDescriptor::new("Person")
//!         .with_attribute("name", ValueKind::Text)
//!         .with_indexed("age", ValueKind::Int, "age"),
//! ])
//! .unwrap();
//!
//! let json = schema.to_json().unwrap();
//! assert_eq!(Schema::from_json(&json).unwrap(), schema);
//! ```

use crate::error::{CoreError, CoreResult};
use crate::index;
use lexdb_codec::ScalarKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Type of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Signed 64-bit integer.
    Int,
    /// Unsigned 64-bit integer.
    Uint,
    /// UTF-8 string.
    #[serde(rename = "string")]
    Text,
    /// Boolean.
    Bool,
    /// A nested record of the named entity.
    Entity(String),
    /// A sequence of values of one kind.
    List(Box<ValueKind>),
}

impl ValueKind {
    /// Shorthand for a list of `kind`.
    #[must_use]
    pub fn list(kind: ValueKind) -> Self {
        ValueKind::List(Box::new(kind))
    }

    /// Shorthand for a nested entity.
    #[must_use]
    pub fn entity(name: impl Into<String>) -> Self {
        ValueKind::Entity(name.into())
    }

    /// Returns the scalar kind, if this is a scalar.
    #[must_use]
    pub fn scalar(&self) -> Option<ScalarKind> {
        match self {
            ValueKind::Int => Some(ScalarKind::Int),
            ValueKind::Uint => Some(ScalarKind::Uint),
            ValueKind::Text => Some(ScalarKind::Text),
            ValueKind::Bool => Some(ScalarKind::Bool),
            ValueKind::Entity(_) | ValueKind::List(_) => None,
        }
    }

    /// Returns the nested entity this kind refers to, directly or as the
    /// element of a list.
    #[must_use]
    pub fn nested_entity(&self) -> Option<&str> {
        match self {
            ValueKind::Entity(name) => Some(name),
            ValueKind::List(inner) => inner.nested_entity(),
            _ => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Int => f.write_str("int"),
            ValueKind::Uint => f.write_str("uint"),
            ValueKind::Text => f.write_str("string"),
            ValueKind::Bool => f.write_str("bool"),
            ValueKind::Entity(name) => write!(f, "entity {name}"),
            ValueKind::List(inner) => write!(f, "list of {inner}"),
        }
    }
}

/// A single attribute of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    /// Attribute name.
    pub name: String,
    /// Attribute type.
    pub kind: ValueKind,
    /// Index fed by this attribute, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
}

impl AttributeDescriptor {
    /// Creates an unindexed attribute.
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            index: None,
        }
    }

    /// Tags the attribute as feeding `index`.
    #[must_use]
    pub fn indexed(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }
}

/// Description of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    name: String,
    attributes: Vec<AttributeDescriptor>,
}

impl EntityDescriptor {
    /// Creates an entity with no attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    /// Adds an attribute.
    #[must_use]
    pub fn with(mut self, attribute: AttributeDescriptor) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Adds an unindexed attribute.
    #[must_use]
    pub fn with_attribute(self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.with(AttributeDescriptor::new(name, kind))
    }

    /// Adds an attribute feeding `index`.
    #[must_use]
    pub fn with_indexed(
        self,
        name: impl Into<String>,
        kind: ValueKind,
        index: impl Into<String>,
    ) -> Self {
        self.with(AttributeDescriptor::new(name, kind).indexed(index))
    }

    /// Entity name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attributes in declaration order.
    #[must_use]
    pub fn attributes(&self) -> &[AttributeDescriptor] {
        &self.attributes
    }

    /// Looks up an attribute by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

#[derive(Serialize, Deserialize)]
struct SchemaFile {
    entities: Vec<EntityDescriptor>,
}

/// A validated set of entity descriptors.
///
/// Validation guarantees:
/// - entity and index names are non-empty and contain no `/`
/// - entity names do not start with `$` or `#`
/// - names are unique (entities globally, attributes per entity)
/// - nested entity references resolve and do not form cycles
/// - index tags sit only on scalars or lists of scalars
/// - an index name fed from several paths has a single scalar kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    entities: BTreeMap<String, EntityDescriptor>,
    indexes: BTreeMap<String, BTreeMap<String, ScalarKind>>,
}

impl Schema {
    /// Validates `entities` and builds a schema.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Schema`] describing the first problem found.
    pub fn new(entities: impl IntoIterator<Item = EntityDescriptor>) -> CoreResult<Self> {
        let mut map = BTreeMap::new();
        for entity in entities {
            validate_entity_name(&entity.name)?;
            validate_attributes(&entity)?;
            let name = entity.name.clone();
            if map.insert(name.clone(), entity).is_some() {
                return Err(CoreError::schema(format!("duplicate entity {name}")));
            }
        }

        for entity in map.values() {
            for attr in &entity.attributes {
                if let Some(target) = attr.kind.nested_entity() {
                    if !map.contains_key(target) {
                        return Err(CoreError::schema(format!(
                            "{}.{} refers to undeclared entity {target}",
                            entity.name, attr.name
                        )));
                    }
                }
            }
        }
        check_acyclic(&map)?;

        let mut indexes = BTreeMap::new();
        for name in map.keys() {
            indexes.insert(name.clone(), index::flatten_declared(&map, name)?);
        }

        Ok(Self {
            entities: map,
            indexes,
        })
    }

    /// Parses and validates a JSON schema of the form
    /// `{"entities": [{"name": .., "attributes": [..]}]}`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Schema`] if the JSON is malformed or invalid.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let file: SchemaFile =
            serde_json::from_str(json).map_err(|e| CoreError::schema(e.to_string()))?;
        Self::new(file.entities)
    }

    /// Serializes the schema as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Schema`] if serialization fails.
    pub fn to_json(&self) -> CoreResult<String> {
        let file = SchemaFile {
            entities: self.entities.values().cloned().collect(),
        };
        serde_json::to_string_pretty(&file).map_err(|e| CoreError::schema(e.to_string()))
    }

    /// Looks up an entity.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownEntity`] if it is not declared.
    pub fn entity(&self, name: &str) -> CoreResult<&EntityDescriptor> {
        self.entities
            .get(name)
            .ok_or_else(|| CoreError::unknown_entity(name))
    }

    /// Returns true if the entity is declared.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    /// Declared entity names, sorted.
    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    /// The flattened index namespace of an entity: every index reachable
    /// through its attributes, nested entities included.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownEntity`] if it is not declared.
    pub fn indexes(&self, entity: &str) -> CoreResult<&BTreeMap<String, ScalarKind>> {
        self.indexes
            .get(entity)
            .ok_or_else(|| CoreError::unknown_entity(entity))
    }

    /// Kind of one index.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownEntity`] or [`CoreError::UnknownIndex`].
    pub fn index_kind(&self, entity: &str, index: &str) -> CoreResult<ScalarKind> {
        self.indexes(entity)?
            .get(index)
            .copied()
            .ok_or_else(|| CoreError::unknown_index(entity, index))
    }
}

fn validate_entity_name(name: &str) -> CoreResult<()> {
    if name.is_empty() {
        return Err(CoreError::schema("entity name is empty"));
    }
    if name.contains('/') {
        return Err(CoreError::schema(format!("entity name {name:?} contains '/'")));
    }
    if name.starts_with('$') || name.starts_with('#') {
        return Err(CoreError::schema(format!(
            "entity name {name:?} starts with a reserved character"
        )));
    }
    Ok(())
}

fn validate_attributes(entity: &EntityDescriptor) -> CoreResult<()> {
    let mut seen = BTreeSet::new();
    for attr in &entity.attributes {
        if attr.name.is_empty() {
            return Err(CoreError::schema(format!(
                "{} has an attribute with an empty name",
                entity.name
            )));
        }
        if !seen.insert(attr.name.as_str()) {
            return Err(CoreError::schema(format!(
                "duplicate attribute {}.{}",
                entity.name, attr.name
            )));
        }
        if let ValueKind::List(inner) = &attr.kind {
            if matches!(**inner, ValueKind::List(_)) {
                return Err(CoreError::schema(format!(
                    "{}.{} is a list of lists",
                    entity.name, attr.name
                )));
            }
        }
        if let Some(index) = &attr.index {
            if index.is_empty() || index.contains('/') {
                return Err(CoreError::schema(format!(
                    "{}.{} has invalid index name {index:?}",
                    entity.name, attr.name
                )));
            }
            if attr.kind.nested_entity().is_some() {
                return Err(CoreError::schema(format!(
                    "{}.{} is a nested entity and cannot be indexed",
                    entity.name, attr.name
                )));
            }
        }
    }
    Ok(())
}

fn check_acyclic(entities: &BTreeMap<String, EntityDescriptor>) -> CoreResult<()> {
    fn visit<'a>(
        entities: &'a BTreeMap<String, EntityDescriptor>,
        name: &'a str,
        path: &mut Vec<&'a str>,
        done: &mut BTreeSet<&'a str>,
    ) -> CoreResult<()> {
        if done.contains(name) {
            return Ok(());
        }
        if path.contains(&name) {
            path.push(name);
            return Err(CoreError::schema(format!(
                "entity nesting cycle: {}",
                path.join(" -> ")
            )));
        }
        path.push(name);
        if let Some(entity) = entities.get(name) {
            for attr in &entity.attributes {
                if let Some(target) = attr.kind.nested_entity() {
                    visit(entities, target, path, done)?;
                }
            }
        }
        path.pop();
        done.insert(name);
        Ok(())
    }

    let mut done = BTreeSet::new();
    for name in entities.keys() {
        visit(entities, name, &mut Vec::new(), &mut done)?;
    }
    Ok(())
}
