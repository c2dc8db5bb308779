//! Sample schemas and typed entities.
//!
//! `Person` owns an indexed age, a list of indexed emails and a nested
//! `Address` whose city is indexed; together they exercise every kind of
//! index flattening.

use lexdb_core::{
    field, CoreResult, Entity, EntityDescriptor, Record, Schema, Value, ValueKind,
};

/// A postal address, stored nested inside [`Person`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// Street line.
    pub street: String,
    /// City, indexed as `city` on the owning entity.
    pub city: String,
}

/// A person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    /// Display name.
    pub name: String,
    /// Age, indexed as `age`.
    pub age: i64,
    /// Email addresses, each indexed as `email`.
    pub emails: Vec<String>,
    /// Home address.
    pub home: Address,
}

impl Address {
    /// Creates an address.
    pub fn new(street: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            street: street.into(),
            city: city.into(),
        }
    }
}

impl Person {
    /// A deterministic sample person, varied by `n`.
    pub fn sample(n: usize) -> Self {
        const CITIES: [&str; 4] = ["Oslo", "Lima", "Pune", "Kyiv"];
        Self {
            name: format!("person-{n}"),
            age: (n % 90) as i64,
            emails: vec![format!("p{n}@example.com")],
            home: Address::new(format!("{n} Main St"), CITIES[n % CITIES.len()]),
        }
    }
}

impl Entity for Address {
    const NAME: &'static str = "Address";

    fn descriptor() -> EntityDescriptor {
        EntityDescriptor::new(Self::NAME)
            .with_attribute("street", ValueKind::Text)
            .with_indexed("city", ValueKind::Text, "city")
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("street", self.street.as_str())
            .with("city", self.city.as_str())
    }

    fn from_record(record: &Record) -> CoreResult<Self> {
        Ok(Self {
            street: field(record, "street", text)?,
            city: field(record, "city", text)?,
        })
    }
}

impl Entity for Person {
    const NAME: &'static str = "Person";

    fn descriptor() -> EntityDescriptor {
        EntityDescriptor::new(Self::NAME)
            .with_attribute("name", ValueKind::Text)
            .with_indexed("age", ValueKind::Int, "age")
            .with_indexed("emails", ValueKind::list(ValueKind::Text), "email")
            .with_attribute("home", ValueKind::entity(Address::NAME))
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("name", self.name.as_str())
            .with("age", self.age)
            .with("emails", self.emails.clone())
            .with("home", self.home.to_record())
    }

    fn from_record(record: &Record) -> CoreResult<Self> {
        let home = field(record, "home", |v| v.as_record().cloned())?;
        Ok(Self {
            name: field(record, "name", text)?,
            age: field(record, "age", Value::as_int)?,
            emails: field(record, "emails", |v| {
                v.as_list()?.iter().map(text).collect()
            })?,
            home: Address::from_record(&home)?,
        })
    }
}

fn text(value: &Value) -> Option<String> {
    value.as_text().map(str::to_string)
}

/// Schema holding [`Person`] and [`Address`].
///
/// # Panics
///
/// Never; the descriptors are valid.
pub fn person_schema() -> Schema {
    Schema::new(vec![Person::descriptor(), Address::descriptor()])
        .expect("sample schema is valid")
}

/// The sample schema as JSON, as a CLI user would write it.
pub const PERSON_SCHEMA_JSON: &str = r#"{
  "entities": [
    {
      "name": "Person",
      "attributes": [
        { "name": "name", "kind": "string" },
        { "name": "age", "kind": "int", "index": "age" },
        { "name": "emails", "kind": { "list": "string" }, "index": "email" },
        { "name": "home", "kind": { "entity": "Address" } }
      ]
    },
    {
      "name": "Address",
      "attributes": [
        { "name": "street", "kind": "string" },
        { "name": "city", "kind": "string", "index": "city" }
      ]
    }
  ]
}"#;
