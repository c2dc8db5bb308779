//! Cross-crate integration test helpers.
//!
//! [`IndexHarness`] mirrors every write into an in-memory model and checks
//! that the database's queries agree with it.

use crate::schemas::{person_schema, Person};
use lexdb_core::{CoreResult, Database, Record};
use std::collections::{BTreeMap, BTreeSet};

/// A test harness tracking the expected contents of the `Person` entity.
pub struct IndexHarness {
    /// The database instance.
    pub db: Database,
    model: BTreeMap<i64, Person>,
}

impl IndexHarness {
    /// Creates a new harness with an in-memory database.
    pub fn new() -> Self {
        Self::with_database(
            Database::open_in_memory(person_schema()).expect("Failed to open database"),
        )
    }

    /// Creates a harness over an existing, empty database using the sample
    /// schema.
    pub fn with_database(db: Database) -> Self {
        Self {
            db,
            model: BTreeMap::new(),
        }
    }

    /// Creates a person and tracks it.
    pub fn create(&mut self, person: Person) -> i64 {
        let id = self
            .db
            .collection::<Person>()
            .and_then(|people| people.create(&person))
            .expect("Failed to create person");
        self.model.insert(id, person);
        id
    }

    /// Updates the `n`-th tracked person (modulo the count). Does nothing
    /// while the model is empty.
    pub fn update_nth(&mut self, n: usize, person: Person) -> Option<i64> {
        if self.model.is_empty() {
            return None;
        }
        let id = *self.model.keys().nth(n % self.model.len())?;
        self.db
            .collection::<Person>()
            .and_then(|people| people.update(id, &person))
            .expect("Failed to update person");
        self.model.insert(id, person);
        Some(id)
    }

    /// Identifiers currently tracked.
    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.model.keys().copied()
    }

    /// Asserts that every record and every index agrees with the model.
    pub fn check(&self) {
        let people = self.db.collection::<Person>().expect("Person is declared");
        for (id, expected) in &self.model {
            assert_eq!(&people.get(*id).expect("Failed to get person"), expected);
        }

        let all: Vec<i64> = self
            .db
            .all_of("Person")
            .expect("Failed to scan")
            .map(|r| r.map(|(id, _)| id))
            .collect::<CoreResult<_>>()
            .expect("Failed to read scan");
        assert_eq!(all, self.model.keys().copied().collect::<Vec<_>>());

        for age in self.model.values().map(|p| p.age).collect::<BTreeSet<_>>() {
            self.assert_index("age", age, |p| p.age == age);
        }
        let emails: BTreeSet<&String> = self.model.values().flat_map(|p| &p.emails).collect();
        for email in emails {
            self.assert_index("email", email.as_str(), |p| p.emails.contains(email));
        }
        let cities: BTreeSet<&String> = self.model.values().map(|p| &p.home.city).collect();
        for city in cities {
            self.assert_index("city", city.as_str(), |p| &p.home.city == city);
        }

        let report = self.db.verify("Person").expect("Failed to verify");
        assert!(report.is_consistent(), "inconsistent indexes: {report:?}");
    }

    fn assert_index(
        &self,
        index: &str,
        value: impl Into<lexdb_core::Scalar> + Copy + std::fmt::Debug,
        matches: impl Fn(&Person) -> bool,
    ) {
        let expected: Vec<(i64, Record)> = self
            .model
            .iter()
            .filter(|(_, p)| matches(p))
            .map(|(id, p)| (*id, lexdb_core::Entity::to_record(p)))
            .collect();
        let actual: Vec<(i64, Record)> = self
            .db
            .equal_on("Person", index, value)
            .expect("Failed to query index")
            .collect::<CoreResult<_>>()
            .expect("Failed to read index");
        assert_eq!(actual, expected, "index {index} = {value:?}");
    }
}

impl Default for IndexHarness {
    fn default() -> Self {
        Self::new()
    }
}
