//! Typed collection implementation.

use crate::collection::codec::Entity;
use crate::database::Database;
use crate::error::CoreResult;
use lexdb_codec::Scalar;
use std::marker::PhantomData;

/// A typed view of one entity.
///
/// `Collection<T>` converts between `T` and records through [`Entity`] and
/// forwards to the untyped [`Database`] operations.
///
/// # Example
///
/// ```rust,ignore
/// let people = db.collection::<Person>()?;
///
/// let id = people.create(&ada)?;
/// let same = people.get(id)?;
///
/// // Index lookup
/// for item in people.equal_on("age", 36i64)? {
///     let (id, person) = item?;
///     println!("{id}: {}", person.name);
/// }
/// ```
pub struct Collection<'db, T: Entity> {
    db: &'db Database,
    _marker: PhantomData<fn() -> T>,
}

impl<'db, T: Entity> Collection<'db, T> {
    pub(crate) fn new(db: &'db Database) -> Self {
        Self {
            db,
            _marker: PhantomData,
        }
    }

    /// Returns the entity name.
    pub fn name(&self) -> &'static str {
        T::NAME
    }

    /// Creates a record from `value` and returns its identifier.
    ///
    /// # Errors
    ///
    /// See [`Database::create`].
    pub fn create(&self, value: &T) -> CoreResult<i64> {
        self.db.create(T::NAME, &value.to_record())
    }

    /// Gets a record by identifier.
    ///
    /// # Errors
    ///
    /// See [`Database::get`]; also fails if the record does not convert.
    pub fn get(&self, id: i64) -> CoreResult<T> {
        T::from_record(&self.db.get(T::NAME, id)?)
    }

    /// Like [`get`](Self::get), returning `None` for an absent identifier.
    ///
    /// # Errors
    ///
    /// Any error of [`get`](Self::get) other than not found.
    pub fn find(&self, id: i64) -> CoreResult<Option<T>> {
        match self.get(id) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Replaces an existing record.
    ///
    /// # Errors
    ///
    /// See [`Database::update`].
    pub fn update(&self, id: i64, value: &T) -> CoreResult<()> {
        self.db.update(T::NAME, id, &value.to_record())
    }

    /// Checks if a record exists.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn exists(&self, id: i64) -> CoreResult<bool> {
        self.db.exists(T::NAME, id)
    }

    /// Iterates every record in ascending identifier order.
    ///
    /// **Warning**: This is a full scan. Prefer [`equal_on`](Self::equal_on)
    /// where an index fits.
    ///
    /// # Errors
    ///
    /// See [`Database::all_of`].
    pub fn all(&self) -> CoreResult<impl Iterator<Item = CoreResult<(i64, T)>>> {
        Ok(self
            .db
            .all_of(T::NAME)?
            .map(|item| item.and_then(|(id, record)| Ok((id, T::from_record(&record)?)))))
    }

    /// Iterates the records whose `index` holds `value`.
    ///
    /// # Errors
    ///
    /// See [`Database::equal_on`].
    pub fn equal_on(
        &self,
        index: &str,
        value: impl Into<Scalar>,
    ) -> CoreResult<impl Iterator<Item = CoreResult<(i64, T)>>> {
        Ok(self
            .db
            .equal_on(T::NAME, index, value)?
            .map(|item| item.and_then(|(id, record)| Ok((id, T::from_record(&record)?)))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::field;
    use crate::error::CoreError;
    use crate::schema::{EntityDescriptor, Schema, ValueKind};
    use lexdb_codec::{Record, Value};

    #[derive(Debug, Clone, PartialEq)]
    struct TestUser {
        name: String,
        age: i64,
        roles: Vec<String>,
    }

    impl Entity for TestUser {
        const NAME: &'static str = "User";

        fn descriptor() -> EntityDescriptor {
            EntityDescriptor::new(Self::NAME)
                .with_attribute("name", ValueKind::Text)
                .with_indexed("age", ValueKind::Int, "age")
                .with_indexed("roles", ValueKind::list(ValueKind::Text), "role")
        }

        fn to_record(&self) -> Record {
            Record::new()
                .with("name", self.name.as_str())
                .with("age", self.age)
                .with("roles", self.roles.clone())
        }

        fn from_record(record: &Record) -> CoreResult<Self> {
            Ok(Self {
                name: field(record, "name", |v| v.as_text().map(str::to_string))?,
                age: field(record, "age", Value::as_int)?,
                roles: field(record, "roles", |v| {
                    v.as_list()?
                        .iter()
                        .map(|r| r.as_text().map(str::to_string))
                        .collect()
                })?,
            })
        }
    }

    fn user(name: &str, age: i64, roles: &[&str]) -> TestUser {
        TestUser {
            name: name.to_string(),
            age,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn create_db() -> Database {
        Database::open_in_memory(Schema::new(vec![TestUser::descriptor()]).unwrap()).unwrap()
    }

    #[test]
    fn create_and_get() {
        let db = create_db();
        let users = db.collection::<TestUser>().unwrap();
        let alice = user("Alice", 30, &["admin"]);

        let id = users.create(&alice).unwrap();
        assert_eq!(users.get(id).unwrap(), alice);
        assert!(users.exists(id).unwrap());
        assert_eq!(users.name(), "User");
    }

    #[test]
    fn find_nonexistent() {
        let db = create_db();
        let users = db.collection::<TestUser>().unwrap();
        assert_eq!(users.find(42).unwrap(), None);
        assert!(matches!(users.get(42), Err(CoreError::NotFound { .. })));
    }

    #[test]
    fn update_and_query() {
        let db = create_db();
        let users = db.collection::<TestUser>().unwrap();
        let id = users.create(&user("Bob", 25, &["dev"])).unwrap();
        users.create(&user("Carol", 25, &["ops"])).unwrap();

        users.update(id, &user("Bob", 26, &["dev", "ops"])).unwrap();

        let at_25: Vec<_> = users
            .equal_on("age", 25i64)
            .unwrap()
            .map(|r| r.unwrap().1.name)
            .collect();
        assert_eq!(at_25, vec!["Carol"]);

        let ops: Vec<_> = users
            .equal_on("role", "ops")
            .unwrap()
            .map(|r| r.unwrap().1.name)
            .collect();
        assert_eq!(ops, vec!["Bob", "Carol"]);
    }

    #[test]
    fn all_in_id_order() {
        let db = create_db();
        let users = db.collection::<TestUser>().unwrap();
        for (i, name) in ["A", "B", "C"].iter().enumerate() {
            users.create(&user(name, i as i64, &[])).unwrap();
        }
        let names: Vec<_> = users.all().unwrap().map(|r| r.unwrap().1.name).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn undeclared_type_is_rejected() {
        let db = Database::open_in_memory(Schema::new(Vec::new()).unwrap()).unwrap();
        assert!(matches!(
            db.collection::<TestUser>(),
            Err(CoreError::UnknownEntity { .. })
        ));
    }
}
