//! Dynamic record values.

use crate::lex;
use std::collections::BTreeMap;
use std::fmt;

/// A dynamic attribute value.
///
/// Records are maps from attribute name to `Value`. Only the scalar
/// variants can be indexed; see [`Scalar`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Signed integer (full i64 range).
    Int(i64),
    /// Unsigned integer (full u64 range).
    Uint(u64),
    /// Text string (UTF-8).
    Text(String),
    /// Boolean value.
    Bool(bool),
    /// Embedded record of a nested entity.
    Record(Record),
    /// Sequence of values of one kind.
    List(Vec<Value>),
}

impl Value {
    /// Returns the scalar form of this value, if it is one.
    #[must_use]
    pub fn to_scalar(&self) -> Option<Scalar> {
        match self {
            Value::Int(n) => Some(Scalar::Int(*n)),
            Value::Uint(n) => Some(Scalar::Uint(*n)),
            Value::Text(s) => Some(Scalar::Text(s.clone())),
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Record(_) | Value::List(_) => None,
        }
    }

    /// Get this value as a signed integer, if it is one.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as an unsigned integer, if it is one.
    #[must_use]
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Value::Uint(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as a string, if it is a text string.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as a boolean, if it is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as an embedded record, if it is one.
    #[must_use]
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Get this value as a list, if it is one.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Short name of the variant, for error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::Text(_) => "string",
            Value::Bool(_) => "bool",
            Value::Record(_) => "record",
            Value::List(_) => "list",
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Uint(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Uint(u64::from(n))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        match s {
            Scalar::Int(n) => Value::Int(n),
            Scalar::Uint(n) => Value::Uint(n),
            Scalar::Text(t) => Value::Text(t),
            Scalar::Bool(b) => Value::Bool(b),
        }
    }
}

/// The attribute values of one record, keyed by attribute name.
///
/// # Example
///
/// ```
/// use lexdb_codec::{Record, Value};
///
/// let person = Record::new().with("age", 30i64).with("name", "Ada");
/// assert_eq!(person.get("age"), Some(&Value::Int(30)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets an attribute, returning the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    /// Looks up an attribute.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Removes an attribute.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Returns true if the attribute is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record has no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates attributes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Kind of an indexable value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScalarKind {
    /// Signed integer.
    Int,
    /// Unsigned integer.
    Uint,
    /// Text string.
    Text,
    /// Boolean.
    Bool,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScalarKind::Int => "int",
            ScalarKind::Uint => "uint",
            ScalarKind::Text => "string",
            ScalarKind::Bool => "bool",
        })
    }
}

/// An indexable value: the subset of [`Value`] with an order-preserving
/// key encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scalar {
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    Uint(u64),
    /// Text string.
    Text(String),
    /// Boolean.
    Bool(bool),
}

impl Scalar {
    /// Returns the kind of this scalar.
    #[must_use]
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Int(_) => ScalarKind::Int,
            Scalar::Uint(_) => ScalarKind::Uint,
            Scalar::Text(_) => ScalarKind::Text,
            Scalar::Bool(_) => ScalarKind::Bool,
        }
    }

    /// Appends the order-preserving encoding of this scalar.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        match self {
            Scalar::Int(n) => lex::encode_i64(*n, buf),
            Scalar::Uint(n) => lex::encode_u64(*n, buf),
            Scalar::Text(s) => lex::encode_str(s, buf),
            Scalar::Bool(b) => lex::encode_bool(*b, buf),
        }
    }

    /// Returns the order-preserving encoding of this scalar.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode_into(&mut buf);
        buf
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Int(n)
    }
}

impl From<i32> for Scalar {
    fn from(n: i32) -> Self {
        Scalar::Int(i64::from(n))
    }
}

impl From<u64> for Scalar {
    fn from(n: u64) -> Self {
        Scalar::Uint(n)
    }
}

impl From<u32> for Scalar {
    fn from(n: u32) -> Self {
        Scalar::Uint(u64::from(n))
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(n) => write!(f, "{n}"),
            Scalar::Uint(n) => write!(f, "{n}"),
            Scalar::Text(s) => write!(f, "{s:?}"),
            Scalar::Bool(b) => write!(f, "{b}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_builder_and_accessors() {
        let mut r = Record::new().with("age", 30i64).with("name", "Ada");
        assert_eq!(r.len(), 2);
        assert_eq!(r.get("age").and_then(Value::as_int), Some(30));
        assert_eq!(r.get("name").and_then(Value::as_text), Some("Ada"));
        assert_eq!(r.set("age", 31i64), Some(Value::Int(30)));
        assert!(r.contains("name"));
        assert_eq!(r.remove("name"), Some(Value::Text("Ada".into())));
        assert!(!r.contains("name"));
    }

    #[test]
    fn record_iterates_in_name_order() {
        let r = Record::new().with("z", 1i64).with("a", 2i64);
        let names: Vec<_> = r.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["a", "z"]);
    }

    #[test]
    fn to_scalar_only_for_scalars() {
        assert_eq!(Value::Int(1).to_scalar(), Some(Scalar::Int(1)));
        assert_eq!(Value::Bool(true).to_scalar(), Some(Scalar::Bool(true)));
        assert_eq!(Value::List(vec![]).to_scalar(), None);
        assert_eq!(Value::Record(Record::new()).to_scalar(), None);
    }

    #[test]
    fn from_impls() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(42i64), Value::Int(42));
        assert_eq!(Value::from(42i32), Value::Int(42));
        assert_eq!(Value::from(42u64), Value::Uint(42));
        assert_eq!(Value::from(42u32), Value::Uint(42));
        assert_eq!(Value::from("hello"), Value::Text("hello".to_string()));
        assert_eq!(
            Value::from(vec![1i64, 2]),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
        assert_eq!(Value::from(Scalar::Uint(7)), Value::Uint(7));
    }

    #[test]
    fn scalar_encoding_matches_kind() {
        assert_eq!(Scalar::Int(0).encode(), vec![lex::INT_ZERO]);
        assert_eq!(Scalar::Bool(true).encode(), vec![lex::TRUE_BYTE]);
        assert_eq!(Scalar::from("ab").encode(), b"ab".to_vec());
        assert_eq!(Scalar::Uint(3).kind(), ScalarKind::Uint);
    }

    #[test]
    fn scalar_display() {
        assert_eq!(Scalar::Int(-4).to_string(), "-4");
        assert_eq!(Scalar::from("x").to_string(), "\"x\"");
        assert_eq!(ScalarKind::Text.to_string(), "string");
    }
}
