//! Store key layout.
//!
//! All keys live in one ordered namespace:
//!
//! | kind        | layout                                        | value            |
//! |-------------|-----------------------------------------------|------------------|
//! | primary     | `entity / lex(id)`                            | CBOR record      |
//! | index entry | `$ entity / index / lex(value) / lex(id)`     | empty            |
//! | sequence    | `# seq / entity`                              | lex(next id)     |
//!
//! Entity names never contain `/` and never start with `$` or `#`, so the
//! three kinds cannot overlap and `entity/` only ever matches primary keys
//! of that entity. The identifier is always the last segment; it is
//! recovered by stripping the scan prefix and decoding what is left as
//! exactly one integer.

use crate::error::CoreResult;
use lexdb_codec::{lex_decode_exact, Scalar};

/// Segment separator.
pub const SEPARATOR: u8 = b'/';

/// Leading byte of every index entry.
pub const INDEX_MARKER: u8 = b'$';

/// Leading byte of every metadata key.
pub const META_MARKER: u8 = b'#';

/// Prefix of every primary key of `entity`.
#[must_use]
pub fn primary_prefix(entity: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(entity.len() + 1);
    key.extend_from_slice(entity.as_bytes());
    key.push(SEPARATOR);
    key
}

/// Primary key of one record.
#[must_use]
pub fn primary_key(entity: &str, id: i64) -> Vec<u8> {
    let mut key = primary_prefix(entity);
    lexdb_codec::lex::encode_i64(id, &mut key);
    key
}

/// Prefix of every index entry of `entity`, across all its indexes.
#[must_use]
pub fn index_namespace(entity: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(entity.len() + 2);
    key.push(INDEX_MARKER);
    key.extend_from_slice(entity.as_bytes());
    key.push(SEPARATOR);
    key
}

/// Prefix of every entry of one index, ending with the separator.
#[must_use]
pub fn index_prefix(entity: &str, index: &str) -> Vec<u8> {
    let mut key = index_namespace(entity);
    key.extend_from_slice(index.as_bytes());
    key.push(SEPARATOR);
    key
}

/// Prefix of every entry of one index holding `value`.
#[must_use]
pub fn index_value_prefix(entity: &str, index: &str, value: &Scalar) -> Vec<u8> {
    let mut key = index_prefix(entity, index);
    value.encode_into(&mut key);
    key.push(SEPARATOR);
    key
}

/// Full index entry key.
#[must_use]
pub fn index_key(entity: &str, index: &str, value: &Scalar, id: i64) -> Vec<u8> {
    let mut key = index_value_prefix(entity, index, value);
    lexdb_codec::lex::encode_i64(id, &mut key);
    key
}

/// Key of the identifier counter of `entity`.
#[must_use]
pub fn sequence_key(entity: &str) -> Vec<u8> {
    let mut key = vec![META_MARKER];
    key.extend_from_slice(b"seq");
    key.push(SEPARATOR);
    key.extend_from_slice(entity.as_bytes());
    key
}

/// Recovers the identifier of a key found under `prefix`.
///
/// Returns `None` if `key` does not start with `prefix` or if the rest is
/// not exactly one integer encoding. Under an index value prefix the latter
/// means the entry belongs to a longer value (`"a/b"` seen while looking
/// for `"a"`).
#[must_use]
pub fn identifier_after(prefix: &[u8], key: &[u8]) -> Option<i64> {
    let rest = key.strip_prefix(prefix)?;
    lex_decode_exact::<i64>(rest).ok()
}

/// Like [`identifier_after`] for keys that must hold an identifier.
///
/// # Errors
///
/// Returns [`CoreError::MalformedEncoding`](crate::CoreError::MalformedEncoding)
/// if the remainder is not exactly one integer encoding.
pub fn parse_identifier(prefix: &[u8], key: &[u8]) -> CoreResult<i64> {
    let rest = key.strip_prefix(prefix).unwrap_or(key);
    Ok(lex_decode_exact::<i64>(rest)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexdb_codec::LexEncode;

    #[test]
    fn primary_layout() {
        let key = primary_key("Person", 5);
        assert_eq!(&key[..7], b"Person/");
        assert_eq!(&key[7..], 5i64.lex_encode().as_slice());
        assert!(key.starts_with(&primary_prefix("Person")));
        assert!(!key.starts_with(&primary_prefix("Pers")));
    }

    #[test]
    fn index_layout() {
        let value = Scalar::Int(30);
        let key = index_key("Person", "age", &value, 9);
        let mut expected = b"$Person/age/".to_vec();
        expected.extend(30i64.lex_encode());
        expected.push(b'/');
        expected.extend(9i64.lex_encode());
        assert_eq!(key, expected);

        assert!(key.starts_with(&index_namespace("Person")));
        assert!(key.starts_with(&index_prefix("Person", "age")));
        assert!(!key.starts_with(&index_prefix("Person", "ag")));
        assert!(!key.starts_with(&primary_prefix("Person")));
    }

    #[test]
    fn sequence_key_is_outside_entity_space() {
        let key = sequence_key("Person");
        assert_eq!(key, b"#seq/Person".to_vec());
        assert!(!key.starts_with(&primary_prefix("Person")));
        assert!(!key.starts_with(&index_namespace("Person")));
    }

    #[test]
    fn identifier_recovery() {
        for id in [0i64, 1, 47, 0x2f2f, -0x2f, i64::MIN, i64::MAX] {
            let prefix = index_value_prefix("E", "i", &Scalar::from("v"));
            let key = index_key("E", "i", &Scalar::from("v"), id);
            assert_eq!(identifier_after(&prefix, &key), Some(id));
            assert_eq!(parse_identifier(&primary_prefix("E"), &primary_key("E", id)).unwrap(), id);
        }
    }

    #[test]
    fn longer_string_value_is_not_a_match() {
        let prefix = index_value_prefix("E", "i", &Scalar::from("a"));
        let other = index_key("E", "i", &Scalar::from("a/b"), 3);
        assert!(other.starts_with(&prefix));
        assert_eq!(identifier_after(&prefix, &other), None);
    }

    #[test]
    fn parse_identifier_rejects_garbage() {
        let mut key = primary_prefix("E");
        key.push(0xfe);
        assert!(parse_identifier(&primary_prefix("E"), &key).is_err());
    }
}
