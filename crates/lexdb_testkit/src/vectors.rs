//! Known-answer vectors for the key encoding.
//!
//! The byte layout of keys is part of the on-disk format; these vectors pin
//! it down so an accidental change fails loudly.

use lexdb_codec::{lex_decode_exact, LexDecode, LexEncode};
use lexdb_core::{keys, Scalar};
use serde::{Deserialize, Serialize};

/// A test vector: a value and its expected encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// Input value, as text.
    pub input: String,
    /// Expected encoding (hex).
    pub expected_hex: String,
}

fn vector(id: &str, description: &str, input: impl ToString, expected_hex: &str) -> TestVector {
    TestVector {
        id: id.into(),
        description: description.into(),
        input: input.to_string(),
        expected_hex: expected_hex.into(),
    }
}

/// Signed integer encoding vectors.
pub fn int_encoding_vectors() -> Vec<TestVector> {
    vec![
        vector("int_zero", "zero sits in the tag", 0, "88"),
        vector("int_one", "small positive", 1, "89"),
        vector("int_small_max", "largest single-byte value", 109, "f5"),
        vector("int_110", "first one-byte magnitude", 110, "f66e"),
        vector("int_255", "largest one-byte magnitude", 255, "f6ff"),
        vector("int_256", "two-byte magnitude", 256, "f70100"),
        vector("int_max", "i64::MAX", i64::MAX, "fd7fffffffffffffff"),
        vector("int_minus_one", "negative one", -1, "87ff"),
        vector("int_minus_255", "narrowest negative width limit", -255, "8701"),
        vector("int_minus_256", "two-byte negative", -256, "86ff00"),
        vector("int_min", "i64::MIN", i64::MIN, "808000000000000000"),
    ]
}

/// Key layout vectors for a `Person` entity with an `age` index.
pub fn key_layout_vectors() -> Vec<TestVector> {
    vec![
        vector("primary_key_hex", "Person/lex(5)", "Person 5", "506572736f6e2f8d"),
        vector(
            "index_key_hex",
            "$Person/age/lex(30)/lex(1)",
            "Person age 30 1",
            "24506572736f6e2f6167652fa62f89",
        ),
        vector("sequence_key_hex", "#seq/Person", "Person", "237365712f506572736f6e"),
    ]
}

/// Lowercase hex of `bytes`.
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Checks every integer vector both ways. Returns the ids that failed.
pub fn check_int_vectors() -> Vec<String> {
    int_encoding_vectors()
        .into_iter()
        .filter(|v| {
            let Ok(value) = v.input.parse::<i64>() else {
                return true;
            };
            let encoded = value.lex_encode();
            let decoded = lex_decode_exact::<i64>(&encoded).ok();
            to_hex(&encoded) != v.expected_hex || decoded != Some(value)
        })
        .map(|v| v.id)
        .collect()
}

/// Checks the key layout vectors. Returns the ids that failed.
pub fn check_key_vectors() -> Vec<String> {
    let actual = [
        ("primary_key_hex", keys::primary_key("Person", 5)),
        (
            "index_key_hex",
            keys::index_key("Person", "age", &Scalar::Int(30), 1),
        ),
        ("sequence_key_hex", keys::sequence_key("Person")),
    ];
    key_layout_vectors()
        .into_iter()
        .filter(|v| match actual.iter().find(|(id, _)| *id == v.id) {
            Some((_, key)) => to_hex(key) != v.expected_hex,
            None => true,
        })
        .map(|v| v.id)
        .collect()
}

/// Decodes `bytes` as one `T`, for vector consumers outside this crate.
pub fn decode_vector<T: LexDecode>(bytes: &[u8]) -> Option<T> {
    lex_decode_exact(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_int_vectors_pass() {
        assert_eq!(check_int_vectors(), Vec::<String>::new());
    }

    #[test]
    fn all_key_vectors_pass() {
        assert_eq!(check_key_vectors(), Vec::<String>::new());
    }

    #[test]
    fn vectors_serialize_to_json() {
        let json = serde_json::to_string(&int_encoding_vectors()).unwrap();
        let back: Vec<TestVector> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), int_encoding_vectors().len());
    }

    #[test]
    fn decode_vector_rejects_trailing_bytes() {
        assert_eq!(decode_vector::<i64>(&[0x88]), Some(0));
        assert_eq!(decode_vector::<i64>(&[0x88, 0x00]), None);
    }
}
