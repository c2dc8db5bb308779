//! CBOR encoding of record payloads.
//!
//! Records are stored as CBOR maps keyed by attribute name. The CBOR data
//! model has a single integer type, so decoding back into [`Value`] needs
//! the schema; this module only produces and parses the raw [`CborValue`]
//! tree and leaves the typed reconstruction to the caller.

use crate::error::{CodecError, CodecResult};
use crate::value::{Record, Value};

pub use ciborium::value::Value as CborValue;

/// Converts a value into its CBOR tree.
#[must_use]
pub fn to_cbor_value(value: &Value) -> CborValue {
    match value {
        Value::Int(n) => CborValue::Integer((*n).into()),
        Value::Uint(n) => CborValue::Integer((*n).into()),
        Value::Text(s) => CborValue::Text(s.clone()),
        Value::Bool(b) => CborValue::Bool(*b),
        Value::Record(r) => record_to_cbor_value(r),
        Value::List(items) => CborValue::Array(items.iter().map(to_cbor_value).collect()),
    }
}

/// Converts a record into a CBOR map keyed by attribute name.
#[must_use]
pub fn record_to_cbor_value(record: &Record) -> CborValue {
    CborValue::Map(
        record
            .iter()
            .map(|(name, v)| (CborValue::Text(name.to_string()), to_cbor_value(v)))
            .collect(),
    )
}

/// Serializes a record payload.
///
/// Attribute order follows [`Record::iter`], so equal records produce equal
/// bytes.
///
/// # Errors
///
/// Returns [`CodecError::EncodingFailed`] if serialization fails.
pub fn encode_record(record: &Record) -> CodecResult<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(&record_to_cbor_value(record), &mut buf)
        .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
    Ok(buf)
}

/// Parses a payload into its raw CBOR tree.
///
/// # Errors
///
/// Returns [`CodecError::DecodingFailed`] if the bytes are not one complete
/// CBOR item.
pub fn decode_cbor(bytes: &[u8]) -> CodecResult<CborValue> {
    let mut reader = bytes;
    let value: CborValue = ciborium::de::from_reader(&mut reader)
        .map_err(|e| CodecError::decoding_failed(e.to_string()))?;
    if !reader.is_empty() {
        return Err(CodecError::decoding_failed(format!(
            "{} trailing bytes after payload",
            reader.len()
        )));
    }
    Ok(value)
}

/// Extracts a signed integer from a CBOR integer.
///
/// # Errors
///
/// Returns [`CodecError::DecodingFailed`] if the item is not an integer in
/// the i64 range.
pub fn cbor_i64(value: &CborValue) -> CodecResult<i64> {
    match value {
        CborValue::Integer(n) => i64::try_from(i128::from(*n))
            .map_err(|_| CodecError::decoding_failed("integer out of i64 range")),
        other => Err(CodecError::decoding_failed(format!(
            "expected integer, found {}",
            cbor_type_name(other)
        ))),
    }
}

/// Extracts an unsigned integer from a CBOR integer.
///
/// # Errors
///
/// Returns [`CodecError::DecodingFailed`] if the item is not an integer in
/// the u64 range.
pub fn cbor_u64(value: &CborValue) -> CodecResult<u64> {
    match value {
        CborValue::Integer(n) => u64::try_from(i128::from(*n))
            .map_err(|_| CodecError::decoding_failed("integer out of u64 range")),
        other => Err(CodecError::decoding_failed(format!(
            "expected integer, found {}",
            cbor_type_name(other)
        ))),
    }
}

/// Short name of a CBOR item's type, for error messages.
#[must_use]
pub fn cbor_type_name(value: &CborValue) -> &'static str {
    match value {
        CborValue::Integer(_) => "integer",
        CborValue::Bytes(_) => "bytes",
        CborValue::Float(_) => "float",
        CborValue::Text(_) => "text",
        CborValue::Bool(_) => "bool",
        CborValue::Null => "null",
        CborValue::Tag(..) => "tag",
        CborValue::Array(_) => "array",
        CborValue::Map(_) => "map",
        _ => "unknown",
    }
}
