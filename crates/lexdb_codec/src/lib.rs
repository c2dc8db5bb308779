//! # LexDB Codec
//!
//! Encodings used by LexDB.
//!
//! This crate provides:
//! - An order-preserving ("lexicographic") encoding for integers, strings
//!   and booleans, used inside store keys
//! - The dynamic [`Value`] / [`Record`] model
//! - CBOR serialization of record payloads
//!
//! ## Order preservation
//!
//! For any two values `a` and `b` of the same kind, `a < b` if and only if
//! the encoding of `a` sorts before the encoding of `b` as bytes. Integer
//! encodings are also self-delimiting: the first byte gives the length.
//!
//! ## Usage
//!
//! ```
//! use lexdb_codec::{LexDecode, LexEncode};
//!
//! let a = (-5i64).lex_encode();
//! let b = 300i64.lex_encode();
//! assert!(a < b);
//!
//! let (decoded, consumed) = i64::lex_decode(&b).unwrap();
//! assert_eq!((decoded, consumed), (300, b.len()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod cbor;
mod error;
pub mod lex;
mod value;

pub use cbor::{decode_cbor, encode_record, CborValue};
pub use error::{CodecError, CodecResult};
pub use value::{Record, Scalar, ScalarKind, Value};

/// Types with an order-preserving byte encoding.
pub trait LexEncode {
    /// Appends the encoding to `buf`.
    fn lex_encode_into(&self, buf: &mut Vec<u8>);

    /// Returns the encoding.
    fn lex_encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.lex_encode_into(&mut buf);
        buf
    }
}

/// Types that can be decoded from their order-preserving encoding.
pub trait LexDecode: Sized {
    /// Decodes a value from the start of `bytes`, returning it with the
    /// number of bytes consumed.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::MalformedEncoding`] on truncated or invalid input.
    fn lex_decode(bytes: &[u8]) -> CodecResult<(Self, usize)>;
}

impl LexEncode for i64 {
    fn lex_encode_into(&self, buf: &mut Vec<u8>) {
        lex::encode_i64(*self, buf);
    }
}

impl LexEncode for u64 {
    fn lex_encode_into(&self, buf: &mut Vec<u8>) {
        lex::encode_u64(*self, buf);
    }
}

impl LexEncode for str {
    fn lex_encode_into(&self, buf: &mut Vec<u8>) {
        lex::encode_str(self, buf);
    }
}

impl LexEncode for String {
    fn lex_encode_into(&self, buf: &mut Vec<u8>) {
        lex::encode_str(self, buf);
    }
}

impl LexEncode for bool {
    fn lex_encode_into(&self, buf: &mut Vec<u8>) {
        lex::encode_bool(*self, buf);
    }
}

impl LexEncode for Scalar {
    fn lex_encode_into(&self, buf: &mut Vec<u8>) {
        self.encode_into(buf);
    }
}

impl LexDecode for i64 {
    fn lex_decode(bytes: &[u8]) -> CodecResult<(Self, usize)> {
        lex::decode_i64(bytes)
    }
}

impl LexDecode for u64 {
    fn lex_decode(bytes: &[u8]) -> CodecResult<(Self, usize)> {
        lex::decode_u64(bytes)
    }
}

impl LexDecode for String {
    fn lex_decode(bytes: &[u8]) -> CodecResult<(Self, usize)> {
        lex::decode_str(bytes)
    }
}

impl LexDecode for bool {
    fn lex_decode(bytes: &[u8]) -> CodecResult<(Self, usize)> {
        lex::decode_bool(bytes)
    }
}

/// Decodes `bytes` as exactly one `T`, rejecting leftover bytes.
///
/// # Errors
///
/// Returns [`CodecError::MalformedEncoding`] if decoding fails or does not
/// consume the whole input.
pub fn lex_decode_exact<T: LexDecode>(bytes: &[u8]) -> CodecResult<T> {
    let (value, consumed) = T::lex_decode(bytes)?;
    if consumed != bytes.len() {
        return Err(CodecError::malformed(format!(
            "{} trailing bytes after value",
            bytes.len() - consumed
        )));
    }
    Ok(value)
}
