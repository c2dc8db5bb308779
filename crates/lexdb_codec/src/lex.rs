//! Order-preserving ("lexicographic") encoding of scalar values.
//!
//! Encoded values compare with plain byte comparison in the same order as
//! the values themselves, which is what makes them usable inside keys of a
//! byte-sorted store.
//!
//! ## Integers
//!
//! The first byte is a tag in `INT_MIN..=INT_MAX` and alone determines the
//! encoded length:
//!
//! ```text
//! 0x80..=0x87  negative, 8..=1 complemented big-endian bytes follow
//! 0x88..=0xf5  0..=109 stored directly in the tag
//! 0xf6..=0xfd  positive, 1..=8 big-endian bytes follow
//! ```
//!
//! Negative values keep the low `n` bytes of their two's-complement form, so
//! more-negative values sort first within a width, and narrower widths use
//! higher tags. Encodings are canonical: the shortest width is always used
//! and decoding rejects anything wider.
//!
//! ## Strings and booleans
//!
//! Strings are their UTF-8 bytes. Booleans are `0x00` and `0x01`.

use crate::error::{CodecError, CodecResult};

/// Lowest integer tag byte.
pub const INT_MIN: u8 = 0x80;
/// Highest integer tag byte.
pub const INT_MAX: u8 = 0xfd;
/// Maximum number of magnitude bytes following a tag.
pub const INT_MAX_WIDTH: u8 = 8;
/// Tag of the integer zero.
pub const INT_ZERO: u8 = INT_MIN + INT_MAX_WIDTH;
/// Largest integer stored inside its tag byte.
pub const INT_SMALL: u8 = INT_MAX - INT_ZERO - INT_MAX_WIDTH;

/// Encoding of `false`.
pub const FALSE_BYTE: u8 = 0x00;
/// Encoding of `true`.
pub const TRUE_BYTE: u8 = 0x01;

/// Appends the encoding of a signed integer.
pub fn encode_i64(v: i64, buf: &mut Vec<u8>) {
    if v >= 0 {
        #[allow(clippy::cast_sign_loss)]
        encode_u64(v as u64, buf);
        return;
    }
    let width = negative_width(v);
    buf.push(INT_ZERO - width);
    buf.extend_from_slice(&v.to_be_bytes()[usize::from(INT_MAX_WIDTH - width)..]);
}

/// Appends the encoding of an unsigned integer.
#[allow(clippy::cast_possible_truncation)]
pub fn encode_u64(v: u64, buf: &mut Vec<u8>) {
    if v <= u64::from(INT_SMALL) {
        buf.push(INT_ZERO + v as u8);
        return;
    }
    let width = positive_width(v);
    buf.push(INT_MAX - INT_MAX_WIDTH + width);
    buf.extend_from_slice(&v.to_be_bytes()[usize::from(INT_MAX_WIDTH - width)..]);
}

/// Appends the encoding of a string.
pub fn encode_str(v: &str, buf: &mut Vec<u8>) {
    buf.extend_from_slice(v.as_bytes());
}

/// Appends the encoding of a boolean.
pub fn encode_bool(v: bool, buf: &mut Vec<u8>) {
    buf.push(if v { TRUE_BYTE } else { FALSE_BYTE });
}

/// Returns the total encoded length implied by an integer tag byte.
#[must_use]
pub fn int_len_from_tag(tag: u8) -> Option<usize> {
    match tag {
        INT_MIN..=0x87 => Some(1 + usize::from(INT_ZERO - tag)),
        INT_ZERO..=0xf5 => Some(1),
        0xf6..=INT_MAX => Some(1 + usize::from(tag - (INT_MAX - INT_MAX_WIDTH))),
        _ => None,
    }
}

/// Decodes an unsigned integer, returning it with the bytes consumed.
///
/// # Errors
///
/// Returns [`CodecError::MalformedEncoding`] if the input is empty,
/// truncated, carries a negative or unknown tag, or is not canonical.
pub fn decode_u64(bytes: &[u8]) -> CodecResult<(u64, usize)> {
    let tag = first_byte(bytes)?;
    if tag < INT_ZERO {
        return Err(CodecError::malformed(format!(
            "tag {tag:#04x} encodes a negative integer"
        )));
    }
    if tag > INT_MAX {
        return Err(CodecError::malformed(format!("invalid integer tag {tag:#04x}")));
    }
    let small = tag - INT_ZERO;
    if small <= INT_SMALL {
        return Ok((u64::from(small), 1));
    }
    let width = small - INT_SMALL;
    let body = body(bytes, width)?;
    let v = body.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
    if v <= u64::from(INT_SMALL) || positive_width(v) != width {
        return Err(CodecError::malformed(format!(
            "non-canonical {width}-byte encoding of {v}"
        )));
    }
    Ok((v, 1 + usize::from(width)))
}

/// Decodes a signed integer, returning it with the bytes consumed.
///
/// # Errors
///
/// Returns [`CodecError::MalformedEncoding`] if the input is empty,
/// truncated, carries an unknown tag, is not canonical, or holds a
/// magnitude above `i64::MAX`.
pub fn decode_i64(bytes: &[u8]) -> CodecResult<(i64, usize)> {
    let tag = first_byte(bytes)?;
    if !(INT_MIN..=INT_MAX).contains(&tag) {
        return Err(CodecError::malformed(format!("invalid integer tag {tag:#04x}")));
    }
    if tag >= INT_ZERO {
        let (v, consumed) = decode_u64(bytes)?;
        let v = i64::try_from(v)
            .map_err(|_| CodecError::malformed(format!("integer {v} overflows i64")))?;
        return Ok((v, consumed));
    }

    let width = INT_ZERO - tag;
    let body = body(bytes, width)?;
    // Complement each byte to rebuild the magnitude, then complement back.
    let m = body.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(!b));
    let m = i64::try_from(m)
        .map_err(|_| CodecError::malformed("negative integer encoding out of range"))?;
    let v = !m;
    if negative_width(v) != width {
        return Err(CodecError::malformed(format!(
            "non-canonical {width}-byte encoding of {v}"
        )));
    }
    Ok((v, 1 + usize::from(width)))
}

/// Decodes a boolean, returning it with the bytes consumed.
///
/// # Errors
///
/// Returns [`CodecError::MalformedEncoding`] on empty input or a byte other
/// than `0x00` / `0x01`.
pub fn decode_bool(bytes: &[u8]) -> CodecResult<(bool, usize)> {
    match first_byte(bytes)? {
        FALSE_BYTE => Ok((false, 1)),
        TRUE_BYTE => Ok((true, 1)),
        other => Err(CodecError::malformed(format!("invalid boolean byte {other:#04x}"))),
    }
}

/// Decodes a string. Strings are not self-delimiting, so the whole input
/// is consumed.
///
/// # Errors
///
/// Returns [`CodecError::MalformedEncoding`] if the bytes are not UTF-8.
pub fn decode_str(bytes: &[u8]) -> CodecResult<(String, usize)> {
    let s = std::str::from_utf8(bytes)
        .map_err(|e| CodecError::malformed(format!("invalid UTF-8: {e}")))?;
    Ok((s.to_owned(), bytes.len()))
}

fn first_byte(bytes: &[u8]) -> CodecResult<u8> {
    bytes
        .first()
        .copied()
        .ok_or_else(|| CodecError::malformed("insufficient bytes to decode integer"))
}

fn body(bytes: &[u8], width: u8) -> CodecResult<&[u8]> {
    let end = 1 + usize::from(width);
    bytes.get(1..end).ok_or_else(|| {
        CodecError::malformed(format!(
            "insufficient bytes: need {width} after tag, have {}",
            bytes.len().saturating_sub(1)
        ))
    })
}

/// Minimal big-endian width of a positive magnitude.
#[allow(clippy::cast_possible_truncation)]
fn positive_width(v: u64) -> u8 {
    (INT_MAX_WIDTH - (v.leading_zeros() / 8) as u8).max(1)
}

/// Minimal width `n` such that `v >= -(256^n - 1)`.
fn negative_width(v: i64) -> u8 {
    (1..INT_MAX_WIDTH)
        .find(|&n| v >= -((1i64 << (8 * u32::from(n))) - 1))
        .unwrap_or(INT_MAX_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn enc_i(v: i64) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_i64(v, &mut buf);
        buf
    }

    fn enc_u(v: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_u64(v, &mut buf);
        buf
    }

    #[test]
    fn constants() {
        assert_eq!(INT_ZERO, 0x88);
        assert_eq!(INT_SMALL, 109);
    }

    #[test]
    fn small_values_use_one_byte() {
        assert_eq!(enc_i(0), vec![0x88]);
        assert_eq!(enc_i(109), vec![0xf5]);
        assert_eq!(enc_i(110), vec![0xf6, 110]);
        assert_eq!(enc_i(-1), vec![0x87, 0xff]);
        assert_eq!(enc_i(-255), vec![0x87, 0x01]);
        assert_eq!(enc_i(-256), vec![0x86, 0xff, 0x00]);
    }

    #[test]
    fn extremes_use_nine_bytes() {
        assert_eq!(enc_i(i64::MIN).len(), 9);
        assert_eq!(enc_i(i64::MIN)[0], INT_MIN);
        assert_eq!(enc_u(u64::MAX).len(), 9);
        assert_eq!(enc_u(u64::MAX)[0], INT_MAX);
        assert_eq!(enc_i(i64::MAX).len(), 9);
    }

    #[test]
    fn tag_determines_length() {
        for v in [i64::MIN, -70_000, -256, -1, 0, 5, 109, 110, 300, 1 << 40, i64::MAX] {
            let bytes = enc_i(v);
            assert_eq!(int_len_from_tag(bytes[0]), Some(bytes.len()), "value {v}");
        }
        assert_eq!(int_len_from_tag(0x7f), None);
        assert_eq!(int_len_from_tag(0xfe), None);
    }

    #[test]
    fn boundaries_are_ordered() {
        let values = [
            i64::MIN,
            i64::MIN + 1,
            -(1 << 56),
            -(1 << 56) + 1,
            -65_536,
            -65_535,
            -256,
            -255,
            -1,
            0,
            1,
            109,
            110,
            255,
            256,
            65_535,
            65_536,
            i64::MAX - 1,
            i64::MAX,
        ];
        for pair in values.windows(2) {
            assert!(enc_i(pair[0]) < enc_i(pair[1]), "{} vs {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn decode_reports_consumed_bytes() {
        let mut bytes = enc_i(-300);
        bytes.extend_from_slice(b"/rest");
        let (v, consumed) = decode_i64(&bytes).unwrap();
        assert_eq!(v, -300);
        assert_eq!(&bytes[consumed..], b"/rest");
    }

    #[test]
    fn decode_rejects_truncated() {
        let bytes = enc_i(1 << 40);
        assert!(matches!(
            decode_i64(&bytes[..3]),
            Err(CodecError::MalformedEncoding { .. })
        ));
        assert!(decode_i64(&[]).is_err());
    }

    #[test]
    fn decode_rejects_bad_tags() {
        assert!(decode_i64(b"a").is_err());
        assert!(decode_i64(&[0xfe, 0, 0]).is_err());
        assert!(decode_u64(&enc_i(-5)).is_err());
    }

    #[test]
    fn signed_decode_rejects_overflow() {
        let bytes = enc_u(u64::MAX);
        assert_eq!(decode_u64(&bytes).unwrap(), (u64::MAX, 9));
        assert!(matches!(
            decode_i64(&bytes),
            Err(CodecError::MalformedEncoding { .. })
        ));
    }

    #[test]
    fn decode_rejects_non_canonical() {
        // 5 padded into a one-byte body.
        assert!(decode_u64(&[0xf6, 0x05]).is_err());
        // 200 padded into a two-byte body.
        assert!(decode_u64(&[0xf7, 0x00, 0xc8]).is_err());
        // -1 padded into a two-byte body.
        assert!(decode_i64(&[0x86, 0xff, 0xff]).is_err());
    }

    #[test]
    fn booleans() {
        let mut f = Vec::new();
        let mut t = Vec::new();
        encode_bool(false, &mut f);
        encode_bool(true, &mut t);
        assert!(f < t);
        assert_eq!(decode_bool(&t).unwrap(), (true, 1));
        assert!(decode_bool(&[2]).is_err());
    }

    #[test]
    fn strings_are_identity() {
        let mut buf = Vec::new();
        encode_str("héllo", &mut buf);
        assert_eq!(buf, "héllo".as_bytes());
        assert_eq!(decode_str(&buf).unwrap(), ("héllo".to_string(), buf.len()));
        assert!(decode_str(&[0xff, 0xfe]).is_err());
    }

    proptest! {
        #[test]
        fn signed_order_is_preserved(a in any::<i64>(), b in any::<i64>()) {
            prop_assert_eq!(a.cmp(&b), enc_i(a).cmp(&enc_i(b)));
        }

        #[test]
        fn unsigned_order_is_preserved(a in any::<u64>(), b in any::<u64>()) {
            prop_assert_eq!(a.cmp(&b), enc_u(a).cmp(&enc_u(b)));
        }

        #[test]
        fn signed_decode_inverts_encode(v in any::<i64>()) {
            let bytes = enc_i(v);
            prop_assert_eq!(decode_i64(&bytes).unwrap(), (v, bytes.len()));
        }

        #[test]
        fn unsigned_decode_inverts_encode(v in any::<u64>()) {
            let bytes = enc_u(v);
            prop_assert_eq!(decode_u64(&bytes).unwrap(), (v, bytes.len()));
        }

        #[test]
        fn string_order_is_preserved(a in ".*", b in ".*") {
            let (mut ea, mut eb) = (Vec::new(), Vec::new());
            encode_str(&a, &mut ea);
            encode_str(&b, &mut eb);
            prop_assert_eq!(a.cmp(&b), ea.cmp(&eb));
        }
    }
}
