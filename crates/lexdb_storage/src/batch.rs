//! Atomic write batches and their binary framing.

use crate::error::{StorageError, StorageResult};

/// Tag byte for a put operation in the encoded form.
const OP_PUT: u8 = 1;
/// Tag byte for a delete operation in the encoded form.
const OP_DELETE: u8 = 2;

/// A single mutation inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    /// Insert or overwrite `key` with `value`.
    Put {
        /// Key bytes.
        key: Vec<u8>,
        /// Value bytes (may be empty).
        value: Vec<u8>,
    },
    /// Remove `key` if present.
    Delete {
        /// Key bytes.
        key: Vec<u8>,
    },
}

impl BatchOp {
    /// Returns the key this operation touches.
    #[must_use]
    pub fn key(&self) -> &[u8] {
        match self {
            Self::Put { key, .. } | Self::Delete { key } => key,
        }
    }
}

/// An ordered set of puts and deletes applied indivisibly.
///
/// Operations are applied in insertion order, so a delete followed by a put
/// of the same key leaves the key present.
///
/// # Example
///
/// ```rust
/// use lexdb_storage::{InMemoryStore, OrderedStore, WriteBatch};
///
/// let store = InMemoryStore::new();
/// let mut batch = WriteBatch::new();
/// batch.put(b"a".to_vec(), b"1".to_vec());
/// batch.put(b"b".to_vec(), Vec::new());
/// store.write(batch).unwrap();
/// assert_eq!(store.get(b"a").unwrap(), Some(b"1".to_vec()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a put.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.ops.push(BatchOp::Put { key, value });
    }

    /// Queues a delete.
    pub fn delete(&mut self, key: Vec<u8>) {
        self.ops.push(BatchOp::Delete { key });
    }

    /// Returns the number of queued operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns true if no operation is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Returns the queued operations in application order.
    #[must_use]
    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    /// Consumes the batch, returning its operations.
    #[must_use]
    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }

    /// Serializes the batch for the on-disk log.
    ///
    /// Layout: `count:u32`, then per op `tag:u8`, `key_len:u32`, key and,
    /// for puts, `value_len:u32` and value. All integers little-endian.
    ///
    /// # Errors
    ///
    /// Returns an error if a key, value or the op count exceeds `u32::MAX`.
    pub fn encode(&self) -> StorageResult<Vec<u8>> {
        let mut buf = Vec::new();
        write_len(&mut buf, self.ops.len())?;
        for op in &self.ops {
            match op {
                BatchOp::Put { key, value } => {
                    buf.push(OP_PUT);
                    write_len(&mut buf, key.len())?;
                    buf.extend_from_slice(key);
                    write_len(&mut buf, value.len())?;
                    buf.extend_from_slice(value);
                }
                BatchOp::Delete { key } => {
                    buf.push(OP_DELETE);
                    write_len(&mut buf, key.len())?;
                    buf.extend_from_slice(key);
                }
            }
        }
        Ok(buf)
    }

    /// Deserializes a batch produced by [`WriteBatch::encode`].
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Corrupted`] on truncated input, unknown op
    /// tags or trailing bytes.
    pub fn decode(payload: &[u8]) -> StorageResult<Self> {
        let mut cursor = 0;
        let count = read_u32(payload, &mut cursor)? as usize;
        let mut ops = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            let tag = *payload
                .get(cursor)
                .ok_or_else(|| StorageError::corrupted("unexpected end of batch"))?;
            cursor += 1;
            let key = read_bytes(payload, &mut cursor)?;
            match tag {
                OP_PUT => {
                    let value = read_bytes(payload, &mut cursor)?;
                    ops.push(BatchOp::Put { key, value });
                }
                OP_DELETE => ops.push(BatchOp::Delete { key }),
                other => {
                    return Err(StorageError::corrupted(format!(
                        "unknown batch op tag {other}"
                    )))
                }
            }
        }
        if cursor != payload.len() {
            return Err(StorageError::corrupted(format!(
                "trailing bytes in batch: consumed {cursor} of {}",
                payload.len()
            )));
        }
        Ok(Self { ops })
    }
}

fn write_len(buf: &mut Vec<u8>, len: usize) -> StorageResult<()> {
    let len = u32::try_from(len)
        .map_err(|_| StorageError::corrupted(format!("length {len} exceeds u32::MAX")))?;
    buf.extend_from_slice(&len.to_le_bytes());
    Ok(())
}

fn read_u32(payload: &[u8], cursor: &mut usize) -> StorageResult<u32> {
    let end = *cursor + 4;
    let bytes: [u8; 4] = payload
        .get(*cursor..end)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| StorageError::corrupted("unexpected end of batch"))?;
    *cursor = end;
    Ok(u32::from_le_bytes(bytes))
}

fn read_bytes(payload: &[u8], cursor: &mut usize) -> StorageResult<Vec<u8>> {
    let len = read_u32(payload, cursor)? as usize;
    let end = cursor.saturating_add(len);
    let bytes = payload
        .get(*cursor..end)
        .ok_or_else(|| StorageError::corrupted("unexpected end of batch"))?
        .to_vec();
    *cursor = end;
    Ok(bytes)
}

/// Computes the CRC32 (IEEE) checksum of `data`.
pub(crate) fn compute_crc32(data: &[u8]) -> u32 {
    const CRC32_TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ 0xEDB8_8320;
                } else {
                    crc >>= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        let index = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
    }
    !crc
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn op_strategy() -> impl Strategy<Value = BatchOp> {
        let bytes = || prop::collection::vec(any::<u8>(), 0..16);
        prop_oneof![
            (bytes(), bytes()).prop_map(|(key, value)| BatchOp::Put { key, value }),
            bytes().prop_map(|key| BatchOp::Delete { key }),
        ]
    }

    proptest! {
        #[test]
        fn encoded_batches_decode_to_same_ops(ops in prop::collection::vec(op_strategy(), 0..12)) {
            let batch = WriteBatch { ops };
            let decoded = WriteBatch::decode(&batch.encode().unwrap()).unwrap();
            prop_assert_eq!(decoded, batch);
        }

        #[test]
        fn decode_of_arbitrary_bytes_does_not_panic(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
            let _ = WriteBatch::decode(&bytes);
        }
    }

    #[test]
    fn encode_decode_preserves_order() {
        let mut batch = WriteBatch::new();
        batch.put(b"k1".to_vec(), b"v1".to_vec());
        batch.delete(b"k1".to_vec());
        batch.put(b"k2".to_vec(), Vec::new());

        let decoded = WriteBatch::decode(&batch.encode().unwrap()).unwrap();
        assert_eq!(decoded, batch);
        assert_eq!(decoded.ops()[1].key(), b"k1");
    }

    #[test]
    fn decode_rejects_truncation() {
        let mut batch = WriteBatch::new();
        batch.put(b"key".to_vec(), b"value".to_vec());
        let bytes = batch.encode().unwrap();

        let result = WriteBatch::decode(&bytes[..bytes.len() - 2]);
        assert!(matches!(result, Err(StorageError::Corrupted(_))));
    }

    #[test]
    fn decode_rejects_unknown_tag() {
        let mut bytes = 1u32.to_le_bytes().to_vec();
        bytes.push(9);
        bytes.extend_from_slice(&0u32.to_le_bytes());
        assert!(WriteBatch::decode(&bytes).is_err());
    }

    #[test]
    fn decode_rejects_trailing_bytes() {
        let mut bytes = WriteBatch::new().encode().unwrap();
        bytes.push(0);
        assert!(WriteBatch::decode(&bytes).is_err());
    }

    #[test]
    fn crc32_known_vector() {
        assert_eq!(compute_crc32(b"123456789"), 0xCBF4_3926);
    }
}
