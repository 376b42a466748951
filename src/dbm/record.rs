//! Record encoding
//!
//! File header and per-record framing, encoded with bincode's fixed-width
//! little-endian layout.

use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::{KvError, Result};

// =============================================================================
// Shared Constants
// =============================================================================

/// Magic bytes identifying a simple-kv database file
pub(crate) const MAGIC: [u8; 4] = *b"SKVD";

/// Current file format version
pub(crate) const VERSION: u16 = 1;

/// File header size: Magic (4) + Version (2) = 6 bytes
pub(crate) const FILE_HEADER_SIZE: u64 = 6;

/// Record header size: CRC (4) + KeyLen (4) + ValLen (4) = 12 bytes
pub(crate) const RECORD_HEADER_SIZE: u64 = 12;

/// Sentinel value length marking a tombstone (deleted key)
pub(crate) const TOMBSTONE_MARKER: u32 = u32::MAX;

/// Largest key or value a record can frame
pub(crate) const MAX_ENTRY_LEN: usize = (TOMBSTONE_MARKER - 1) as usize;

// =============================================================================
// File Header
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct FileHeader {
    pub magic: [u8; 4],
    pub version: u16,
}

impl FileHeader {
    pub fn current() -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode and validate a header read from the start of a file
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let header: FileHeader = bincode::deserialize(buf)?;

        if header.magic != MAGIC {
            return Err(KvError::Corruption(format!(
                "Invalid magic: expected SKVD, got {:?}",
                header.magic
            )));
        }
        if header.version != VERSION {
            return Err(KvError::Corruption(format!(
                "Unsupported format version: {}",
                header.version
            )));
        }

        Ok(header)
    }
}

// =============================================================================
// Record Header
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct RecordHeader {
    pub crc: u32,
    pub key_len: u32,
    pub value_len: u32,
}

impl RecordHeader {
    pub fn decode(buf: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(buf)?)
    }

    pub fn is_tombstone(&self) -> bool {
        self.value_len == TOMBSTONE_MARKER
    }

    /// Number of value bytes following the key
    pub fn value_size(&self) -> u64 {
        if self.is_tombstone() {
            0
        } else {
            self.value_len as u64
        }
    }

    /// Key + value bytes following the header
    pub fn body_size(&self) -> u64 {
        self.key_len as u64 + self.value_size()
    }

    /// Total on-disk size of the record
    pub fn record_size(&self) -> u64 {
        RECORD_HEADER_SIZE + self.body_size()
    }

    /// Check the stored CRC against a record body (key followed by value)
    pub fn verify(&self, body: &[u8]) -> bool {
        let (key, value) = body.split_at(self.key_len as usize);
        checksum(self.key_len, self.value_len, key, value) == self.crc
    }
}

fn checksum(key_len: u32, value_len: u32, key: &[u8], value: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&key_len.to_le_bytes());
    hasher.update(&value_len.to_le_bytes());
    hasher.update(key);
    hasher.update(value);
    hasher.finalize()
}

/// Frame a record for appending. A `None` value produces a tombstone.
pub(crate) fn encode_record(key: &[u8], value: Option<&[u8]>) -> Result<(RecordHeader, BytesMut)> {
    if key.len() > MAX_ENTRY_LEN {
        return Err(KvError::EntryTooLarge(key.len()));
    }
    let value_len = match value {
        Some(v) if v.len() > MAX_ENTRY_LEN => return Err(KvError::EntryTooLarge(v.len())),
        Some(v) => v.len() as u32,
        None => TOMBSTONE_MARKER,
    };
    let key_len = key.len() as u32;
    let value = value.unwrap_or_default();

    let header = RecordHeader {
        crc: checksum(key_len, value_len, key, value),
        key_len,
        value_len,
    };

    let mut buf = BytesMut::with_capacity(header.record_size() as usize);
    buf.put_slice(&bincode::serialize(&header)?);
    buf.put_slice(key);
    buf.put_slice(value);

    Ok((header, buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_sizes_match_bincode() {
        let file_header = FileHeader::current();
        assert_eq!(
            bincode::serialized_size(&file_header).unwrap(),
            FILE_HEADER_SIZE
        );

        let record_header = RecordHeader {
            crc: 0,
            key_len: 0,
            value_len: 0,
        };
        assert_eq!(
            bincode::serialized_size(&record_header).unwrap(),
            RECORD_HEADER_SIZE
        );
    }

    #[test]
    fn test_file_header_rejects_bad_magic() {
        let mut buf = FileHeader::current().encode().unwrap();
        buf[0] = b'X';

        let err = FileHeader::decode(&buf).unwrap_err();
        assert!(matches!(err, KvError::Corruption(_)));
    }

    #[test]
    fn test_file_header_rejects_unknown_version() {
        let header = FileHeader {
            magic: MAGIC,
            version: VERSION + 1,
        };
        let buf = header.encode().unwrap();

        assert!(FileHeader::decode(&buf).is_err());
    }

    #[test]
    fn test_encoded_record_layout() {
        let (header, buf) = encode_record(b"key", Some(&b"value"[..])).unwrap();

        assert_eq!(buf.len() as u64, header.record_size());
        assert_eq!(&buf[4..8], &3u32.to_le_bytes());
        assert_eq!(&buf[8..12], &5u32.to_le_bytes());
        assert_eq!(&buf[12..15], b"key");
        assert_eq!(&buf[15..], b"value");

        let decoded = RecordHeader::decode(&buf[..RECORD_HEADER_SIZE as usize]).unwrap();
        assert_eq!(decoded, header);
        assert!(decoded.verify(&buf[RECORD_HEADER_SIZE as usize..]));
    }

    #[test]
    fn test_tombstone_has_no_value_bytes() {
        let (header, buf) = encode_record(b"gone", None).unwrap();

        assert!(header.is_tombstone());
        assert_eq!(header.body_size(), 4);
        assert_eq!(buf.len() as u64, RECORD_HEADER_SIZE + 4);
        assert!(header.verify(&buf[RECORD_HEADER_SIZE as usize..]));
    }

    #[test]
    fn test_verify_detects_flipped_bit() {
        let (header, buf) = encode_record(b"k", Some(&b"v"[..])).unwrap();
        let mut body = buf[RECORD_HEADER_SIZE as usize..].to_vec();
        body[1] ^= 0x01;

        assert!(!header.verify(&body));
    }
}
