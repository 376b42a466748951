//! Hash index
//!
//! Maps keys to record positions. Keys are grouped into buckets by their
//! CRC32 hash; buckets are kept ordered by hash so traversal can resume
//! from any previously returned key.

use std::collections::BTreeMap;
use std::ops::Bound;

/// Location of a live record in the data file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RecordPos {
    /// Offset of the first value byte
    pub value_offset: u64,
    /// Number of value bytes
    pub value_len: u32,
    /// Total size of the record (header + key + value)
    pub record_size: u64,
}

/// Bucket hash for a key
pub(crate) fn bucket_of(key: &[u8]) -> u32 {
    crc32fast::hash(key)
}

/// Bucketed hash index: hash → chain of (key, position)
#[derive(Debug, Default)]
pub(crate) struct HashIndex {
    buckets: BTreeMap<u32, Vec<(Vec<u8>, RecordPos)>>,
    len: usize,
}

impl HashIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &[u8]) -> Option<&RecordPos> {
        self.buckets
            .get(&bucket_of(key))?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, pos)| pos)
    }

    /// Insert or replace. A replaced key keeps its place in the chain.
    /// Returns the previous position, if any.
    pub fn insert(&mut self, key: Vec<u8>, pos: RecordPos) -> Option<RecordPos> {
        let chain = self.buckets.entry(bucket_of(&key)).or_default();

        if let Some((_, existing)) = chain.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(existing, pos));
        }

        chain.push((key, pos));
        self.len += 1;
        None
    }

    pub fn remove(&mut self, key: &[u8]) -> Option<RecordPos> {
        let hash = bucket_of(key);
        let chain = self.buckets.get_mut(&hash)?;
        let at = chain.iter().position(|(k, _)| k == key)?;
        let (_, pos) = chain.remove(at);

        if chain.is_empty() {
            self.buckets.remove(&hash);
        }
        self.len -= 1;
        Some(pos)
    }

    pub fn first_key(&self) -> Option<&[u8]> {
        self.buckets
            .values()
            .next()
            .and_then(|chain| chain.first())
            .map(|(k, _)| k.as_slice())
    }

    /// Key following `prev` in traversal order.
    ///
    /// If `prev` is no longer indexed, traversal resumes at the next bucket.
    pub fn next_key(&self, prev: &[u8]) -> Option<&[u8]> {
        let hash = bucket_of(prev);

        if let Some(chain) = self.buckets.get(&hash) {
            if let Some(at) = chain.iter().position(|(k, _)| k == prev) {
                if let Some((k, _)) = chain.get(at + 1) {
                    return Some(k.as_slice());
                }
            }
        }

        self.buckets
            .range((Bound::Excluded(hash), Bound::Unbounded))
            .next()
            .and_then(|(_, chain)| chain.first())
            .map(|(k, _)| k.as_slice())
    }

    /// All entries in traversal order
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &RecordPos)> {
        self.buckets
            .values()
            .flat_map(|chain| chain.iter().map(|(k, pos)| (k.as_slice(), pos)))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
