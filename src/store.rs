//! Store Module
//!
//! The public key-value contract and its database-backed implementation.
//!
//! ## Responsibilities
//! - Translate string keys and byte values to engine exchange buffers
//! - Treat an absent value as "delete" in the unified `set` call
//! - Flush to stable storage after every mutation
//! - Report open failures as `UnableToOpen(code)`
//! - Forward-only key traversal

use std::iter::FusedIterator;
use std::path::Path;

use bytes::Bytes;
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::dbm::{Database, Datum};
use crate::error::{KvError, Result};

// =============================================================================
// Contract
// =============================================================================

/// A persistent mapping from keys to byte values.
///
/// Lookups never fail: a missing key is `None`. Mutations are durable when
/// they return.
pub trait KeyValueStore<K: ?Sized + ToOwned, V> {
    /// Single-pass iterator over all keys
    type Keys<'a>: Iterator<Item = K::Owned>
    where
        Self: 'a;

    /// Value stored for `key`, or `None`
    fn get(&self, key: &K) -> Option<V>;

    /// Store `value` for `key`, replacing any previous value
    fn put(&mut self, key: &K, value: V);

    /// Remove `key`. No-op if it is absent.
    fn delete(&mut self, key: &K);

    /// Assign or remove: `None` deletes the key.
    fn set(&mut self, key: &K, value: Option<V>) {
        match value {
            Some(value) => self.put(key, value),
            None => self.delete(key),
        }
    }

    /// Start a fresh traversal over all keys, in unspecified order
    fn keys(&self) -> Self::Keys<'_>;
}

// =============================================================================
// DbmStore
// =============================================================================

/// Key-value store backed by a single hash database file.
///
/// Owns its [`Database`] handle; the handle is released exactly once when
/// the store is dropped or closed.
///
/// Write failures from the engine are logged and otherwise ignored by
/// `put`/`delete`; use [`DbmStore::try_put`] and [`DbmStore::try_delete`]
/// to observe them.
pub struct DbmStore {
    db: Database,
}

impl DbmStore {
    /// Open or create the store at `path` (the file is `{path}.db`)
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let config = Config::builder().path(path.as_ref()).build();
        Self::with_config(config)
    }

    /// Open or create the store with the given config
    ///
    /// Any engine failure is reported as `KvError::UnableToOpen(code)`.
    pub fn with_config(config: Config) -> Result<Self> {
        match Database::open(&config) {
            Ok(db) => Ok(Self { db }),
            Err(e) => {
                let code = e.code();
                warn!(
                    path = %config.path.display(),
                    code,
                    error = %e,
                    "Unable to open database"
                );
                Err(KvError::UnableToOpen(code))
            }
        }
    }

    /// Store `value` for `key` and flush, reporting engine failures
    pub fn try_put(&mut self, key: &str, value: &[u8]) -> Result<()> {
        self.db.store(Datum::from(key), Datum::new(value))?;
        self.db.sync()
    }

    /// Delete `key` and flush, reporting engine failures
    pub fn try_delete(&mut self, key: &str) -> Result<()> {
        self.db.delete(Datum::from(key))?;
        self.db.sync()
    }

    /// Rewrite the database file without dead records
    pub fn compact(&mut self) -> Result<()> {
        self.db.compact()
    }

    /// Sync and release the database handle
    pub fn close(self) -> Result<()> {
        self.db.close()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// Path of the database file
    pub fn path(&self) -> &Path {
        self.db.path()
    }

    /// Bytes a compaction would reclaim
    pub fn reclaimable_bytes(&self) -> u64 {
        self.db.reclaimable_bytes()
    }
}

impl KeyValueStore<str, Bytes> for DbmStore {
    type Keys<'a> = Keys<'a>;

    fn get(&self, key: &str) -> Option<Bytes> {
        match self.db.fetch(Datum::from(key)) {
            Ok(value) => value.map(Bytes::from),
            Err(e) => {
                error!(key, error = %e, "Fetch failed");
                None
            }
        }
    }

    fn put(&mut self, key: &str, value: Bytes) {
        if let Err(e) = self.try_put(key, &value) {
            error!(key, error = %e, "Store failed");
        }
    }

    fn delete(&mut self, key: &str) {
        if let Err(e) = self.try_delete(key) {
            error!(key, error = %e, "Delete failed");
        }
    }

    fn keys(&self) -> Keys<'_> {
        Keys {
            db: &self.db,
            cursor: Cursor::Start,
        }
    }
}

impl<'a> IntoIterator for &'a DbmStore {
    type Item = String;
    type IntoIter = Keys<'a>;

    fn into_iter(self) -> Keys<'a> {
        self.keys()
    }
}

// =============================================================================
// Key Iterator
// =============================================================================

/// Traversal state
enum Cursor {
    /// Nothing produced yet; the next step asks for the first key
    Start,
    /// The last key produced; the next step asks for its successor
    After(Vec<u8>),
    /// Exhausted
    Done,
}

/// Forward-only iterator over the keys of a [`DbmStore`].
///
/// Single pass: once exhausted it stays exhausted; call
/// [`KeyValueStore::keys`] again for a new traversal. Borrows the store,
/// so the store cannot be mutated while a traversal is alive.
///
/// A key that is not valid UTF-8 ends the traversal.
pub struct Keys<'a> {
    db: &'a Database,
    cursor: Cursor,
}

impl<'a> Iterator for Keys<'a> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let db = self.db;
        let raw = match &self.cursor {
            Cursor::Start => db.first_key(),
            Cursor::After(prev) => db.next_key(Datum::new(prev)),
            Cursor::Done => return None,
        };

        let Some(raw) = raw else {
            self.cursor = Cursor::Done;
            return None;
        };

        match std::str::from_utf8(raw) {
            Ok(key) => {
                self.cursor = Cursor::After(raw.to_vec());
                Some(key.to_owned())
            }
            Err(_) => {
                debug!(key = ?raw, "Stopping traversal at non UTF-8 key");
                self.cursor = Cursor::Done;
                None
            }
        }
    }
}

impl FusedIterator for Keys<'_> {}
