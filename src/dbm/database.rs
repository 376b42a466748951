//! Database handle
//!
//! Opens the database file, rebuilds the index and serves the raw
//! store/fetch/delete/traversal primitives.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::os::unix::fs::{FileExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{KvError, Result};

use super::datum::Datum;
use super::index::{HashIndex, RecordPos};
use super::record::{encode_record, FileHeader, RecordHeader, FILE_HEADER_SIZE, RECORD_HEADER_SIZE};

/// Extension appended to the configured path to name the database file
pub const DB_FILE_EXTENSION: &str = "db";

/// Extension appended to the database file name while compacting
const COMPACT_EXTENSION: &str = "compact";

/// An open hash database file
///
/// ## Ownership
/// The handle owns the file exclusively. It is released exactly once,
/// either by [`Database::close`] or when the value is dropped.
///
/// ## Concurrency
/// None. Mutations take `&mut self`; sharing a database between threads or
/// processes must be coordinated by the caller.
pub struct Database {
    /// Path of the database file (with extension)
    path: PathBuf,

    /// Open file handle, read/write
    file: File,

    /// Permission bits used for files this handle creates
    file_mode: u32,

    /// Key → position of its latest live record
    index: HashIndex,

    /// Offset where the next record is appended
    write_offset: u64,

    /// Bytes held by overwritten records and tombstones
    reclaimable: u64,
}

impl Database {
    /// Open or create a database with the given config
    ///
    /// On open:
    /// 1. Open/create `{path}.db` read/write with the configured mode
    /// 2. Write a header into an empty file (or one holding only the start
    ///    of a header), or validate the existing one
    /// 3. Scan records to rebuild the index, truncating a torn tail
    pub fn open(config: &Config) -> Result<Self> {
        let path = Self::file_path(&config.path);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(config.create_if_missing)
            .mode(config.file_mode)
            .open(&path)?;

        let mut db = Self {
            path,
            file,
            file_mode: config.file_mode,
            index: HashIndex::new(),
            write_offset: 0,
            reclaimable: 0,
        };

        let file_len = db.file.metadata()?.len();
        if file_len == 0 || db.has_partial_header(file_len)? {
            db.write_offset = write_file_header(&db.file)?;
        } else {
            db.load(file_len)?;
        }

        debug!(
            path = %db.path.display(),
            keys = db.index.len(),
            size = db.write_offset,
            "Opened database"
        );

        Ok(db)
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified path
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().path(path).build();
        Self::open(&config)
    }

    /// Sync and release the handle
    pub fn close(self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    // =========================================================================
    // Primitives
    // =========================================================================

    /// Store a value, replacing any existing value for the key
    pub fn store(&mut self, key: Datum<'_>, value: Datum<'_>) -> Result<()> {
        self.append(key.as_bytes(), Some(value.as_bytes()))
    }

    /// Fetch a copy of the value stored for the key
    pub fn fetch(&self, key: Datum<'_>) -> Result<Option<Vec<u8>>> {
        let Some(pos) = self.index.get(key.as_bytes()) else {
            return Ok(None);
        };

        let mut value = vec![0u8; pos.value_len as usize];
        self.file.read_exact_at(&mut value, pos.value_offset)?;
        Ok(Some(value))
    }

    /// Delete the key. Nothing is written if the key is absent.
    pub fn delete(&mut self, key: Datum<'_>) -> Result<()> {
        if self.index.get(key.as_bytes()).is_none() {
            return Ok(());
        }
        self.append(key.as_bytes(), None)
    }

    /// First key in traversal order, `None` if the database is empty
    pub fn first_key(&self) -> Option<&[u8]> {
        self.index.first_key()
    }

    /// Key following `prev` in traversal order, `None` when exhausted
    pub fn next_key(&self, prev: Datum<'_>) -> Option<&[u8]> {
        self.index.next_key(prev.as_bytes())
    }

    /// Force written data to stable storage
    pub fn sync(&self) -> Result<()> {
        self.file.sync_data()?;
        Ok(())
    }

    /// Rewrite the file keeping only live records
    ///
    /// Live records are copied to `{path}.db.compact`, which is synced and
    /// renamed over the database file. Traversal order is preserved.
    pub fn compact(&mut self) -> Result<()> {
        let tmp_path = Self::sibling_path(&self.path, COMPACT_EXTENSION);
        let before = self.write_offset;

        let tmp = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .mode(self.file_mode)
            .open(&tmp_path)?;

        let mut index = HashIndex::new();
        let mut offset = write_file_header(&tmp)?;

        for (key, pos) in self.index.iter() {
            let mut value = vec![0u8; pos.value_len as usize];
            self.file.read_exact_at(&mut value, pos.value_offset)?;

            let (header, record) = encode_record(key, Some(value.as_slice()))?;
            tmp.write_all_at(&record, offset)?;

            index.insert(key.to_vec(), Self::record_pos(offset, &header));
            offset += header.record_size();
        }

        tmp.sync_all()?;
        fs::rename(&tmp_path, &self.path)?;
        sync_parent_dir(&self.path)?;

        self.file = tmp;
        self.index = index;
        self.write_offset = offset;
        self.reclaimable = 0;

        debug!(
            path = %self.path.display(),
            before,
            after = offset,
            "Compacted database"
        );

        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Path of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Logical size of the file in bytes
    pub fn size(&self) -> u64 {
        self.write_offset
    }

    /// Bytes a compaction would reclaim
    pub fn reclaimable_bytes(&self) -> u64 {
        self.reclaimable
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// "data/store" → "data/store.db"
    fn file_path(path: &Path) -> PathBuf {
        Self::sibling_path(path, DB_FILE_EXTENSION)
    }

    /// Append `.{ext}` to the full file name (never replaces an extension)
    fn sibling_path(path: &Path, ext: &str) -> PathBuf {
        let mut name = OsString::from(path.as_os_str());
        name.push(".");
        name.push(ext);
        PathBuf::from(name)
    }

    fn record_pos(offset: u64, header: &RecordHeader) -> RecordPos {
        RecordPos {
            value_offset: offset + RECORD_HEADER_SIZE + header.key_len as u64,
            value_len: header.value_len,
            record_size: header.record_size(),
        }
    }

    /// Append a record and apply it to the index
    fn append(&mut self, key: &[u8], value: Option<&[u8]>) -> Result<()> {
        let (header, record) = encode_record(key, value)?;
        let offset = self.write_offset;

        self.file.write_all_at(&record, offset)?;
        self.write_offset += header.record_size();
        self.apply(offset, key.to_vec(), &header);

        Ok(())
    }

    /// Update the index for a record located at `offset`
    fn apply(&mut self, offset: u64, key: Vec<u8>, header: &RecordHeader) {
        let replaced = if header.is_tombstone() {
            self.reclaimable += header.record_size();
            self.index.remove(&key)
        } else {
            self.index.insert(key, Self::record_pos(offset, header))
        };

        if let Some(old) = replaced {
            self.reclaimable += old.record_size;
        }
    }

    /// True if the file holds nothing but the beginning of a header,
    /// as left behind by a crash while the file was being initialised
    fn has_partial_header(&self, file_len: u64) -> Result<bool> {
        if file_len >= FILE_HEADER_SIZE {
            return Ok(false);
        }

        let mut buf = vec![0u8; file_len as usize];
        self.file.read_exact_at(&mut buf, 0)?;
        let header = FileHeader::current().encode()?;
        Ok(header.starts_with(&buf))
    }

    /// Validate the header and replay every intact record
    ///
    /// An incomplete or checksum-failing record at the very end of the
    /// file is a torn write and is truncated. A checksum failure with more
    /// data behind it fails the open; later records are never discarded.
    fn load(&mut self, file_len: u64) -> Result<()> {
        if file_len < FILE_HEADER_SIZE {
            return Err(KvError::Corruption(format!(
                "File too short for header: {} bytes",
                file_len
            )));
        }

        let mut buf = [0u8; FILE_HEADER_SIZE as usize];
        self.file.read_exact_at(&mut buf, 0)?;
        FileHeader::decode(&buf)?;

        let mut offset = FILE_HEADER_SIZE;
        while offset < file_len {
            match self.read_record(offset, file_len)? {
                ReadOutcome::Record(key, header) => {
                    self.apply(offset, key, &header);
                    offset += header.record_size();
                }
                ReadOutcome::TornTail => {
                    warn!(
                        path = %self.path.display(),
                        offset,
                        dropped = file_len - offset,
                        "Truncating torn tail"
                    );
                    self.file.set_len(offset)?;
                    self.file.sync_all()?;
                    break;
                }
                ReadOutcome::Corrupt => {
                    return Err(KvError::Corruption(format!(
                        "Checksum mismatch in record at offset {} of {} bytes",
                        offset, file_len
                    )));
                }
            }
        }

        self.write_offset = offset;
        Ok(())
    }

    /// Read the record at `offset`
    fn read_record(&self, offset: u64, file_len: u64) -> Result<ReadOutcome> {
        if offset + RECORD_HEADER_SIZE > file_len {
            return Ok(ReadOutcome::TornTail);
        }

        let mut buf = [0u8; RECORD_HEADER_SIZE as usize];
        self.file.read_exact_at(&mut buf, offset)?;
        let header = RecordHeader::decode(&buf)?;

        let body_offset = offset + RECORD_HEADER_SIZE;
        let record_end = body_offset + header.body_size();
        if record_end > file_len {
            return Ok(ReadOutcome::TornTail);
        }

        let mut body = vec![0u8; header.body_size() as usize];
        self.file.read_exact_at(&mut body, body_offset)?;
        if !header.verify(&body) {
            // Only the last record can have been torn by a crash
            return Ok(if record_end == file_len {
                ReadOutcome::TornTail
            } else {
                ReadOutcome::Corrupt
            });
        }

        body.truncate(header.key_len as usize);
        Ok(ReadOutcome::Record(body, header))
    }
}

/// Result of reading one record during load
enum ReadOutcome {
    /// Intact record: key bytes and header
    Record(Vec<u8>, RecordHeader),
    /// Incomplete or bad record ending at end of file
    TornTail,
    /// Bad record followed by more data
    Corrupt,
}

impl Drop for Database {
    fn drop(&mut self) {
        debug!(path = %self.path.display(), "Closing database");
    }
}

/// Write the file header at offset 0; returns the offset after it
fn write_file_header(file: &File) -> Result<u64> {
    let header = FileHeader::current().encode()?;
    file.write_all_at(&header, 0)?;
    file.sync_all()?;
    Ok(FILE_HEADER_SIZE)
}

/// Make a rename durable by syncing the containing directory
fn sync_parent_dir(path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    File::open(parent)?.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_temp_db() -> (TempDir, Database) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::open_path(&temp_dir.path().join("test")).unwrap();
        (temp_dir, db)
    }

    #[test]
    fn test_file_name_gets_db_extension() {
        let (temp, db) = setup_temp_db();
        assert_eq!(db.path(), temp.path().join("test.db"));
        assert!(temp.path().join("test.db").exists());
    }

    #[test]
    fn test_sibling_path_keeps_existing_extension() {
        let path = Database::sibling_path(Path::new("dir/data.v1"), "db");
        assert_eq!(path, PathBuf::from("dir/data.v1.db"));
    }

    #[test]
    fn test_new_file_contains_only_header() {
        let (_temp, db) = setup_temp_db();
        assert_eq!(db.size(), FILE_HEADER_SIZE);
        assert_eq!(fs::metadata(db.path()).unwrap().len(), FILE_HEADER_SIZE);
    }

    #[test]
    fn test_delete_missing_key_writes_nothing() {
        let (_temp, mut db) = setup_temp_db();
        db.delete(Datum::from("nope")).unwrap();
        assert_eq!(db.size(), FILE_HEADER_SIZE);
        assert_eq!(db.reclaimable_bytes(), 0);
    }

    #[test]
    fn test_reclaimable_bytes_tracks_dead_records() {
        let (_temp, mut db) = setup_temp_db();

        db.store(Datum::from("k"), Datum::from("v1")).unwrap();
        assert_eq!(db.reclaimable_bytes(), 0);

        // Overwrite: first record (12 + 1 + 2) is dead
        db.store(Datum::from("k"), Datum::from("v2")).unwrap();
        assert_eq!(db.reclaimable_bytes(), 15);

        // Delete: second record plus the tombstone (12 + 1) are dead
        db.delete(Datum::from("k")).unwrap();
        assert_eq!(db.reclaimable_bytes(), 15 + 15 + 13);
    }

    #[test]
    fn test_value_offsets_point_at_value_bytes() {
        let (_temp, mut db) = setup_temp_db();

        db.store(Datum::from("a"), Datum::from("first")).unwrap();
        db.store(Datum::from("bb"), Datum::from("second")).unwrap();

        assert_eq!(db.fetch(Datum::from("a")).unwrap(), Some(b"first".to_vec()));
        assert_eq!(db.fetch(Datum::from("bb")).unwrap(), Some(b"second".to_vec()));
    }
}
