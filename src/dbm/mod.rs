//! Hash Database Engine
//!
//! Single-file hash database providing the raw primitives the store is
//! built on: store, fetch, delete, first-key and next-key.
//!
//! ## Responsibilities
//! - Own the database file handle (open/close)
//! - Append-only record log with CRC32 checksums
//! - In-memory bucketed hash index, rebuilt on open
//! - Torn-tail recovery and offline compaction
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ File Header (6 bytes)                       │
//! │ ┌────────────────┬──────────────┐           │
//! │ │ Magic "SKVD"(4)│ Version (2)  │           │
//! │ └────────────────┴──────────────┘           │
//! ├─────────────────────────────────────────────┤
//! │ Record 1                                    │
//! │ ┌─────────┬───────────┬───────────┬──────┬───────┐
//! │ │ CRC (4) │KeyLen (4) │ValLen (4) │ Key  │ Value │
//! │ └─────────┴───────────┴───────────┴──────┴───────┘
//! │ ... (ValLen = u32::MAX means tombstone)     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Traversal order is bucket order (CRC32 of the key), then insertion order
//! within a bucket. Callers must not rely on it.

mod database;
mod datum;
mod index;
mod record;

pub use database::{Database, DB_FILE_EXTENSION};
pub use datum::Datum;
