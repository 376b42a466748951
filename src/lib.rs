//! # simple-kv
//!
//! A minimal persistent key-value store:
//! - String keys, opaque byte values
//! - One hash database file per store
//! - Every mutation is flushed to stable storage before it returns
//! - Forward-only iteration over all keys
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 KeyValueStore (trait)                        │
//! │        get / put / delete / set(None = delete) / keys        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      DbmStore                                │
//! │     key encoding · fsync after mutation · open errors        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  Datum (borrowed exchange buffer)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   dbm::Database                              │
//! │  store · fetch · delete · first_key · next_key · compact     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!                 ┌─────▼─────┐
//!                 │ {path}.db │
//!                 └───────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use simple_kv::{DbmStore, KeyValueStore};
//!
//! let mut store = DbmStore::open("/tmp/example").unwrap();
//! store.put("greeting", Bytes::from_static(b"hello"));
//! assert_eq!(store.get("greeting"), Some(Bytes::from_static(b"hello")));
//!
//! store.set("greeting", None);
//! assert_eq!(store.get("greeting"), None);
//!
//! for key in &store {
//!     println!("{key}");
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod dbm;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use error::{KvError, Result};
pub use store::{DbmStore, KeyValueStore, Keys};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of simple-kv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
