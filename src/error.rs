//! Error types for simple-kv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Engine code reported when an I/O error carries no OS errno
pub const CODE_UNKNOWN_IO: i32 = -1;

/// Engine code reported when the file is not a database (bad magic/version)
pub const CODE_BAD_FORMAT: i32 = -2;

/// Engine code reported when a key or value exceeds the record size limit
pub const CODE_TOO_LARGE: i32 = -3;

/// Unified error type for simple-kv operations
#[derive(Debug, Error)]
pub enum KvError {
    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    /// The database file could not be opened or created.
    /// Carries the engine's numeric diagnostic, see [`KvError::code`].
    #[error("Unable to open database (code {0})")]
    UnableToOpen(i32),

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Engine Errors
    // -------------------------------------------------------------------------
    #[error("Database file corrupted: {0}")]
    Corruption(String),

    #[error("Entry too large: {0} bytes")]
    EntryTooLarge(usize),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl KvError {
    /// Numeric diagnostic for this error.
    ///
    /// I/O failures report the OS errno (e.g. `EACCES`), engine failures
    /// report one of the negative `CODE_*` constants. Never zero.
    pub fn code(&self) -> i32 {
        match self {
            KvError::UnableToOpen(code) => *code,
            KvError::Io(e) => e.raw_os_error().unwrap_or(CODE_UNKNOWN_IO),
            KvError::Corruption(_) | KvError::Serialization(_) => CODE_BAD_FORMAT,
            KvError::EntryTooLarge(_) => CODE_TOO_LARGE,
        }
    }
}

impl From<bincode::Error> for KvError {
    fn from(e: bincode::Error) -> Self {
        KvError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_code_uses_os_errno() {
        let err = KvError::Io(io::Error::from_raw_os_error(13));
        assert_eq!(err.code(), 13);
    }

    #[test]
    fn test_code_never_zero() {
        let errors = [
            KvError::Io(io::Error::new(io::ErrorKind::Other, "no errno")),
            KvError::Corruption("bad magic".to_string()),
            KvError::EntryTooLarge(usize::MAX),
            KvError::Serialization("eof".to_string()),
        ];
        for err in &errors {
            assert_ne!(err.code(), 0, "{err}");
        }
    }

    #[test]
    fn test_unable_to_open_display() {
        let err = KvError::UnableToOpen(2);
        assert_eq!(err.to_string(), "Unable to open database (code 2)");
    }
}
