//! Configuration for simple-kv
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for a store instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Database path. The engine appends a `.db` extension:
    ///   {path}.db          (hash database file)
    ///   {path}.db.compact  (temporary, only during compaction)
    pub path: PathBuf,

    /// Permission bits used when the database file is created
    pub file_mode: u32,

    /// Create the database file if it does not exist
    pub create_if_missing: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./simple_kv"),
            file_mode: 0o660, // rw-rw----
            create_if_missing: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the database path (without the `.db` extension)
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Set the permission bits for newly created files
    pub fn file_mode(mut self, mode: u32) -> Self {
        self.config.file_mode = mode;
        self
    }

    /// Set whether a missing database file is created on open
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.config.create_if_missing = create;
        self
    }

    /// Finish building and return the config
    pub fn build(self) -> Config {
        self.config
    }
}
