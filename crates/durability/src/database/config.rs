//! Database options consumed by checkpoint
//!
//! The subset of the engine's configuration that decides where files live
//! and how they are made durable.

use std::path::{Path, PathBuf};

/// Engine options relevant to checkpoint and export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbOptions {
    /// Two-phase commit enabled. Prepared transactions may live only in the
    /// WAL, so the memtable is always flushed before a checkpoint.
    pub allow_2pc: bool,
    /// Directory holding WAL segments (default: the database directory)
    pub wal_dir: Option<PathBuf>,
    /// Directory holding info logs (default: the database directory)
    pub db_log_dir: Option<PathBuf>,
    /// Use `fsync` rather than `fdatasync` when syncing written files
    pub use_fsync: bool,
}

impl DbOptions {
    /// Create options with all defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable two-phase commit
    pub fn with_allow_2pc(mut self, allow_2pc: bool) -> Self {
        self.allow_2pc = allow_2pc;
        self
    }

    /// Place WAL segments in a separate directory
    pub fn with_wal_dir(mut self, wal_dir: impl Into<PathBuf>) -> Self {
        self.wal_dir = Some(wal_dir.into());
        self
    }

    /// Place info logs in a separate directory
    pub fn with_db_log_dir(mut self, db_log_dir: impl Into<PathBuf>) -> Self {
        self.db_log_dir = Some(db_log_dir.into());
        self
    }

    /// Sync with `fsync`
    pub fn with_use_fsync(mut self, use_fsync: bool) -> Self {
        self.use_fsync = use_fsync;
        self
    }

    /// Directory WAL segments are read from.
    ///
    /// An unset or empty `wal_dir` means the database directory.
    pub fn wal_dir_or(&self, db_name: &Path) -> PathBuf {
        match &self.wal_dir {
            Some(dir) if !dir.as_os_str().is_empty() => dir.clone(),
            _ => db_name.to_path_buf(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(dir) = &self.wal_dir {
            if dir.to_str().is_none() {
                return Err(ConfigError::NonUtf8Path(dir.clone()));
            }
        }
        if let Some(dir) = &self.db_log_dir {
            if dir.to_str().is_none() {
                return Err(ConfigError::NonUtf8Path(dir.clone()));
            }
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Directory options are persisted as UTF-8 strings
    #[error("Path is not valid UTF-8: {0:?}")]
    NonUtf8Path(PathBuf),
}

impl From<ConfigError> for strata_core::Error {
    fn from(e: ConfigError) -> Self {
        strata_core::Error::invalid_argument(e.to_string())
    }
}
