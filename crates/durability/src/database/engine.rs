//! Engine capability interface
//!
//! The checkpoint engine never reaches into storage internals. Everything it
//! needs from the running database is expressed by [`DbEngine`]: the live
//! file set, the WAL segments, the deletion-protection counter and the
//! per-column-family metadata.

use std::path::Path;

use strata_core::{Result, SequenceNumber};

use super::config::DbOptions;
use super::metadata::{ColumnFamilyHandle, ColumnFamilyMetaData};
use crate::env::FileSystem;

/// Files that make up the database at one moment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveFiles {
    /// Table, blob, manifest, CURRENT and options file names, each with a
    /// leading `/`
    pub files: Vec<String>,
    /// Size of the manifest valid for this listing
    pub manifest_file_size: u64,
}

/// Liveness of a WAL segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalFileKind {
    /// Holds data not yet reflected in the manifest
    Alive,
    /// Retained only for replication/backup
    Archived,
}

/// One WAL segment as enumerated by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalFile {
    /// Log number (from the `<n>.log` name)
    pub log_number: u64,
    /// Size at enumeration time
    pub size_file_bytes: u64,
    /// Alive or archived
    pub kind: WalFileKind,
    /// Name relative to the WAL directory, with a leading `/`
    pub path_name: String,
}

impl WalFile {
    /// True for alive segments
    pub fn is_alive(&self) -> bool {
        self.kind == WalFileKind::Alive
    }
}

/// What a running engine exposes to checkpoint and export.
///
/// Implementations run their own background flush and compaction while these
/// calls are made; the trait makes no atomicity promise across calls.
pub trait DbEngine: Send + Sync {
    /// Database directory
    fn name(&self) -> &Path;

    /// Current options
    fn db_options(&self) -> DbOptions;

    /// File system the database lives on
    fn file_system(&self) -> &dyn FileSystem;

    /// Sequence number of the most recent write
    fn latest_sequence_number(&self) -> SequenceNumber;

    /// Live files and manifest size, optionally flushing memtables first
    fn live_files(&self, flush_memtable: bool) -> Result<LiveFiles>;

    /// WAL segments sorted by log number ascending
    fn sorted_wal_files(&self) -> Result<Vec<WalFile>>;

    /// Hand buffered WAL bytes to the log file, optionally syncing
    fn flush_wal(&self, sync: bool) -> Result<()>;

    /// Smallest log number still needed for recovery, `None` when the
    /// engine cannot report it
    fn min_log_number_to_keep(&self) -> Option<u64>;

    /// Increment the deletion-protection counter.
    ///
    /// `Error::NotSupported` means the engine never deletes files behind
    /// the caller's back.
    fn disable_file_deletions(&self) -> Result<()>;

    /// Decrement the deletion-protection counter (`force` resets it)
    fn enable_file_deletions(&self, force: bool) -> Result<()>;

    /// Snapshot of one column family's files
    fn column_family_metadata(&self, cf: &ColumnFamilyHandle) -> ColumnFamilyMetaData;

    /// Flush one column family's memtable
    fn flush(&self, cf: &ColumnFamilyHandle) -> Result<()>;
}
