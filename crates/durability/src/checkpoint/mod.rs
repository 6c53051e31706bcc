//! Online checkpoints and column family export
//!
//! A checkpoint is an openable copy of a running database, consistent as of
//! one sequence number. An export is a copy of one column family's table
//! files plus the metadata needed to ingest them elsewhere. Both run while
//! the engine keeps accepting writes and compacting in the background.
//!
//! # Module Structure
//!
//! - `transfer`: Which files to link, copy or create ([`create_custom_checkpoint`])
//! - `sink`: [`StagingSink`], the local-directory destination
//! - `staging`: `<target>.tmp` lifecycle, atomic install and rollback
//! - `layout`: WAL destination and options overrides
//! - `guard`: Scoped file deletion protection
//! - `export`: Column family export
//!
//! # Example
//!
//! ```ignore
//! let checkpoint = Checkpoint::new(&db);
//! let info = checkpoint.create_checkpoint("/backups/db-1".as_ref(), &CheckpointOptions::default())?;
//! println!("consistent as of {}", info.sequence_number);
//! ```

/// Emit a tracing event under `strata::checkpoint` or `strata::export`,
/// depending on the [`Operation`] it belongs to.
macro_rules! operation_event {
    ($level:ident, $operation:expr, $($rest:tt)+) => {
        match $operation {
            $crate::checkpoint::Operation::Checkpoint => {
                tracing::$level!(target: "strata::checkpoint", $($rest)+)
            }
            $crate::checkpoint::Operation::Export => {
                tracing::$level!(target: "strata::export", $($rest)+)
            }
        }
    };
}

pub mod export;
pub mod guard;
pub mod layout;
pub mod sink;
pub mod staging;
pub mod transfer;

use std::path::{Path, PathBuf};

use strata_core::{Result, SequenceNumber};
use tracing::{debug, info, warn};

use crate::database::{DbEngine, DbOptions};

pub use export::export_files_in_metadata;
pub use guard::FileDeletionGuard;
pub use layout::CheckpointLayout;
pub use sink::StagingSink;
pub use staging::{clean_directory, normalize_dir, StagingArea, STAGING_SUFFIX};
pub use transfer::{create_custom_checkpoint, CheckpointSink, CustomCheckpointOptions};

/// Operation a staging directory or sink works for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// [`Checkpoint::create_checkpoint`]
    Checkpoint,
    /// [`Checkpoint::export_column_family`]
    Export,
}

impl Operation {
    /// Lower-case name used in log fields
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Checkpoint => "checkpoint",
            Operation::Export => "export",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for [`Checkpoint::create_checkpoint`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointOptions {
    /// WAL size threshold for flushing memtables first.
    ///
    /// `Some(0)` (the default) always flushes, `None` never does, `Some(n)`
    /// flushes once the WAL segments total `n` bytes. Two-phase commit
    /// always flushes.
    pub log_size_for_flush: Option<u64>,
    /// Info log directory the checkpoint is opened with; `None` for the
    /// checkpoint directory
    pub db_log_dir: Option<PathBuf>,
    /// WAL directory the checkpoint is opened with; `None` for the
    /// checkpoint directory. Segments are placed there unless it is the
    /// source database directory.
    pub wal_dir: Option<PathBuf>,
}

impl Default for CheckpointOptions {
    fn default() -> Self {
        CheckpointOptions {
            log_size_for_flush: Some(0),
            db_log_dir: None,
            wal_dir: None,
        }
    }
}

impl CheckpointOptions {
    /// Create options with all defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the WAL size threshold for flushing
    pub fn with_log_size_for_flush(mut self, log_size_for_flush: Option<u64>) -> Self {
        self.log_size_for_flush = log_size_for_flush;
        self
    }

    /// Set the checkpoint's info log directory
    pub fn with_db_log_dir(mut self, db_log_dir: impl Into<PathBuf>) -> Self {
        self.db_log_dir = Some(db_log_dir.into());
        self
    }

    /// Set the checkpoint's WAL directory
    pub fn with_wal_dir(mut self, wal_dir: impl Into<PathBuf>) -> Self {
        self.wal_dir = Some(wal_dir.into());
        self
    }
}

/// Result of a successful checkpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointInfo {
    /// The checkpoint holds every write up to this sequence number
    pub sequence_number: SequenceNumber,
    /// Installed checkpoint directory
    pub path: PathBuf,
}

/// Checkpoints and exports of one database
pub struct Checkpoint<'a> {
    db: &'a dyn DbEngine,
}

impl<'a> Checkpoint<'a> {
    /// Checkpoint handle for `db`
    pub fn new(db: &'a dyn DbEngine) -> Self {
        Checkpoint { db }
    }

    /// Build an openable copy of the database in `checkpoint_dir`.
    ///
    /// Files are staged in `<checkpoint_dir>.tmp` and renamed into place
    /// once complete; on failure the staging directory is removed,
    /// `checkpoint_dir` does not exist, and WAL segments written to an
    /// external WAL directory are deleted.
    ///
    /// Table and blob files are hard-linked when the checkpoint is on the
    /// same file system as the database, copied otherwise.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if `checkpoint_dir` exists
    /// - `InvalidArgument` for an empty or slash-only directory
    /// - anything the engine or the file system reports during the transfer
    pub fn create_checkpoint(
        &self,
        checkpoint_dir: &Path,
        options: &CheckpointOptions,
    ) -> Result<CheckpointInfo> {
        let db_options = self.db.db_options();
        db_options.validate()?;
        let fs = self.db.file_system();

        info!(
            target: "strata::checkpoint",
            dir = %checkpoint_dir.display(),
            "Started the snapshot process"
        );

        let mut staging = StagingArea::prepare(fs, checkpoint_dir, Operation::Checkpoint)?;
        match self.checkpoint_into(&mut staging, &db_options, options) {
            Ok(sequence_number) => {
                info!(
                    target: "strata::checkpoint",
                    dir = %staging.target().display(),
                    sequence_number,
                    "Snapshot DONE"
                );
                Ok(CheckpointInfo {
                    sequence_number,
                    path: staging.target().to_path_buf(),
                })
            }
            Err(e) => {
                info!(
                    target: "strata::checkpoint",
                    dir = %staging.target().display(),
                    error = %e,
                    "Snapshot failed"
                );
                staging.discard();
                Err(e)
            }
        }
    }

    fn checkpoint_into(
        &self,
        staging: &mut StagingArea<'_>,
        db_options: &DbOptions,
        options: &CheckpointOptions,
    ) -> Result<SequenceNumber> {
        let fs = self.db.file_system();
        let layout = CheckpointLayout::resolve(
            fs,
            self.db.name(),
            staging.target(),
            staging.staging(),
            options.db_log_dir.as_deref(),
            options.wal_dir.as_deref(),
        )?;

        let guard = match FileDeletionGuard::acquire(self.db) {
            Ok(guard) => Some(guard),
            Err(e) if e.is_not_supported() => {
                debug!(target: "strata::checkpoint", "Engine does not support disabling file deletions");
                None
            }
            Err(e) => return Err(e),
        };

        let mut sink = StagingSink::new(fs, staging.staging(), db_options.use_fsync)
            .with_wal_dir(&layout.wal_dest)
            .with_options_rewrite(layout.value_log_dir.as_str(), layout.value_wal_dir.as_str());
        let transfer_options = CustomCheckpointOptions::default()
            .with_log_size_for_flush(options.log_size_for_flush);
        let result = create_custom_checkpoint(self.db, &mut sink, &transfer_options);

        if let Some(guard) = guard {
            if let Err(e) = guard.release() {
                warn!(
                    target: "strata::checkpoint",
                    error = %e,
                    "Failed to re-enable file deletions"
                );
            }
        }

        // WAL segments in an external directory are not under staging
        let installed = result.and_then(|sequence_number| staging.install().map(|()| sequence_number));
        if installed.is_err() {
            sink.discard_external_files();
        }
        installed
    }

    /// Transfer a consistent copy of the database through a caller-supplied
    /// sink. See [`create_custom_checkpoint`].
    pub fn create_custom_checkpoint<S: CheckpointSink + ?Sized>(
        &self,
        sink: &mut S,
        options: &CustomCheckpointOptions,
    ) -> Result<SequenceNumber> {
        create_custom_checkpoint(self.db, sink, options)
    }
}
