//! Strata checkpoint - consistent copies of a live LSM database
//!
//! Two operations run against any engine implementing [`DbEngine`]:
//!
//! - **Checkpoint**: an openable copy of the whole database, consistent as
//!   of one sequence number, built while writes continue
//! - **Export**: the table files of one column family plus the metadata
//!   needed to ingest them into another database
//!
//! # Quick Start
//!
//! ```ignore
//! use strata_checkpoint::{Checkpoint, CheckpointOptions};
//!
//! let checkpoint = Checkpoint::new(&db);
//! let info = checkpoint.create_checkpoint("/backups/db-1".as_ref(), &CheckpointOptions::default())?;
//!
//! let exported = checkpoint.export_column_family(&users, "/exports/users".as_ref())?;
//! for file in &exported.files {
//!     println!("{} on level {}", file.name, file.level);
//! }
//! ```
//!
//! # Architecture
//!
//! Errors, file numbers and file name parsing live in `strata-core`. The
//! checkpoint machinery, the on-disk formats it reads and writes, and the
//! file system abstraction live in `strata-durability`. This crate
//! re-exports the public surface of both.

pub use strata_core::{Error, FileNumber, FileType, Result, SequenceNumber};
pub use strata_durability::{
    create_custom_checkpoint, export_files_in_metadata, get_file_checksums_from_manifest,
    Checkpoint, CheckpointInfo, CheckpointOptions, CheckpointSink, ColumnFamilyHandle,
    ColumnFamilyMetaData, CustomCheckpointOptions, DbEngine, DbOptions,
    ExportImportFilesMetaData, FileChecksum, FileChecksumList, FileSystem, LiveFileMetaData,
    LiveFiles, LocalFileSystem, StagingSink, WalFile, WalFileKind,
};
