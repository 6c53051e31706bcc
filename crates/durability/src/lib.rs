//! Durability layer for Strata: online checkpoints and column family export
//!
//! This crate handles everything that touches disk while copying a live
//! database:
//!
//! - Checkpoint: Consistent, openable copies of a running database
//! - Export: Table files and metadata of one column family
//! - Checksums: Per-file checksums recovered from the manifest
//! - Formats: MANIFEST records and the TOML options file
//! - File system abstraction with a local implementation
//! - Testing infrastructure (fake engine, fault injection)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod checkpoint; // Checkpoint, transfer engine, export
pub mod checksum; // Manifest checksum resolver
pub mod database; // Engine interface, metadata, options, paths
pub mod env; // File-system abstraction
pub mod file_util; // Whole-file copy and create
pub mod format; // MANIFEST and OPTIONS formats
pub mod testing; // Fake engine and fault injection

// === Re-exports ===
pub use checkpoint::{
    create_custom_checkpoint, export_files_in_metadata, Checkpoint, CheckpointInfo,
    CheckpointOptions, CheckpointSink, CustomCheckpointOptions, StagingSink,
};
pub use checksum::{get_file_checksums_from_manifest, FileChecksum, FileChecksumList};
pub use database::{
    ColumnFamilyHandle, ColumnFamilyMetaData, DbEngine, DbOptions, ExportImportFilesMetaData,
    LiveFileMetaData, LiveFiles, WalFile, WalFileKind,
};
pub use env::{FileSystem, LocalFileSystem};
