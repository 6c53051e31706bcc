//! Database-facing types
//!
//! - `engine`: The capability interface a running engine offers
//! - `metadata`: Column family and table file metadata
//! - `config`: Options that decide file placement and syncing
//! - `paths`: Directory layout and file name joining

pub mod config;
pub mod engine;
pub mod metadata;
pub mod paths;

pub use config::{ConfigError, DbOptions};
pub use engine::{DbEngine, LiveFiles, WalFile, WalFileKind};
pub use metadata::{
    ColumnFamilyHandle, ColumnFamilyMetaData, ExportImportFilesMetaData, LevelMetaData,
    LiveFileMetaData, SstFileMetaData,
};
pub use paths::{join_file_name, DbPaths};
