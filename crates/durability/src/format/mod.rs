//! On-disk byte formats for the MANIFEST and OPTIONS files.
//!
//! Checkpoint reads the manifest to recover per-file checksums and rewrites
//! the options file so a checkpoint opens standalone. Keeping serialization
//! separate from the checkpoint logic makes format evolution easier to
//! manage.
//!
//! # Module Structure
//!
//! - `manifest`: Framed version-edit records
//! - `options`: TOML options document

pub mod manifest;
pub mod options;

pub use manifest::{
    DeletedFileEntry, ManifestReader, ManifestWriter, NewBlobFileEntry, NewFileEntry, VersionEdit,
    MANIFEST_RECORD_HEADER_SIZE,
};
pub use options::{
    copy_options_file, ColumnFamilySection, DbOptionsSection, OptionsFile, DEFAULT_COMPARATOR,
};
