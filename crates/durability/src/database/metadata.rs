//! Column family and table file metadata

use std::path::PathBuf;

use strata_core::{FileNumber, SequenceNumber};

/// Identifies one column family (partition) of a database
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnFamilyHandle {
    /// Column family id
    pub id: u32,
    /// Column family name
    pub name: String,
    /// Name of the key comparator
    pub comparator_name: String,
}

impl ColumnFamilyHandle {
    /// Create a handle
    pub fn new(id: u32, name: impl Into<String>, comparator_name: impl Into<String>) -> Self {
        ColumnFamilyHandle {
            id,
            name: name.into(),
            comparator_name: comparator_name.into(),
        }
    }
}

/// One table file as seen by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SstFileMetaData {
    /// File size in bytes
    pub size: u64,
    /// File name with a leading `/`
    pub name: String,
    /// File number
    pub file_number: FileNumber,
    /// Directory holding the file
    pub db_path: PathBuf,
    /// Smallest sequence number in the file
    pub smallest_seqno: SequenceNumber,
    /// Largest sequence number in the file
    pub largest_seqno: SequenceNumber,
    /// Smallest user key
    pub smallest_key: Vec<u8>,
    /// Largest user key
    pub largest_key: Vec<u8>,
    /// Oldest blob file referenced, `INVALID_FILE_NUMBER` for none
    pub oldest_blob_file_number: FileNumber,
}

/// Files on one level
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelMetaData {
    /// Level number
    pub level: i32,
    /// Total bytes on this level
    pub size: u64,
    /// Files on this level
    pub files: Vec<SstFileMetaData>,
}

/// Point-in-time snapshot of a column family's files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnFamilyMetaData {
    /// Column family name
    pub name: String,
    /// Total bytes across all levels
    pub size: u64,
    /// Number of files across all levels
    pub file_count: usize,
    /// Per-level file listing
    pub levels: Vec<LevelMetaData>,
}

impl ColumnFamilyMetaData {
    /// Iterate `(level, file)` over every level
    pub fn files(&self) -> impl Iterator<Item = (i32, &SstFileMetaData)> {
        self.levels
            .iter()
            .flat_map(|level| level.files.iter().map(move |f| (level.level, f)))
    }
}

/// An exported table file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveFileMetaData {
    /// File size in bytes
    pub size: u64,
    /// File name with a leading `/`
    pub name: String,
    /// File number
    pub file_number: FileNumber,
    /// Export directory holding the file
    pub db_path: PathBuf,
    /// Smallest sequence number in the file
    pub smallest_seqno: SequenceNumber,
    /// Largest sequence number in the file
    pub largest_seqno: SequenceNumber,
    /// Smallest user key
    pub smallest_key: Vec<u8>,
    /// Largest user key
    pub largest_key: Vec<u8>,
    /// Oldest blob file referenced, `INVALID_FILE_NUMBER` for none
    pub oldest_blob_file_number: FileNumber,
    /// Level the file lived on
    pub level: i32,
}

/// Result of a successful column family export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportImportFilesMetaData {
    /// Comparator of the exported column family
    pub db_comparator_name: String,
    /// Exported files
    pub files: Vec<LiveFileMetaData>,
}
