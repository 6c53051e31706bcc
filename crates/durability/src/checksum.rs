//! Per-file checksums recorded in the manifest
//!
//! The engine computes a whole-file checksum when it writes a table or blob
//! file and records it in the version edit that adds the file. Checkpoint
//! only looks these up; it never hashes anything itself.
//!
//! Files written before checksums were recorded have no entry. Lookups for
//! them are not errors: callers substitute [`FileChecksum::unknown`] so a
//! consumer can tell "no checksum available" from "checksum omitted".

use std::collections::BTreeMap;
use std::path::Path;

use strata_core::{FileNumber, Result};
use tracing::debug;

use crate::env::FileSystem;
use crate::format::ManifestReader;

/// Checksum function name for files without a recorded checksum
pub const UNKNOWN_FILE_CHECKSUM_FUNC_NAME: &str = "unknown";

/// Checksum value for files without a recorded checksum
pub const UNKNOWN_FILE_CHECKSUM: &str = "unknown";

/// Checksum of one file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileChecksum {
    /// Name of the function that produced the value (e.g. `crc32c`)
    pub func_name: String,
    /// Checksum value as recorded by the engine
    pub value: String,
}

impl FileChecksum {
    /// Create a checksum pair
    pub fn new(func_name: impl Into<String>, value: impl Into<String>) -> Self {
        FileChecksum {
            func_name: func_name.into(),
            value: value.into(),
        }
    }

    /// The "unknown" sentinel pair
    pub fn unknown() -> Self {
        FileChecksum::new(UNKNOWN_FILE_CHECKSUM_FUNC_NAME, UNKNOWN_FILE_CHECKSUM)
    }

    /// True for the sentinel pair
    pub fn is_unknown(&self) -> bool {
        self.func_name == UNKNOWN_FILE_CHECKSUM_FUNC_NAME && self.value == UNKNOWN_FILE_CHECKSUM
    }
}

impl Default for FileChecksum {
    fn default() -> Self {
        Self::unknown()
    }
}

/// File number to checksum mapping for the live files of a manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileChecksumList {
    checksums: BTreeMap<FileNumber, FileChecksum>,
}

impl FileChecksumList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or replace) the checksum of a file
    pub fn insert_one_file_checksum(&mut self, file_number: FileNumber, checksum: FileChecksum) {
        self.checksums.insert(file_number, checksum);
    }

    /// Forget a file
    pub fn remove_one_file_checksum(&mut self, file_number: FileNumber) {
        self.checksums.remove(&file_number);
    }

    /// Checksum of a file, `None` if the manifest holds none
    pub fn search_one_file_checksum(&self, file_number: FileNumber) -> Option<&FileChecksum> {
        self.checksums.get(&file_number)
    }

    /// Checksum of a file, or the unknown pair
    pub fn checksum_or_unknown(&self, file_number: FileNumber) -> FileChecksum {
        self.search_one_file_checksum(file_number)
            .cloned()
            .unwrap_or_else(FileChecksum::unknown)
    }

    /// Number of files with a recorded checksum
    pub fn len(&self) -> usize {
        self.checksums.len()
    }

    /// True when no file has a recorded checksum
    pub fn is_empty(&self) -> bool {
        self.checksums.is_empty()
    }

    /// Iterate in file number order
    pub fn iter(&self) -> impl Iterator<Item = (FileNumber, &FileChecksum)> {
        self.checksums.iter().map(|(n, c)| (*n, c))
    }
}

fn recorded(func_name: &str, value: &str) -> Option<FileChecksum> {
    if func_name.is_empty() {
        None
    } else {
        Some(FileChecksum::new(func_name, value))
    }
}

/// Build the checksum list from the first `manifest_size` bytes of a manifest.
///
/// Replays every version edit: added table and blob files contribute their
/// recorded checksum, deleted files are dropped. A manifest with no checksum
/// records at all yields an empty list.
///
/// # Errors
///
/// I/O errors reading the manifest, `Corruption` for a damaged record.
pub fn get_file_checksums_from_manifest(
    fs: &dyn FileSystem,
    manifest_path: &Path,
    manifest_size: u64,
) -> Result<FileChecksumList> {
    let mut reader = ManifestReader::open(fs, manifest_path, manifest_size)?;
    let mut list = FileChecksumList::new();
    let mut edits = 0usize;

    while let Some(edit) = reader.next_edit()? {
        edits += 1;
        for deleted in &edit.deleted_files {
            list.remove_one_file_checksum(deleted.file_number);
        }
        for blob_number in &edit.deleted_blob_files {
            list.remove_one_file_checksum(*blob_number);
        }
        for file in &edit.new_files {
            match recorded(&file.file_checksum_func_name, &file.file_checksum) {
                Some(checksum) => list.insert_one_file_checksum(file.file_number, checksum),
                None => list.remove_one_file_checksum(file.file_number),
            }
        }
        for blob in &edit.new_blob_files {
            match recorded(&blob.file_checksum_func_name, &blob.file_checksum) {
                Some(checksum) => list.insert_one_file_checksum(blob.blob_file_number, checksum),
                None => list.remove_one_file_checksum(blob.blob_file_number),
            }
        }
    }

    debug!(
        target: "strata::manifest",
        manifest = %manifest_path.display(),
        edits,
        checksums = list.len(),
        "Loaded file checksums from manifest"
    );
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::LocalFileSystem;
    use crate::format::{
        DeletedFileEntry, ManifestWriter, NewBlobFileEntry, NewFileEntry, VersionEdit,
    };
    use tempfile::tempdir;

    fn new_file(number: FileNumber, func: &str, value: &str) -> NewFileEntry {
        NewFileEntry {
            file_number: number,
            file_size: 10,
            file_checksum_func_name: func.to_string(),
            file_checksum: value.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_unknown_sentinel() {
        let unknown = FileChecksum::unknown();
        assert_eq!(unknown.func_name, "unknown");
        assert_eq!(unknown.value, "unknown");
        assert!(unknown.is_unknown());
        assert!(!FileChecksum::new("crc32c", "deadbeef").is_unknown());
    }

    #[test]
    fn test_resolve_from_manifest() {
        let dir = tempdir().unwrap();
        let fs = LocalFileSystem::new();
        let path = dir.path().join("MANIFEST-000001");

        let mut writer = ManifestWriter::create(&fs, &path).unwrap();
        writer
            .add_record(&VersionEdit {
                new_files: vec![
                    new_file(7, "crc32c", "deadbeef"),
                    new_file(8, "", ""),
                    new_file(9, "crc32c", "0badf00d"),
                ],
                new_blob_files: vec![NewBlobFileEntry {
                    blob_file_number: 10,
                    total_blob_bytes: 4,
                    file_checksum_func_name: "xxh64".to_string(),
                    file_checksum: "abcd".to_string(),
                }],
                ..Default::default()
            })
            .unwrap();
        let size = writer
            .add_record(&VersionEdit {
                deleted_files: vec![DeletedFileEntry {
                    level: 0,
                    file_number: 9,
                }],
                ..Default::default()
            })
            .unwrap();

        let list = get_file_checksums_from_manifest(&fs, &path, size).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(
            list.search_one_file_checksum(7),
            Some(&FileChecksum::new("crc32c", "deadbeef"))
        );
        assert_eq!(list.search_one_file_checksum(8), None);
        assert_eq!(list.search_one_file_checksum(9), None);
        assert_eq!(list.checksum_or_unknown(8), FileChecksum::unknown());
        assert_eq!(
            list.search_one_file_checksum(10),
            Some(&FileChecksum::new("xxh64", "abcd"))
        );
    }

    #[test]
    fn test_manifest_without_checksums() {
        let dir = tempdir().unwrap();
        let fs = LocalFileSystem::new();
        let path = dir.path().join("MANIFEST-000001");

        let mut writer = ManifestWriter::create(&fs, &path).unwrap();
        let size = writer
            .add_record(&VersionEdit {
                new_files: vec![new_file(7, "", "")],
                ..Default::default()
            })
            .unwrap();

        let list = get_file_checksums_from_manifest(&fs, &path, size).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_size_limit_respected() {
        let dir = tempdir().unwrap();
        let fs = LocalFileSystem::new();
        let path = dir.path().join("MANIFEST-000001");

        let mut writer = ManifestWriter::create(&fs, &path).unwrap();
        let size = writer
            .add_record(&VersionEdit {
                new_files: vec![new_file(7, "crc32c", "11111111")],
                ..Default::default()
            })
            .unwrap();
        writer
            .add_record(&VersionEdit {
                new_files: vec![new_file(8, "crc32c", "22222222")],
                ..Default::default()
            })
            .unwrap();

        let list = get_file_checksums_from_manifest(&fs, &path, size).unwrap();
        assert_eq!(list.len(), 1);
        assert!(list.search_one_file_checksum(8).is_none());
    }
}
