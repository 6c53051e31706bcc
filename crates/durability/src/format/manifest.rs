//! MANIFEST record format
//!
//! The manifest is an append-only stream of version edits. Each edit is one
//! framed record:
//!
//! ```text
//! len(u32 LE) + crc32(u32 LE) + payload(len bytes)
//! ```
//!
//! where the payload is a MessagePack-encoded [`VersionEdit`] and the CRC
//! covers the payload only.
//!
//! The live-file listing reports a manifest *size* alongside its name; a
//! reader given that size stops there even if the file has grown since.
//! A record cut off by the size limit (or by a crash) ends the stream; a
//! record whose CRC does not match is corruption.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strata_core::{Error, FileNumber, Result, SequenceNumber};
use tracing::debug;

use crate::env::{FileSystem, WritableFile};

/// Size of the per-record frame header
pub const MANIFEST_RECORD_HEADER_SIZE: usize = 8;

/// A table file added by an edit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFileEntry {
    /// Level the file is added to
    pub level: i32,
    /// File number
    pub file_number: FileNumber,
    /// File size in bytes
    pub file_size: u64,
    /// Smallest sequence number in the file
    pub smallest_seqno: SequenceNumber,
    /// Largest sequence number in the file
    pub largest_seqno: SequenceNumber,
    /// Smallest user key
    pub smallest_key: Vec<u8>,
    /// Largest user key
    pub largest_key: Vec<u8>,
    /// Oldest blob file referenced, 0 for none
    pub oldest_blob_file_number: FileNumber,
    /// Checksum function name; empty for files written before checksums
    #[serde(default)]
    pub file_checksum_func_name: String,
    /// Checksum value
    #[serde(default)]
    pub file_checksum: String,
}

/// A table file removed by an edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedFileEntry {
    /// Level the file is removed from
    pub level: i32,
    /// File number
    pub file_number: FileNumber,
}

/// A blob file added by an edit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBlobFileEntry {
    /// Blob file number
    pub blob_file_number: FileNumber,
    /// Total bytes of blob data
    pub total_blob_bytes: u64,
    /// Checksum function name; empty when none was recorded
    #[serde(default)]
    pub file_checksum_func_name: String,
    /// Checksum value
    #[serde(default)]
    pub file_checksum: String,
}

/// One atomic change to the set of files making up a column family
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEdit {
    /// Column family the edit applies to
    #[serde(default)]
    pub column_family: u32,
    /// Comparator name, recorded when a column family is created
    #[serde(default)]
    pub comparator: Option<String>,
    /// WAL segments below this number are no longer needed
    #[serde(default)]
    pub log_number: Option<u64>,
    /// Next file number to allocate
    #[serde(default)]
    pub next_file_number: Option<FileNumber>,
    /// Last sequence number persisted by this edit
    #[serde(default)]
    pub last_sequence: Option<SequenceNumber>,
    /// Table files added
    #[serde(default)]
    pub new_files: Vec<NewFileEntry>,
    /// Table files removed
    #[serde(default)]
    pub deleted_files: Vec<DeletedFileEntry>,
    /// Blob files added
    #[serde(default)]
    pub new_blob_files: Vec<NewBlobFileEntry>,
    /// Blob files removed
    #[serde(default)]
    pub deleted_blob_files: Vec<FileNumber>,
}

impl VersionEdit {
    /// Encode into a framed record
    pub fn encode_record(&self) -> Result<Vec<u8>> {
        let payload =
            rmp_serde::to_vec_named(self).map_err(|e| Error::Serialization(e.to_string()))?;
        let len = u32::try_from(payload.len())
            .map_err(|_| Error::Serialization("version edit too large".to_string()))?;

        let mut buf = Vec::with_capacity(MANIFEST_RECORD_HEADER_SIZE + payload.len());
        buf.extend_from_slice(&len.to_le_bytes());
        buf.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
        buf.extend_from_slice(&payload);
        Ok(buf)
    }
}

/// Appends version edits to a manifest file
pub struct ManifestWriter {
    file: Box<dyn WritableFile>,
    size: u64,
}

impl ManifestWriter {
    /// Create a new, empty manifest at `path`
    pub fn create(fs: &dyn FileSystem, path: &Path) -> Result<Self> {
        Ok(ManifestWriter {
            file: fs.new_writable_file(path)?,
            size: 0,
        })
    }

    /// Append an edit and sync it. Returns the new manifest size.
    pub fn add_record(&mut self, edit: &VersionEdit) -> Result<u64> {
        let record = edit.encode_record()?;
        self.file.append(&record)?;
        self.file.sync(false)?;
        self.size += record.len() as u64;
        Ok(self.size)
    }

    /// Bytes written so far
    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Reads version edits from a manifest prefix
pub struct ManifestReader {
    data: Vec<u8>,
    offset: usize,
}

impl ManifestReader {
    /// Read at most `size_limit` bytes of the manifest at `path`
    pub fn open(fs: &dyn FileSystem, path: &Path, size_limit: u64) -> Result<Self> {
        let mut data = Vec::new();
        fs.new_sequential_file(path)?
            .take(size_limit)
            .read_to_end(&mut data)?;
        debug!(target: "strata::manifest", path = %path.display(), bytes = data.len(), "Opened manifest for reading");
        Ok(Self::from_bytes(data))
    }

    /// Read edits from an in-memory buffer
    pub fn from_bytes(data: Vec<u8>) -> Self {
        ManifestReader { data, offset: 0 }
    }

    /// Next edit, `None` at the end of the stream
    pub fn next_edit(&mut self) -> Result<Option<VersionEdit>> {
        let remaining = &self.data[self.offset..];
        if remaining.len() < MANIFEST_RECORD_HEADER_SIZE {
            if !remaining.is_empty() {
                debug!(target: "strata::manifest", offset = self.offset, "Truncated manifest record header, stopping");
            }
            return Ok(None);
        }

        let len = u32::from_le_bytes([remaining[0], remaining[1], remaining[2], remaining[3]])
            as usize;
        let stored_crc =
            u32::from_le_bytes([remaining[4], remaining[5], remaining[6], remaining[7]]);
        let body = &remaining[MANIFEST_RECORD_HEADER_SIZE..];
        if body.len() < len {
            debug!(target: "strata::manifest", offset = self.offset, len, "Truncated manifest record, stopping");
            return Ok(None);
        }

        let payload = &body[..len];
        let computed_crc = crc32fast::hash(payload);
        if stored_crc != computed_crc {
            return Err(Error::corruption(format!(
                "manifest record at offset {}: CRC mismatch (stored {:#010x}, computed {:#010x})",
                self.offset, stored_crc, computed_crc
            )));
        }

        let edit: VersionEdit = rmp_serde::from_slice(payload).map_err(|e| {
            Error::corruption(format!(
                "manifest record at offset {}: {}",
                self.offset, e
            ))
        })?;
        self.offset += MANIFEST_RECORD_HEADER_SIZE + len;
        Ok(Some(edit))
    }

    /// Read every remaining edit
    pub fn read_all(&mut self) -> Result<Vec<VersionEdit>> {
        let mut edits = Vec::new();
        while let Some(edit) = self.next_edit()? {
            edits.push(edit);
        }
        Ok(edits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::LocalFileSystem;
    use tempfile::tempdir;

    fn table(number: FileNumber, checksum: Option<(&str, &str)>) -> NewFileEntry {
        let (func, value) = checksum.unwrap_or(("", ""));
        NewFileEntry {
            level: 0,
            file_number: number,
            file_size: 100,
            smallest_seqno: 1,
            largest_seqno: 10,
            smallest_key: b"a".to_vec(),
            largest_key: b"z".to_vec(),
            oldest_blob_file_number: 0,
            file_checksum_func_name: func.to_string(),
            file_checksum: value.to_string(),
        }
    }

    #[test]
    fn test_write_then_read_edits() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("MANIFEST-000001");
        let fs = LocalFileSystem::new();

        let first = VersionEdit {
            comparator: Some("bytewise".to_string()),
            next_file_number: Some(2),
            ..Default::default()
        };
        let second = VersionEdit {
            new_files: vec![table(7, Some(("crc32c", "deadbeef")))],
            last_sequence: Some(10),
            ..Default::default()
        };

        let mut writer = ManifestWriter::create(&fs, &path).unwrap();
        writer.add_record(&first).unwrap();
        let size = writer.add_record(&second).unwrap();
        assert_eq!(size, std::fs::metadata(&path).unwrap().len());

        let edits = ManifestReader::open(&fs, &path, size).unwrap().read_all().unwrap();
        assert_eq!(edits, vec![first, second]);
    }

    #[test]
    fn test_size_limit_hides_later_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("MANIFEST-000001");
        let fs = LocalFileSystem::new();

        let mut writer = ManifestWriter::create(&fs, &path).unwrap();
        let size_after_first = writer.add_record(&VersionEdit::default()).unwrap();
        writer
            .add_record(&VersionEdit {
                new_files: vec![table(9, None)],
                ..Default::default()
            })
            .unwrap();

        let edits = ManifestReader::open(&fs, &path, size_after_first)
            .unwrap()
            .read_all()
            .unwrap();
        assert_eq!(edits.len(), 1);
        assert!(edits[0].new_files.is_empty());
    }

    #[test]
    fn test_truncated_tail_ends_stream() {
        let mut data = VersionEdit::default().encode_record().unwrap();
        let second = VersionEdit {
            log_number: Some(4),
            ..Default::default()
        }
        .encode_record()
        .unwrap();
        data.extend_from_slice(&second[..second.len() - 1]);

        let edits = ManifestReader::from_bytes(data).read_all().unwrap();
        assert_eq!(edits.len(), 1);
    }

    #[test]
    fn test_crc_mismatch_is_corruption() {
        let mut data = VersionEdit {
            log_number: Some(4),
            ..Default::default()
        }
        .encode_record()
        .unwrap();
        let last = data.len() - 1;
        data[last] ^= 0xFF;

        let err = ManifestReader::from_bytes(data).read_all().unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn test_empty_manifest() {
        let edits = ManifestReader::from_bytes(Vec::new()).read_all().unwrap();
        assert!(edits.is_empty());
    }
}
