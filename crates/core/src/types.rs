//! Core numeric types
//!
//! - SequenceNumber: Monotonic write sequence assigned by the engine
//! - FileNumber: Number embedded in table, blob, WAL, manifest and options
//!   file names

/// Monotonic sequence number of the engine's most recent write.
///
/// A checkpoint reports the sequence number it is consistent as of.
pub type SequenceNumber = u64;

/// File number embedded in an engine file name (`000042.sst` is 42).
pub type FileNumber = u64;

/// Sentinel "no file" number.
///
/// Used for `oldest_blob_file_number` when a table references no blob file.
pub const INVALID_FILE_NUMBER: FileNumber = 0;
