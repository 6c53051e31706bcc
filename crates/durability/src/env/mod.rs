//! File-system abstraction
//!
//! Every byte the checkpoint engine reads or writes goes through
//! [`FileSystem`]. This is the seam that lets tests inject faults (a link
//! that reports cross-device, a failed rename) without touching the
//! orchestration code.
//!
//! # Thread Safety
//!
//! Implementations must be `Send + Sync`; the engine hands one out to any
//! thread running a checkpoint.

mod local;

pub use local::LocalFileSystem;

use std::io::Read;
use std::path::Path;
use strata_core::Result;

/// Sequential, append-only output file.
pub trait WritableFile: Send {
    /// Append bytes at the end of the file.
    fn append(&mut self, data: &[u8]) -> Result<()>;

    /// Push buffered bytes to the operating system.
    fn flush(&mut self) -> Result<()>;

    /// Make the contents durable.
    ///
    /// With `use_fsync` the file metadata is synced as well (`fsync`),
    /// otherwise only the data (`fdatasync`).
    fn sync(&mut self, use_fsync: bool) -> Result<()>;
}

/// Handle to an open directory, used to make renames durable.
pub trait Directory: Send {
    /// fsync the directory entry table.
    fn fsync(&self) -> Result<()>;
}

/// File-system capability consumed by checkpoint and export.
pub trait FileSystem: Send + Sync {
    /// Whether `path` exists. Absence is not an error.
    fn file_exists(&self, path: &Path) -> Result<bool>;

    /// Create a single directory. The parent must exist.
    fn create_dir(&self, path: &Path) -> Result<()>;

    /// Create a directory unless it already exists.
    fn create_dir_if_missing(&self, path: &Path) -> Result<()> {
        if self.file_exists(path)? {
            return Ok(());
        }
        self.create_dir(path)
    }

    /// Names (not paths) of the entries in a directory.
    fn get_children(&self, path: &Path) -> Result<Vec<String>>;

    /// Delete a file.
    fn delete_file(&self, path: &Path) -> Result<()>;

    /// Delete an empty directory.
    fn delete_dir(&self, path: &Path) -> Result<()>;

    /// Atomically rename `src` to `dst` within one file system.
    fn rename_file(&self, src: &Path, dst: &Path) -> Result<()>;

    /// Create a hard link `dst` pointing at `src`.
    ///
    /// Returns `Error::NotSupported` when the two paths live on different
    /// devices or the file system cannot link at all.
    fn link_file(&self, src: &Path, dst: &Path) -> Result<()>;

    /// Size of a file in bytes.
    fn file_size(&self, path: &Path) -> Result<u64>;

    /// Open a file for sequential reading.
    fn new_sequential_file(&self, path: &Path) -> Result<Box<dyn Read + Send>>;

    /// Create (or truncate) a file for writing.
    fn new_writable_file(&self, path: &Path) -> Result<Box<dyn WritableFile>>;

    /// Open a directory handle.
    fn new_directory(&self, path: &Path) -> Result<Box<dyn Directory>>;
}
