//! Database directory structure
//!
//! A database is a directory of flat files:
//!
//! ```text
//! db/
//! ├── CURRENT             # names the active manifest
//! ├── MANIFEST-000001     # version edits
//! ├── OPTIONS-000004      # persisted options
//! ├── 000007.sst          # table files
//! ├── 000008.blob         # blob files
//! └── 000005.log          # WAL segments (unless wal_dir is set)
//! ```
//!
//! File names reported by the engine carry a leading `/`; they are always
//! joined onto a directory through [`join_file_name`].

use std::path::{Path, PathBuf};

use strata_core::filename;
use strata_core::{FileNumber, Result};

use crate::env::FileSystem;

/// Join an engine file name (`/000012.sst`) onto a directory.
pub fn join_file_name(dir: &Path, fname: &str) -> PathBuf {
    dir.join(fname.trim_start_matches('/'))
}

/// Database directory paths
///
/// Provides access to all paths within a database directory.
#[derive(Debug, Clone)]
pub struct DbPaths {
    /// Root database directory
    root: PathBuf,
    /// WAL directory (the root unless configured otherwise)
    wal_dir: PathBuf,
}

impl DbPaths {
    /// Create paths from root directory, WAL segments inside it
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        DbPaths {
            wal_dir: root.clone(),
            root,
        }
    }

    /// Keep WAL segments in a separate directory
    pub fn with_wal_dir(mut self, wal_dir: impl AsRef<Path>) -> Self {
        self.wal_dir = wal_dir.as_ref().to_path_buf();
        self
    }

    /// Get the root database directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the WAL directory
    pub fn wal_dir(&self) -> &Path {
        &self.wal_dir
    }

    /// Get the CURRENT file path
    pub fn current(&self) -> PathBuf {
        join_file_name(&self.root, &filename::current_file_name())
    }

    /// Get a MANIFEST file path
    pub fn manifest(&self, number: FileNumber) -> PathBuf {
        join_file_name(&self.root, &filename::descriptor_file_name(number))
    }

    /// Get an OPTIONS file path
    pub fn options(&self, number: FileNumber) -> PathBuf {
        join_file_name(&self.root, &filename::options_file_name(number))
    }

    /// Get a table file path
    pub fn table(&self, number: FileNumber) -> PathBuf {
        join_file_name(&self.root, &filename::table_file_name(number))
    }

    /// Get a blob file path
    pub fn blob(&self, number: FileNumber) -> PathBuf {
        join_file_name(&self.root, &filename::blob_file_name(number))
    }

    /// Get a WAL segment path
    pub fn wal(&self, number: FileNumber) -> PathBuf {
        join_file_name(&self.wal_dir, &filename::log_file_name(number))
    }

    /// Create the root and WAL directories, and any missing parents
    pub fn create_directories(&self, fs: &dyn FileSystem) -> Result<()> {
        create_dir_with_parents(fs, &self.root)?;
        create_dir_with_parents(fs, &self.wal_dir)
    }
}

fn create_dir_with_parents(fs: &dyn FileSystem, dir: &Path) -> Result<()> {
    let mut missing: Vec<&Path> = dir
        .ancestors()
        .filter(|p| !p.as_os_str().is_empty())
        .collect();
    missing.reverse();
    for path in missing {
        fs.create_dir_if_missing(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::LocalFileSystem;
    use tempfile::tempdir;

    #[test]
    fn test_join_strips_leading_slash() {
        assert_eq!(
            join_file_name(Path::new("/db"), "/000012.sst"),
            PathBuf::from("/db/000012.sst")
        );
        assert_eq!(
            join_file_name(Path::new("/db"), "CURRENT"),
            PathBuf::from("/db/CURRENT")
        );
    }

    #[test]
    fn test_paths_from_root() {
        let paths = DbPaths::from_root("/tmp/test.db");

        assert_eq!(paths.root(), Path::new("/tmp/test.db"));
        assert_eq!(paths.current(), PathBuf::from("/tmp/test.db/CURRENT"));
        assert_eq!(paths.manifest(1), PathBuf::from("/tmp/test.db/MANIFEST-000001"));
        assert_eq!(paths.options(4), PathBuf::from("/tmp/test.db/OPTIONS-000004"));
        assert_eq!(paths.table(7), PathBuf::from("/tmp/test.db/000007.sst"));
        assert_eq!(paths.blob(8), PathBuf::from("/tmp/test.db/000008.blob"));
        assert_eq!(paths.wal(5), PathBuf::from("/tmp/test.db/000005.log"));
    }

    #[test]
    fn test_separate_wal_dir() {
        let paths = DbPaths::from_root("/tmp/test.db").with_wal_dir("/tmp/wal");
        assert_eq!(paths.wal(5), PathBuf::from("/tmp/wal/000005.log"));
        assert_eq!(paths.table(7), PathBuf::from("/tmp/test.db/000007.sst"));
    }

    #[test]
    fn test_create_directories() {
        let dir = tempdir().unwrap();
        let paths = DbPaths::from_root(dir.path().join("test.db"))
            .with_wal_dir(dir.path().join("logs").join("wal"));

        paths.create_directories(&LocalFileSystem::new()).unwrap();
        assert!(paths.root().is_dir());
        assert!(paths.wal_dir().is_dir());

        // Existing directories are left alone
        paths.create_directories(&LocalFileSystem::new()).unwrap();
    }

    #[test]
    fn test_create_directories_under_file_fails() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("file"), b"x").unwrap();
        let paths = DbPaths::from_root(dir.path().join("file").join("db"));

        let err = paths.create_directories(&LocalFileSystem::new()).unwrap_err();
        assert!(matches!(err, strata_core::Error::IoError(_)));
    }
}
