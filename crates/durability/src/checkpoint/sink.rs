//! [`CheckpointSink`] writing into a local staging directory

use std::path::{Path, PathBuf};

use strata_core::{FileType, Result};

use super::transfer::CheckpointSink;
use super::Operation;
use crate::checksum::FileChecksum;
use crate::database::join_file_name;
use crate::env::FileSystem;
use crate::file_util::{copy_file, create_file};
use crate::format::copy_options_file;

/// Links, copies and creates files under a staging directory.
///
/// WAL segments go to their own destination (see
/// [`CheckpointLayout`](super::layout::CheckpointLayout)). When an options
/// rewrite is configured, OPTIONS files are re-rendered with the given log
/// and WAL directories instead of copied byte for byte.
///
/// Files placed outside the staging directory are remembered so that a
/// failed checkpoint can remove them with
/// [`discard_external_files`](StagingSink::discard_external_files).
pub struct StagingSink<'a> {
    fs: &'a dyn FileSystem,
    staging_dir: PathBuf,
    wal_dir: PathBuf,
    options_rewrite: Option<(String, String)>,
    use_fsync: bool,
    operation: Operation,
    external_files: Vec<PathBuf>,
}

impl<'a> StagingSink<'a> {
    /// Sink writing every file into `staging_dir`
    pub fn new(fs: &'a dyn FileSystem, staging_dir: impl Into<PathBuf>, use_fsync: bool) -> Self {
        let staging_dir = staging_dir.into();
        StagingSink {
            fs,
            wal_dir: staging_dir.clone(),
            staging_dir,
            options_rewrite: None,
            use_fsync,
            operation: Operation::Checkpoint,
            external_files: Vec::new(),
        }
    }

    /// Send WAL segments to a different directory
    pub fn with_wal_dir(mut self, wal_dir: impl Into<PathBuf>) -> Self {
        self.wal_dir = wal_dir.into();
        self
    }

    /// Rewrite OPTIONS files with these `db_log_dir` and `wal_dir` values
    pub fn with_options_rewrite(
        mut self,
        db_log_dir: impl Into<String>,
        wal_dir: impl Into<String>,
    ) -> Self {
        self.options_rewrite = Some((db_log_dir.into(), wal_dir.into()));
        self
    }

    /// Operation the sink's events are logged under
    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operation = operation;
        self
    }

    fn destination(&self, fname: &str, file_type: FileType) -> PathBuf {
        let dir = if file_type == FileType::WalFile {
            &self.wal_dir
        } else {
            &self.staging_dir
        };
        join_file_name(dir, fname)
    }

    fn record(&mut self, dst: PathBuf, result: Result<()>) -> Result<()> {
        if result.is_ok() && !dst.starts_with(&self.staging_dir) {
            self.external_files.push(dst);
        }
        result
    }

    /// Files written outside the staging directory, in creation order
    pub fn external_files(&self) -> &[PathBuf] {
        &self.external_files
    }

    /// Delete every file written outside the staging directory. Failures
    /// are logged, not returned.
    pub fn discard_external_files(&mut self) {
        for path in self.external_files.drain(..) {
            match self.fs.delete_file(&path) {
                Ok(()) => {
                    operation_event!(debug, self.operation, path = %path.display(), "Deleted external file")
                }
                Err(e) => {
                    operation_event!(warn, self.operation, path = %path.display(), error = %e, "Failed to delete external file")
                }
            }
        }
    }
}

impl CheckpointSink for StagingSink<'_> {
    fn link_file(&mut self, src_dir: &Path, fname: &str, file_type: FileType) -> Result<()> {
        operation_event!(debug, self.operation, file = fname, "Hard linking");
        let dst = self.destination(fname, file_type);
        let result = self.fs.link_file(&join_file_name(src_dir, fname), &dst);
        self.record(dst, result)
    }

    fn copy_file(
        &mut self,
        src_dir: &Path,
        fname: &str,
        size_limit: u64,
        file_type: FileType,
        checksum: &FileChecksum,
    ) -> Result<()> {
        operation_event!(
            debug,
            self.operation,
            file = fname,
            size_limit,
            checksum_func = %checksum.func_name,
            "Copying"
        );
        let src = join_file_name(src_dir, fname);
        let dst = self.destination(fname, file_type);
        let result = match (&self.options_rewrite, file_type) {
            (Some((db_log_dir, wal_dir)), FileType::OptionsFile) => {
                copy_options_file(self.fs, &src, &dst, db_log_dir, wal_dir, self.use_fsync)
            }
            _ => copy_file(self.fs, &src, &dst, size_limit, self.use_fsync),
        };
        self.record(dst, result)
    }

    fn create_file(&mut self, fname: &str, contents: &str, file_type: FileType) -> Result<()> {
        operation_event!(debug, self.operation, file = fname, "Creating");
        let dst = self.destination(fname, file_type);
        let result = create_file(self.fs, &dst, contents, self.use_fsync);
        self.record(dst, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::LocalFileSystem;
    use crate::format::OptionsFile;
    use tempfile::tempdir;

    #[test]
    fn test_routes_wal_files() {
        let dir = tempdir().unwrap();
        let fs = LocalFileSystem::new();
        let src = dir.path().join("db");
        let staging = dir.path().join("staging");
        let wal = dir.path().join("wal");
        for d in [&src, &staging, &wal] {
            std::fs::create_dir(d).unwrap();
        }
        std::fs::write(src.join("000003.log"), b"walbytes").unwrap();
        std::fs::write(src.join("000004.sst"), b"table").unwrap();

        let mut sink = StagingSink::new(&fs, &staging, false).with_wal_dir(&wal);
        sink.link_file(&src, "/000004.sst", FileType::TableFile).unwrap();
        sink.copy_file(&src, "/000003.log", 3, FileType::WalFile, &FileChecksum::unknown())
            .unwrap();
        sink.create_file("/CURRENT", "MANIFEST-000001\n", FileType::CurrentFile)
            .unwrap();

        assert_eq!(std::fs::read(staging.join("000004.sst")).unwrap(), b"table");
        assert_eq!(std::fs::read(wal.join("000003.log")).unwrap(), b"wal");
        assert!(!staging.join("000003.log").exists());
        assert_eq!(
            std::fs::read_to_string(staging.join("CURRENT")).unwrap(),
            "MANIFEST-000001\n"
        );
        assert_eq!(sink.external_files(), &[wal.join("000003.log")]);
    }

    #[test]
    fn test_discard_external_files() {
        let dir = tempdir().unwrap();
        let fs = LocalFileSystem::new();
        let src = dir.path().join("db");
        let staging = dir.path().join("staging");
        let wal = dir.path().join("wal");
        for d in [&src, &staging, &wal] {
            std::fs::create_dir(d).unwrap();
        }
        std::fs::write(src.join("000003.log"), b"old").unwrap();
        std::fs::write(src.join("000005.log"), b"new").unwrap();

        let mut sink = StagingSink::new(&fs, &staging, false).with_wal_dir(&wal);
        sink.link_file(&src, "/000003.log", FileType::WalFile).unwrap();
        sink.create_file("/000005.log", "", FileType::WalFile).unwrap();
        sink.create_file("/CURRENT", "MANIFEST-000001\n", FileType::CurrentFile)
            .unwrap();
        assert_eq!(sink.external_files().len(), 2);

        sink.discard_external_files();
        assert!(sink.external_files().is_empty());
        assert!(std::fs::read_dir(&wal).unwrap().next().is_none());
        assert!(staging.join("CURRENT").exists());
        assert!(src.join("000003.log").exists());
    }

    #[test]
    fn test_nested_wal_dir_is_not_external() {
        let dir = tempdir().unwrap();
        let fs = LocalFileSystem::new();
        let src = dir.path().join("db");
        let staging = dir.path().join("staging");
        let wal = staging.join("wal");
        std::fs::create_dir(&src).unwrap();
        std::fs::create_dir_all(&wal).unwrap();
        std::fs::write(src.join("000003.log"), b"wal").unwrap();

        let mut sink = StagingSink::new(&fs, &staging, false).with_wal_dir(&wal);
        sink.link_file(&src, "/000003.log", FileType::WalFile).unwrap();
        assert!(sink.external_files().is_empty());
    }

    #[test]
    fn test_options_rewrite() {
        let dir = tempdir().unwrap();
        let fs = LocalFileSystem::new();
        let src = dir.path().join("db");
        let staging = dir.path().join("staging");
        std::fs::create_dir(&src).unwrap();
        std::fs::create_dir(&staging).unwrap();
        std::fs::write(
            src.join("OPTIONS-000002"),
            "[db_options]\nwal_dir = \"/old\"\nmax_open_files = 10\n",
        )
        .unwrap();

        let mut sink = StagingSink::new(&fs, &staging, false).with_options_rewrite("", "/ckpt");
        sink.copy_file(
            &src,
            "/OPTIONS-000002",
            0,
            FileType::OptionsFile,
            &FileChecksum::unknown(),
        )
        .unwrap();

        let copied = OptionsFile::load(&fs, &staging.join("OPTIONS-000002")).unwrap();
        assert_eq!(copied.db_options.wal_dir, "/ckpt");
        assert_eq!(
            copied.db_options.extra.get("max_open_files"),
            Some(&toml::Value::Integer(10))
        );
    }
}
