//! File system wrapper that injects failures

use std::io::{self, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use strata_core::{Error, Result};

use crate::env::{Directory, FileSystem, LocalFileSystem, WritableFile};

fn injected(what: &str, path: &Path) -> Error {
    Error::IoError(io::Error::new(
        io::ErrorKind::Other,
        format!("injected {} failure: {}", what, path.display()),
    ))
}

/// [`LocalFileSystem`] with switchable faults and call counters.
///
/// Every fault is off by default, so an unconfigured instance behaves like
/// the local file system.
#[derive(Default)]
pub struct FaultInjectionFs {
    inner: LocalFileSystem,
    link_not_supported_after: Mutex<Option<usize>>,
    fail_writable_after: Mutex<Option<usize>>,
    fail_rename: AtomicBool,
    fail_dir_fsync: AtomicBool,
    links: AtomicUsize,
    writable_files: AtomicUsize,
    renames: AtomicUsize,
}

impl FaultInjectionFs {
    /// Wrapper with no faults enabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every link report `NotSupported`, as across devices
    pub fn set_link_not_supported(&self, enabled: bool) {
        *self.link_not_supported_after.lock() = if enabled { Some(0) } else { None };
    }

    /// Let `n` links succeed, then report `NotSupported`
    pub fn set_link_not_supported_after(&self, n: usize) {
        *self.link_not_supported_after.lock() = Some(n);
    }

    /// Let `n` writable files be created, then fail
    pub fn fail_writable_files_after(&self, n: usize) {
        *self.fail_writable_after.lock() = Some(n);
    }

    /// Fail every rename
    pub fn set_fail_rename(&self, enabled: bool) {
        self.fail_rename.store(enabled, Ordering::SeqCst);
    }

    /// Fail every directory fsync
    pub fn set_fail_dir_fsync(&self, enabled: bool) {
        self.fail_dir_fsync.store(enabled, Ordering::SeqCst);
    }

    /// Turn every fault off
    pub fn clear_faults(&self) {
        *self.link_not_supported_after.lock() = None;
        *self.fail_writable_after.lock() = None;
        self.fail_rename.store(false, Ordering::SeqCst);
        self.fail_dir_fsync.store(false, Ordering::SeqCst);
    }

    /// Successful links so far
    pub fn link_count(&self) -> usize {
        self.links.load(Ordering::SeqCst)
    }

    /// Writable files created so far (copies and created files)
    pub fn writable_file_count(&self) -> usize {
        self.writable_files.load(Ordering::SeqCst)
    }

    /// Successful renames so far
    pub fn rename_count(&self) -> usize {
        self.renames.load(Ordering::SeqCst)
    }
}

impl FileSystem for FaultInjectionFs {
    fn file_exists(&self, path: &Path) -> Result<bool> {
        self.inner.file_exists(path)
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        self.inner.create_dir(path)
    }

    fn get_children(&self, path: &Path) -> Result<Vec<String>> {
        self.inner.get_children(path)
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        self.inner.delete_file(path)
    }

    fn delete_dir(&self, path: &Path) -> Result<()> {
        self.inner.delete_dir(path)
    }

    fn rename_file(&self, src: &Path, dst: &Path) -> Result<()> {
        if self.fail_rename.load(Ordering::SeqCst) {
            return Err(injected("rename", src));
        }
        self.inner.rename_file(src, dst)?;
        self.renames.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn link_file(&self, src: &Path, dst: &Path) -> Result<()> {
        if let Some(after) = *self.link_not_supported_after.lock() {
            if self.links.load(Ordering::SeqCst) >= after {
                return Err(Error::not_supported(format!(
                    "injected cross-device link: {}",
                    src.display()
                )));
            }
        }
        self.inner.link_file(src, dst)?;
        self.links.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn file_size(&self, path: &Path) -> Result<u64> {
        self.inner.file_size(path)
    }

    fn new_sequential_file(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        self.inner.new_sequential_file(path)
    }

    fn new_writable_file(&self, path: &Path) -> Result<Box<dyn WritableFile>> {
        if let Some(after) = *self.fail_writable_after.lock() {
            if self.writable_files.load(Ordering::SeqCst) >= after {
                return Err(injected("create", path));
            }
        }
        let file = self.inner.new_writable_file(path)?;
        self.writable_files.fetch_add(1, Ordering::SeqCst);
        Ok(file)
    }

    fn new_directory(&self, path: &Path) -> Result<Box<dyn Directory>> {
        let dir = self.inner.new_directory(path)?;
        Ok(Box::new(FaultDirectory {
            inner: dir,
            fail_fsync: self.fail_dir_fsync.load(Ordering::SeqCst),
        }))
    }
}

struct FaultDirectory {
    inner: Box<dyn Directory>,
    fail_fsync: bool,
}

impl Directory for FaultDirectory {
    fn fsync(&self) -> Result<()> {
        if self.fail_fsync {
            return Err(Error::IoError(io::Error::new(
                io::ErrorKind::Other,
                "injected directory fsync failure",
            )));
        }
        self.inner.fsync()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_link_not_supported_after() {
        let dir = tempdir().unwrap();
        let fs = FaultInjectionFs::new();
        let src = dir.path().join("src");
        std::fs::write(&src, b"x").unwrap();

        fs.set_link_not_supported_after(1);
        fs.link_file(&src, &dir.path().join("a")).unwrap();
        let err = fs.link_file(&src, &dir.path().join("b")).unwrap_err();
        assert!(err.is_not_supported());
        assert_eq!(fs.link_count(), 1);

        fs.clear_faults();
        fs.link_file(&src, &dir.path().join("b")).unwrap();
        assert_eq!(fs.link_count(), 2);
    }

    #[test]
    fn test_writable_file_budget() {
        let dir = tempdir().unwrap();
        let fs = FaultInjectionFs::new();
        fs.fail_writable_files_after(1);

        fs.new_writable_file(&dir.path().join("a")).unwrap();
        assert!(fs.new_writable_file(&dir.path().join("b")).is_err());
        assert_eq!(fs.writable_file_count(), 1);
    }

    #[test]
    fn test_rename_and_fsync_faults() {
        let dir = tempdir().unwrap();
        let fs = FaultInjectionFs::new();
        let a = dir.path().join("a");
        std::fs::create_dir(&a).unwrap();

        fs.set_fail_rename(true);
        assert!(fs.rename_file(&a, &dir.path().join("b")).is_err());
        assert!(a.exists());

        fs.set_fail_dir_fsync(true);
        assert!(fs.new_directory(&a).unwrap().fsync().is_err());
        fs.set_fail_dir_fsync(false);
        fs.new_directory(&a).unwrap().fsync().unwrap();
    }
}
