//! Whole-file helpers built on [`FileSystem`].

use std::io::{self, Read};
use std::path::Path;

use strata_core::{Error, Result};

use crate::env::FileSystem;

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Copy `src` to `dst`.
///
/// With `size_limit == 0` the whole file is copied (its size is sampled
/// once, up front). Otherwise exactly `size_limit` bytes are copied, which
/// pins a file that is still being appended to at a known length.
///
/// # Errors
///
/// `Corruption` if the source ends before the requested length.
pub fn copy_file(
    fs: &dyn FileSystem,
    src: &Path,
    dst: &Path,
    size_limit: u64,
    use_fsync: bool,
) -> Result<()> {
    let size = if size_limit == 0 {
        fs.file_size(src)?
    } else {
        size_limit
    };

    let mut reader = fs.new_sequential_file(src)?;
    let mut writer = fs.new_writable_file(dst)?;
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    let mut remaining = size;

    while remaining > 0 {
        let want = remaining.min(buf.len() as u64) as usize;
        let n = match reader.read(&mut buf[..want]) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        if n == 0 {
            return Err(Error::corruption(format!(
                "file too small: {} ended {} bytes short of {}",
                src.display(),
                remaining,
                size
            )));
        }
        writer.append(&buf[..n])?;
        remaining -= n as u64;
    }

    writer.sync(use_fsync)
}

/// Create `path` holding exactly `contents`.
pub fn create_file(fs: &dyn FileSystem, path: &Path, contents: &str, use_fsync: bool) -> Result<()> {
    let mut writer = fs.new_writable_file(path)?;
    writer.append(contents.as_bytes())?;
    writer.sync(use_fsync)
}

/// Read a whole file into a string.
pub fn read_file_to_string(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let mut contents = String::new();
    fs.new_sequential_file(path)?.read_to_string(&mut contents)?;
    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::LocalFileSystem;
    use tempfile::tempdir;

    #[test]
    fn test_copy_whole_file() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&src, &data).unwrap();

        copy_file(&LocalFileSystem, &src, &dst, 0, false).unwrap();
        assert_eq!(std::fs::read(&dst).unwrap(), data);
    }

    #[test]
    fn test_copy_with_limit_truncates() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        std::fs::write(&src, b"0123456789").unwrap();

        copy_file(&LocalFileSystem, &src, &dst, 4, true).unwrap();
        assert_eq!(std::fs::read(&dst).unwrap(), b"0123");
    }

    #[test]
    fn test_copy_limit_past_end_is_corruption() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        std::fs::write(&src, b"abc").unwrap();

        let err = copy_file(&LocalFileSystem, &src, &dst, 10, false).unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn test_copy_empty_file() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        std::fs::write(&src, b"").unwrap();

        copy_file(&LocalFileSystem, &src, &dst, 0, false).unwrap();
        assert!(dst.exists());
        assert_eq!(std::fs::read(&dst).unwrap().len(), 0);
    }

    #[test]
    fn test_create_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("CURRENT");

        create_file(&LocalFileSystem, &path, "MANIFEST-000001\n", true).unwrap();
        assert_eq!(
            read_file_to_string(&LocalFileSystem, &path).unwrap(),
            "MANIFEST-000001\n"
        );
    }
}
