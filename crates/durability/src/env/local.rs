//! `std::fs` backed file system.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use strata_core::{Error, Result};

use super::{Directory, FileSystem, WritableFile};

/// Whether a failed hard link crossed file systems
#[cfg(unix)]
fn is_cross_device(e: &io::Error) -> bool {
    e.raw_os_error() == Some(libc::EXDEV)
}

#[cfg(not(unix))]
fn is_cross_device(_e: &io::Error) -> bool {
    false
}

fn io_error(op: &str, path: &Path, e: io::Error) -> Error {
    Error::IoError(io::Error::new(
        e.kind(),
        format!("{} {}: {}", op, path.display(), e),
    ))
}

/// File system backed by the host operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    /// Create a new local file system handle
    pub fn new() -> Self {
        LocalFileSystem
    }
}

impl FileSystem for LocalFileSystem {
    fn file_exists(&self, path: &Path) -> Result<bool> {
        match fs::symlink_metadata(path) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error("stat", path, e)),
        }
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        fs::create_dir(path).map_err(|e| io_error("create dir", path, e))
    }

    fn get_children(&self, path: &Path) -> Result<Vec<String>> {
        let mut children = Vec::new();
        for entry in fs::read_dir(path).map_err(|e| io_error("list", path, e))? {
            let entry = entry.map_err(|e| io_error("list", path, e))?;
            children.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(children)
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).map_err(|e| io_error("delete", path, e))
    }

    fn delete_dir(&self, path: &Path) -> Result<()> {
        fs::remove_dir(path).map_err(|e| io_error("delete dir", path, e))
    }

    fn rename_file(&self, src: &Path, dst: &Path) -> Result<()> {
        fs::rename(src, dst).map_err(|e| io_error("rename", src, e))
    }

    fn link_file(&self, src: &Path, dst: &Path) -> Result<()> {
        match fs::hard_link(src, dst) {
            Ok(()) => Ok(()),
            Err(e)
                if is_cross_device(&e) || e.kind() == io::ErrorKind::Unsupported =>
            {
                Err(Error::not_supported(format!(
                    "hard link {} -> {}: {}",
                    src.display(),
                    dst.display(),
                    e
                )))
            }
            Err(e) => Err(io_error("link", src, e)),
        }
    }

    fn file_size(&self, path: &Path) -> Result<u64> {
        fs::metadata(path)
            .map(|m| m.len())
            .map_err(|e| io_error("stat", path, e))
    }

    fn new_sequential_file(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        let file = File::open(path).map_err(|e| io_error("open", path, e))?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn new_writable_file(&self, path: &Path) -> Result<Box<dyn WritableFile>> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(|e| io_error("create", path, e))?;
        Ok(Box::new(LocalWritableFile {
            writer: BufWriter::new(file),
        }))
    }

    fn new_directory(&self, path: &Path) -> Result<Box<dyn Directory>> {
        let dir = File::open(path).map_err(|e| io_error("open dir", path, e))?;
        Ok(Box::new(LocalDirectory { dir }))
    }
}

struct LocalWritableFile {
    writer: BufWriter<File>,
}

impl WritableFile for LocalWritableFile {
    fn append(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn sync(&mut self, use_fsync: bool) -> Result<()> {
        self.writer.flush()?;
        if use_fsync {
            self.writer.get_ref().sync_all()?;
        } else {
            self.writer.get_ref().sync_data()?;
        }
        Ok(())
    }
}

struct LocalDirectory {
    dir: File,
}

impl Directory for LocalDirectory {
    fn fsync(&self) -> Result<()> {
        self.dir.sync_all()?;
        Ok(())
    }
}
