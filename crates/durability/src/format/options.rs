//! OPTIONS file format
//!
//! The engine persists its configuration as a TOML document so a copy of the
//! database directory can be opened without the original process:
//!
//! ```toml
//! [db_options]
//! wal_dir = ""
//! db_log_dir = ""
//! max_open_files = 1000
//!
//! [[column_family]]
//! name = "default"
//! comparator = "leveldb.BytewiseComparator"
//! write_buffer_size = 67108864
//! ```
//!
//! Only the fields checkpoint needs are typed; every other key is carried
//! through untouched.

use std::path::Path;

use serde::{Deserialize, Serialize};
use strata_core::{Error, Result};

use crate::database::DbOptions;
use crate::env::FileSystem;
use crate::file_util::{create_file, read_file_to_string};

/// Comparator used when a column family section does not name one
pub const DEFAULT_COMPARATOR: &str = "leveldb.BytewiseComparator";

fn default_comparator() -> String {
    DEFAULT_COMPARATOR.to_string()
}

/// Database-wide options section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DbOptionsSection {
    /// Info log directory, empty for the database directory
    #[serde(default)]
    pub db_log_dir: String,
    /// WAL directory, empty for the database directory
    #[serde(default)]
    pub wal_dir: String,
    /// Remaining options, preserved verbatim
    #[serde(flatten)]
    pub extra: toml::Table,
}

/// Per column family options section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnFamilySection {
    /// Column family name
    pub name: String,
    /// Key comparator name
    #[serde(default = "default_comparator")]
    pub comparator: String,
    /// Remaining options, preserved verbatim
    #[serde(flatten)]
    pub extra: toml::Table,
}

impl ColumnFamilySection {
    /// Section with no extra options
    pub fn new(name: impl Into<String>, comparator: impl Into<String>) -> Self {
        ColumnFamilySection {
            name: name.into(),
            comparator: comparator.into(),
            extra: toml::Table::new(),
        }
    }
}

/// Parsed OPTIONS file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionsFile {
    /// Database-wide options
    #[serde(default)]
    pub db_options: DbOptionsSection,
    /// Column families, in creation order
    #[serde(default, rename = "column_family")]
    pub column_families: Vec<ColumnFamilySection>,
}

impl OptionsFile {
    /// Build an options file from engine options
    pub fn from_db_options(options: &DbOptions, column_families: Vec<ColumnFamilySection>) -> Self {
        let dir_string = |dir: &Option<std::path::PathBuf>| {
            dir.as_ref()
                .map(|d| d.to_string_lossy().into_owned())
                .unwrap_or_default()
        };
        OptionsFile {
            db_options: DbOptionsSection {
                db_log_dir: dir_string(&options.db_log_dir),
                wal_dir: dir_string(&options.wal_dir),
                extra: toml::Table::new(),
            },
            column_families,
        }
    }

    /// Parse from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Render as TOML text
    pub fn render(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Read and parse an options file
    ///
    /// # Errors
    ///
    /// `Serialization` if the file is not a valid options document.
    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self> {
        let content = read_file_to_string(fs, path)?;
        Self::parse(&content).map_err(|e| {
            Error::Serialization(format!("options file {}: {}", path.display(), e))
        })
    }

    /// Serialize and write to `path`
    pub fn persist(&self, fs: &dyn FileSystem, path: &Path, use_fsync: bool) -> Result<()> {
        create_file(fs, path, &self.render()?, use_fsync)
    }
}

/// Copy an options file, overriding the log and WAL directories.
///
/// Every other option is preserved. A checkpoint uses this so the copied
/// options point at the checkpoint rather than the source database.
pub fn copy_options_file(
    fs: &dyn FileSystem,
    src: &Path,
    dst: &Path,
    db_log_dir: &str,
    wal_dir: &str,
    use_fsync: bool,
) -> Result<()> {
    let mut options = OptionsFile::load(fs, src)?;
    options.db_options.db_log_dir = db_log_dir.to_string();
    options.db_options.wal_dir = wal_dir.to_string();
    options.persist(fs, dst, use_fsync)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::LocalFileSystem;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"
[db_options]
wal_dir = "/data/wal"
db_log_dir = "/data/logs"
max_open_files = 1000
create_if_missing = true

[[column_family]]
name = "default"
write_buffer_size = 67108864

[[column_family]]
name = "users"
comparator = "rev"
"#;

    #[test]
    fn test_parse_sample() {
        let options = OptionsFile::parse(SAMPLE).unwrap();
        assert_eq!(options.db_options.wal_dir, "/data/wal");
        assert_eq!(options.db_options.db_log_dir, "/data/logs");
        assert_eq!(
            options.db_options.extra.get("max_open_files"),
            Some(&toml::Value::Integer(1000))
        );
        assert_eq!(options.column_families.len(), 2);
        assert_eq!(options.column_families[0].comparator, DEFAULT_COMPARATOR);
        assert_eq!(options.column_families[1].comparator, "rev");
    }

    #[test]
    fn test_parse_garbage_is_serialization_error() {
        let err = OptionsFile::parse("[db_options\nwal_dir = ").unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_copy_overrides_only_dirs() {
        let dir = tempdir().unwrap();
        let fs = LocalFileSystem::new();
        let src = dir.path().join("OPTIONS-000004");
        let dst = dir.path().join("OPTIONS-000004.copy");
        std::fs::write(&src, SAMPLE).unwrap();

        copy_options_file(&fs, &src, &dst, "", "/ckpt", false).unwrap();

        let copied = OptionsFile::load(&fs, &dst).unwrap();
        let original = OptionsFile::parse(SAMPLE).unwrap();
        assert_eq!(copied.db_options.db_log_dir, "");
        assert_eq!(copied.db_options.wal_dir, "/ckpt");
        assert_eq!(copied.db_options.extra, original.db_options.extra);
        assert_eq!(copied.column_families, original.column_families);
    }

    #[test]
    fn test_copy_unparsable_source_fails() {
        let dir = tempdir().unwrap();
        let fs = LocalFileSystem::new();
        let src = dir.path().join("OPTIONS-000004");
        std::fs::write(&src, "not = [valid").unwrap();

        let err = copy_options_file(&fs, &src, &dir.path().join("dst"), "", "", false).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
        assert!(!dir.path().join("dst").exists());
    }

    #[test]
    fn test_from_db_options() {
        let options = DbOptions::default().with_wal_dir("/wal");
        let file = OptionsFile::from_db_options(
            &options,
            vec![ColumnFamilySection::new("default", DEFAULT_COMPARATOR)],
        );
        let reparsed = OptionsFile::parse(&file.render().unwrap()).unwrap();
        assert_eq!(reparsed.db_options.wal_dir, "/wal");
        assert_eq!(reparsed.db_options.db_log_dir, "");
        assert_eq!(reparsed.column_families[0].name, "default");
    }
}
