//! Cargo manifest (Cargo.toml) handling
//!
//! The manifest is loaded into an in-memory [`CargoManifest`] value. Reading,
//! writing, backing up and restoring the file on disk go through a
//! [`ManifestStore`], so the rewrite protocol can be exercised without touching
//! the filesystem.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use crate::config::defaults;
use crate::error::ManifestError;

/// A `[[bin]]` entry of the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinTarget {
    /// Binary name passed to `cargo build --bin`
    pub name: String,
    /// Source path, relative to the manifest directory
    pub path: String,
}

impl BinTarget {
    /// Create a new binary target
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Whether this target points at `relative`
    pub fn points_at(&self, relative: &Path) -> bool {
        normalized(Path::new(&self.path.replace('\\', "/"))) == normalized(relative)
    }

    fn to_value(&self) -> toml::Value {
        let mut table = toml::Table::new();
        table.insert("name".to_string(), toml::Value::String(self.name.clone()));
        table.insert("path".to_string(), toml::Value::String(self.path.clone()));
        toml::Value::Table(table)
    }
}

fn normalized(path: &Path) -> Vec<Component<'_>> {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Parsed contents of a Cargo.toml
///
/// Everything except the `bin` array is carried through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct CargoManifest {
    table: toml::Table,
}

impl CargoManifest {
    /// Parse manifest text read from `path`
    pub fn parse(path: &Path, content: &str) -> Result<Self, ManifestError> {
        let table = content
            .parse::<toml::Table>()
            .map_err(|source| ManifestError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self { table })
    }

    /// Load and parse the manifest at `path`
    pub fn load(store: &dyn ManifestStore, path: &Path) -> Result<Self, ManifestError> {
        let content = store.read(path)?;
        Self::parse(path, &content)
    }

    /// The raw TOML table
    pub fn table(&self) -> &toml::Table {
        &self.table
    }

    /// Declared binary targets
    ///
    /// A missing `bin` key, or one that is not an array, yields no targets.
    /// Entries without both a `name` and a `path` are skipped.
    pub fn bin_targets(&self) -> Vec<BinTarget> {
        let Some(toml::Value::Array(bins)) = self.table.get("bin") else {
            return Vec::new();
        };

        bins.iter()
            .filter_map(|bin| {
                let bin = bin.as_table()?;
                let name = bin.get("name")?.as_str()?;
                let path = bin.get("path")?.as_str()?;
                Some(BinTarget::new(name, path))
            })
            .collect()
    }

    /// Find the binary target whose path is `relative`
    pub fn find_bin_by_path(&self, relative: &Path) -> Option<BinTarget> {
        self.bin_targets()
            .into_iter()
            .find(|bin| bin.points_at(relative))
    }

    /// Return a copy of this manifest with `target` appended to `bin`
    ///
    /// Existing entries are kept as they are. A non-array `bin` value is
    /// replaced, since cargo would reject it anyway.
    #[must_use]
    pub fn with_bin_target(&self, target: &BinTarget) -> Self {
        let mut table = self.table.clone();
        match table.get_mut("bin") {
            Some(toml::Value::Array(bins)) => bins.push(target.to_value()),
            _ => {
                table.insert(
                    "bin".to_string(),
                    toml::Value::Array(vec![target.to_value()]),
                );
            }
        }
        Self { table }
    }

    /// Serialize the manifest back to TOML text
    pub fn to_toml_string(&self) -> Result<String, ManifestError> {
        toml::to_string(&self.table).map_err(|source| ManifestError::Serialize { source })
    }
}

/// Location of the backup copy for the manifest at `path`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from(defaults::MANIFEST_FILE), OsString::from);
    name.push(defaults::BACKUP_SUFFIX);
    path.with_file_name(name)
}

/// Storage for manifest files and their backups
pub trait ManifestStore {
    /// Read the manifest text
    fn read(&self, path: &Path) -> Result<String, ManifestError>;

    /// Overwrite the manifest with `content`
    fn write(&self, path: &Path, content: &str) -> Result<(), ManifestError>;

    /// Copy the manifest byte for byte to its backup location, replacing any
    /// stale backup
    fn backup(&self, path: &Path) -> Result<(), ManifestError>;

    /// Overwrite the manifest with its backup and remove the backup
    fn restore(&self, path: &Path) -> Result<(), ManifestError>;

    /// Whether a backup exists for the manifest
    fn has_backup(&self, path: &Path) -> bool;
}

/// [`ManifestStore`] backed by the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FsManifestStore;

impl ManifestStore for FsManifestStore {
    fn read(&self, path: &Path) -> Result<String, ManifestError> {
        std::fs::read_to_string(path).map_err(|e| ManifestError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    fn write(&self, path: &Path, content: &str) -> Result<(), ManifestError> {
        std::fs::write(path, content).map_err(|e| ManifestError::Write {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    fn backup(&self, path: &Path) -> Result<(), ManifestError> {
        std::fs::copy(path, backup_path(path)).map_err(|e| ManifestError::Backup {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        Ok(())
    }

    fn restore(&self, path: &Path) -> Result<(), ManifestError> {
        let backup = backup_path(path);
        let restore_err = |e: std::io::Error| ManifestError::Restore {
            path: path.to_path_buf(),
            error: e.to_string(),
        };
        std::fs::copy(&backup, path).map_err(restore_err)?;
        std::fs::remove_file(&backup).map_err(restore_err)
    }

    fn has_backup(&self, path: &Path) -> bool {
        backup_path(path).is_file()
    }
}
