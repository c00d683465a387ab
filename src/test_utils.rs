//! Test utilities
//!
//! Proptest generators and an in-memory [`ManifestStore`] for exercising the
//! manifest rewrite protocol without real files.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::core::manifest::{backup_path, ManifestStore};
use crate::error::ManifestError;

pub mod generators {
    use proptest::prelude::*;

    /// Generate a valid binary name
    pub fn bin_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_-]{0,15}"
    }

    /// Generate a relative `.rs` path such as `src/bin/api.rs`
    pub fn relative_source_path() -> impl Strategy<Value = String> {
        (prop::collection::vec("[a-z][a-z0-9_]{0,8}", 0..3), "[a-z][a-z0-9_]{0,10}")
            .prop_map(|(dirs, file)| {
                let mut parts = dirs;
                parts.push(format!("{file}.rs"));
                parts.join("/")
            })
    }

    /// Generate an entry file name that may contain dynamic-route brackets
    pub fn entry_file_name() -> impl Strategy<Value = String> {
        "[a-z\\[\\]]{1,6}[a-z]{0,6}".prop_map(|stem| format!("{stem}.rs"))
    }

    /// Generate a relative path below the cache root
    pub fn cache_path() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-z.][a-z0-9._-]{0,10}", 1..6).prop_map(|parts| parts.join("/"))
    }
}

/// Operations recorded by [`MemoryManifestStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Read,
    Write,
    Backup,
    Restore,
}

/// In-memory [`ManifestStore`]
#[derive(Debug, Default)]
pub struct MemoryManifestStore {
    files: RefCell<HashMap<PathBuf, String>>,
    ops: RefCell<Vec<StoreOp>>,
    fail_writes: bool,
}

impl MemoryManifestStore {
    /// Create a store holding a single manifest
    pub fn with_file(path: &Path, content: &str) -> Self {
        let store = Self::default();
        store
            .files
            .borrow_mut()
            .insert(path.to_path_buf(), content.to_string());
        store
    }

    /// Make every subsequent write fail
    #[must_use]
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Current content of a file
    pub fn content(&self, path: &Path) -> Option<String> {
        self.files.borrow().get(path).cloned()
    }

    /// Operations performed so far
    pub fn ops(&self) -> Vec<StoreOp> {
        self.ops.borrow().clone()
    }

    fn missing(path: &Path) -> String {
        format!("{} does not exist", path.display())
    }
}

impl ManifestStore for MemoryManifestStore {
    fn read(&self, path: &Path) -> Result<String, ManifestError> {
        self.ops.borrow_mut().push(StoreOp::Read);
        self.content(path).ok_or_else(|| ManifestError::Read {
            path: path.to_path_buf(),
            error: Self::missing(path),
        })
    }

    fn write(&self, path: &Path, content: &str) -> Result<(), ManifestError> {
        self.ops.borrow_mut().push(StoreOp::Write);
        if self.fail_writes {
            // Simulate a write that clobbered the file before failing
            self.files
                .borrow_mut()
                .insert(path.to_path_buf(), String::new());
            return Err(ManifestError::Write {
                path: path.to_path_buf(),
                error: "disk full".to_string(),
            });
        }
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn backup(&self, path: &Path) -> Result<(), ManifestError> {
        self.ops.borrow_mut().push(StoreOp::Backup);
        let content = self.content(path).ok_or_else(|| ManifestError::Backup {
            path: path.to_path_buf(),
            error: Self::missing(path),
        })?;
        self.files.borrow_mut().insert(backup_path(path), content);
        Ok(())
    }

    fn restore(&self, path: &Path) -> Result<(), ManifestError> {
        self.ops.borrow_mut().push(StoreOp::Restore);
        let content = self
            .files
            .borrow_mut()
            .remove(&backup_path(path))
            .ok_or_else(|| ManifestError::Restore {
                path: path.to_path_buf(),
                error: Self::missing(&backup_path(path)),
            })?;
        self.files.borrow_mut().insert(path.to_path_buf(), content);
        Ok(())
    }

    fn has_backup(&self, path: &Path) -> bool {
        self.files.borrow().contains_key(&backup_path(path))
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_relative_source_path_is_relative_rs(path in relative_source_path()) {
            prop_assert!(path.ends_with(".rs"));
            prop_assert!(!path.starts_with('/'));
        }

        #[test]
        fn prop_bin_name_not_empty(name in bin_name()) {
            prop_assert!(!name.is_empty());
        }
    }
}
