//! File handles shared between the build steps
//!
//! Input file sets, extra bundle files, cache entries and the files of a
//! deployable unit are all maps from a `/`-separated relative path to a
//! [`FileRef`] pointing at a file on local disk.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Relative path → file handle
pub type FileMap = BTreeMap<String, FileRef>;

/// A file on local disk together with the mode it should carry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRef {
    /// Absolute location of the file
    pub fs_path: PathBuf,
    /// Unix permission bits
    pub mode: u32,
}

impl FileRef {
    /// Create a new file handle
    pub fn new(fs_path: PathBuf, mode: u32) -> Self {
        Self { fs_path, mode }
    }
}
