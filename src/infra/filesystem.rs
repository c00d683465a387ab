//! Filesystem operations
//!
//! Handles file and directory operations, including materializing an input
//! file set into the work path.

use std::path::{Path, PathBuf};

use crate::core::files::{FileMap, FileRef};
use crate::error::FilesystemError;

/// Create a directory and all parent directories
pub fn create_dir_all(path: &Path) -> Result<(), FilesystemError> {
    std::fs::create_dir_all(path).map_err(|e| FilesystemError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Remove a directory and all its contents
pub fn remove_dir_all(path: &Path) -> Result<(), FilesystemError> {
    if path.exists() {
        std::fs::remove_dir_all(path).map_err(|e| FilesystemError::RemoveDir {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
    }
    Ok(())
}

/// Move a file or directory with a single rename
pub fn rename(from: &Path, to: &Path) -> Result<(), FilesystemError> {
    std::fs::rename(from, to).map_err(|e| FilesystemError::Rename {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        error: e.to_string(),
    })
}

/// Copy a file, creating parent directories and applying `mode`
pub fn copy_file(from: &Path, to: &Path, mode: u32) -> Result<(), FilesystemError> {
    if let Some(parent) = to.parent() {
        create_dir_all(parent)?;
    }
    std::fs::copy(from, to).map_err(|e| FilesystemError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        error: e.to_string(),
    })?;
    set_mode(to, mode)
}

/// Read the permission bits of a file
#[cfg(unix)]
pub fn file_mode(metadata: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

/// Read the permission bits of a file
#[cfg(not(unix))]
pub fn file_mode(_metadata: &std::fs::Metadata) -> u32 {
    crate::config::defaults::DEFAULT_FILE_MODE
}

/// Apply permission bits to a file
#[cfg(unix)]
pub fn set_mode(path: &Path, mode: u32) -> Result<(), FilesystemError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).map_err(|e| {
        FilesystemError::Copy {
            from: path.to_path_buf(),
            to: path.to_path_buf(),
            error: format!("failed to set mode {mode:o}: {e}"),
        }
    })
}

/// Apply permission bits to a file
#[cfg(not(unix))]
pub fn set_mode(_path: &Path, _mode: u32) -> Result<(), FilesystemError> {
    Ok(())
}

/// Convert a relative path to the `/`-separated key used in file maps
pub fn to_key(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether `path` is `dir` or lies below it
///
/// Both sides are compared canonically when they exist, so symlinked and
/// `..`-laden spellings of the same location agree.
pub fn is_within(path: &Path, dir: &Path) -> bool {
    let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    path.starts_with(dir)
}

/// Enumerate every regular file under `root`, keyed by its relative path
pub fn collect_files(root: &Path) -> Result<FileMap, FilesystemError> {
    let mut files = FileMap::new();

    if !root.exists() {
        return Ok(files);
    }

    for entry in walkdir::WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| FilesystemError::Read {
            path: root.to_path_buf(),
            error: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let metadata = entry.metadata().map_err(|e| FilesystemError::Read {
            path: entry.path().to_path_buf(),
            error: e.to_string(),
        })?;
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        files.insert(
            to_key(relative),
            FileRef::new(entry.path().to_path_buf(), file_mode(&metadata)),
        );
    }

    Ok(files)
}

/// Place every file of `files` under `work_path`
///
/// Files already at their destination are left untouched. Returns the
/// same logical names mapped to their local copies.
pub fn materialize(files: &FileMap, work_path: &Path) -> Result<FileMap, FilesystemError> {
    let mut local = FileMap::new();

    for (name, file) in files {
        let dest: PathBuf = work_path.join(name);
        if !is_same_file(&file.fs_path, &dest) {
            copy_file(&file.fs_path, &dest, file.mode)?;
        }
        local.insert(name.clone(), FileRef::new(dest, file.mode));
    }

    Ok(local)
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collect_files_uses_slash_keys() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("src/bin")).unwrap();
        std::fs::write(dir.path().join("src/bin/api.rs"), "fn main() {}").unwrap();
        std::fs::write(dir.path().join("Cargo.toml"), "[package]").unwrap();

        let files = collect_files(dir.path()).unwrap();
        let keys: Vec<_> = files.keys().cloned().collect();
        assert_eq!(keys, vec!["Cargo.toml", "src/bin/api.rs"]);
    }

    #[test]
    fn test_is_within() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("a/b")).unwrap();
        assert!(is_within(&dir.path().join("a/b"), dir.path()));
        assert!(is_within(dir.path(), dir.path()));
        assert!(is_within(&dir.path().join("a/../a/b"), &dir.path().join("a")));
        assert!(!is_within(dir.path(), &dir.path().join("a")));
        assert!(!is_within(&dir.path().join("ab"), &dir.path().join("a")));
    }

    #[test]
    fn test_collect_files_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let files = collect_files(&dir.path().join("nope")).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_materialize_copies_into_work_path() {
        let source = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        std::fs::write(source.path().join("main.rs"), "fn main() {}").unwrap();

        let files = collect_files(source.path()).unwrap();
        let local = materialize(&files, work.path()).unwrap();

        let main = &local["main.rs"];
        assert_eq!(main.fs_path, work.path().join("main.rs"));
        assert_eq!(std::fs::read_to_string(&main.fs_path).unwrap(), "fn main() {}");
    }

    #[test]
    fn test_materialize_in_place_keeps_files() {
        let work = TempDir::new().unwrap();
        std::fs::write(work.path().join("main.rs"), "fn main() {}").unwrap();

        let files = collect_files(work.path()).unwrap();
        let local = materialize(&files, work.path()).unwrap();

        assert_eq!(local.len(), 1);
        assert_eq!(
            std::fs::read_to_string(work.path().join("main.rs")).unwrap(),
            "fn main() {}"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_file_applies_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let from = dir.path().join("a");
        let to = dir.path().join("nested/b");
        std::fs::write(&from, "x").unwrap();

        copy_file(&from, &to, 0o755).unwrap();

        let mode = std::fs::metadata(&to).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o755);
    }
}
