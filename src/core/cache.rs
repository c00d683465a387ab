//! Build cache management logic
//!
//! After a build, the project's `target/` directory is moved into the cache
//! root under the project's path relative to the work path. Only compiler
//! fingerprints, build script outputs and dependency artifacts are worth
//! keeping between builds; everything else under the cache root is dropped
//! from the returned file map.

use regex::RegexSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::config::defaults;
use crate::core::build_env::RustEnv;
use crate::core::files::FileMap;
use crate::error::{CacheError, LocateError};
use crate::infra::cargo::ProjectLocator;
use crate::infra::filesystem;

/// Files retained in the cache after a build
#[derive(Debug)]
pub struct PreparedCache {
    /// Directory the project's `target/` was moved to
    pub target_dir: PathBuf,
    /// Retained files, keyed by path relative to the cache root
    pub files: FileMap,
    /// Number of files under the cache root that were not retained
    pub discarded: usize,
}

impl PreparedCache {
    /// Total size of the retained files in bytes
    pub fn size_bytes(&self) -> u64 {
        self.files
            .values()
            .filter_map(|f| std::fs::metadata(&f.fs_path).ok())
            .map(|m| m.len())
            .sum()
    }

    /// Format size for display
    pub fn format_size(&self) -> String {
        format_size(self.size_bytes())
    }
}

/// Format a byte count for display
pub fn format_size(size_bytes: u64) -> String {
    if size_bytes == 0 {
        "0 bytes".to_string()
    } else if size_bytes < 1024 {
        format!("{size_bytes} bytes")
    } else if size_bytes < 1024 * 1024 {
        format!("{:.1} KB", size_bytes as f64 / 1024.0)
    } else if size_bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", size_bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", size_bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

fn cache_patterns() -> &'static RegexSet {
    static PATTERNS: OnceLock<RegexSet> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        RegexSet::new(defaults::CACHE_PATTERNS).expect("cache patterns are valid regexes")
    })
}

/// Whether a `/`-separated path below the cache root is worth keeping
pub fn is_cacheable(path: &str) -> bool {
    cache_patterns().is_match(path)
}

/// Keep only the cacheable entries of `files`
pub fn filter_cache_files(files: FileMap) -> FileMap {
    files
        .into_iter()
        .filter(|(path, _)| is_cacheable(path))
        .collect()
}

/// Whether the entrypoint is itself a manifest
pub fn is_manifest_entrypoint(entrypoint: &str) -> bool {
    Path::new(entrypoint)
        .extension()
        .is_some_and(|ext| ext == "toml")
}

/// Directory holding the project's `target/`
///
/// A manifest entrypoint is its own project root. Otherwise the manifest
/// enclosing the entrypoint is located; without one, the entrypoint's own
/// directory is used, which is where a build would have put a manifest.
pub fn project_root(
    work_path: &Path,
    entrypoint: &str,
    locator: &dyn ProjectLocator,
    env: &RustEnv,
) -> Result<PathBuf, LocateError> {
    let entry_dir = work_path
        .join(entrypoint)
        .parent()
        .map_or_else(|| work_path.to_path_buf(), Path::to_path_buf);

    if is_manifest_entrypoint(entrypoint) {
        return Ok(entry_dir);
    }

    match locator.locate(&entry_dir, env) {
        Ok(manifest) => Ok(manifest
            .parent()
            .map_or_else(|| entry_dir.clone(), Path::to_path_buf)),
        Err(e) if e.is_not_found() => {
            tracing::debug!("No Cargo.toml found, using {}", entry_dir.display());
            Ok(entry_dir)
        }
        Err(e) => Err(e),
    }
}

/// Path of `root` relative to `work_path`
///
/// Falls back to comparing canonical paths, since cargo reports resolved
/// locations while the work path may go through a symlink.
pub fn relative_to_work_path(root: &Path, work_path: &Path) -> Result<PathBuf, CacheError> {
    if let Ok(relative) = root.strip_prefix(work_path) {
        return Ok(relative.to_path_buf());
    }

    if let (Ok(root_c), Ok(work_c)) = (root.canonicalize(), work_path.canonicalize()) {
        if let Ok(relative) = root_c.strip_prefix(&work_c) {
            return Ok(relative.to_path_buf());
        }
    }

    Err(CacheError::OutsideWorkPath {
        root: root.to_path_buf(),
        work_path: work_path.to_path_buf(),
    })
}

/// Move the project's `target/` into the cache and select what to keep
pub fn prepare_cache(
    work_path: &Path,
    cache_path: &Path,
    entrypoint: &str,
    locator: &dyn ProjectLocator,
    env: &RustEnv,
) -> Result<PreparedCache, CacheError> {
    tracing::debug!("Preparing cache...");

    let root = project_root(work_path, entrypoint, locator, env)?;
    let cache_dir = cache_path.join(relative_to_work_path(&root, work_path)?);
    let cached_target = cache_dir.join(defaults::TARGET_DIR);

    // A leftover target/ would make the rename fail
    filesystem::remove_dir_all(&cached_target)?;
    filesystem::create_dir_all(&cache_dir)?;
    filesystem::rename(&root.join(defaults::TARGET_DIR), &cached_target)?;

    let all_files = filesystem::collect_files(cache_path)?;
    let total = all_files.len();
    let files = filter_cache_files(all_files);
    tracing::info!(
        "Keeping {} of {} cached files from {}",
        files.len(),
        total,
        cached_target.display()
    );

    Ok(PreparedCache {
        target_dir: cached_target,
        discarded: total - files.len(),
        files,
    })
}
