//! Glob matching for extra bundle files
//!
//! Patterns are resolved relative to the entrypoint's directory. Each pattern
//! is an independent read-only query, so they run concurrently on blocking
//! tasks.

use futures::future::try_join_all;
use std::path::{Path, PathBuf};

use crate::core::files::{FileMap, FileRef};
use crate::error::GlobError;
use crate::infra::filesystem::{file_mode, to_key};

/// Match `pattern` under `base`, keyed by path relative to `base`
///
/// Only regular files are returned.
pub fn glob_files(pattern: &str, base: &Path) -> Result<FileMap, GlobError> {
    let full = format!(
        "{}/{}",
        glob::Pattern::escape(&base.to_string_lossy()),
        pattern.trim_start_matches("./")
    );

    let entries = glob::glob(&full).map_err(|e| GlobError::InvalidPattern {
        pattern: pattern.to_string(),
        error: e.to_string(),
    })?;

    let mut files = FileMap::new();
    for entry in entries {
        let path = entry.map_err(|e| GlobError::Read {
            pattern: pattern.to_string(),
            error: e.to_string(),
        })?;
        let Ok(metadata) = std::fs::metadata(&path) else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        let Ok(relative) = path.strip_prefix(base) else {
            continue;
        };
        files.insert(to_key(relative), FileRef::new(path.clone(), file_mode(&metadata)));
    }

    Ok(files)
}

/// Resolve every pattern relative to the entrypoint's directory
///
/// Results are merged in pattern order; a path matched by several patterns
/// keeps the handle from the last one.
pub async fn gather_extra_files(
    patterns: &[String],
    entry_path: &Path,
) -> Result<FileMap, GlobError> {
    if patterns.is_empty() {
        return Ok(FileMap::new());
    }

    tracing::debug!("Gathering extra files for the fs...");
    let base: PathBuf = entry_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    let tasks = patterns.iter().map(|pattern| {
        let pattern = pattern.clone();
        let base = base.clone();
        async move {
            let query = pattern.clone();
            tokio::task::spawn_blocking(move || glob_files(&query, &base))
                .await
                .map_err(|e| GlobError::Task {
                    pattern,
                    error: e.to_string(),
                })?
        }
    });

    let matches = try_join_all(tasks).await?;
    Ok(matches.into_iter().flatten().collect())
}
