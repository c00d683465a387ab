//! CLI command for `rust-builder prepare-cache`
//!
//! Moves the project's `target/` into the cache root and lists the files
//! worth keeping for the next build.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::cli::output::{create_spinner, status};
use crate::core::build_env::RustEnv;
use crate::core::cache::{prepare_cache, PreparedCache};
use crate::infra::cargo::Cargo;
use crate::infra::dirs::BuilderDirs;

/// JSON shape of a prepared cache
#[derive(Debug, Serialize)]
pub struct CacheReport<'a> {
    /// Directory `target/` was moved to
    pub target_dir: &'a Path,
    /// Retained paths, relative to the cache root
    pub files: Vec<&'a str>,
    /// Number of files not retained
    pub discarded: usize,
    /// Total size of the retained files in bytes
    pub size_bytes: u64,
}

impl<'a> CacheReport<'a> {
    /// Summarize a prepared cache
    pub fn new(cache: &'a PreparedCache) -> Self {
        Self {
            target_dir: &cache.target_dir,
            files: cache.files.keys().map(String::as_str).collect(),
            discarded: cache.discarded,
            size_bytes: cache.size_bytes(),
        }
    }
}

/// Execute the prepare-cache command
pub async fn execute(
    work_path: &Path,
    cache_path: Option<PathBuf>,
    entrypoint: &str,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let work_path = work_path
        .canonicalize()
        .with_context(|| format!("Work path not found: {}", work_path.display()))?;
    let cache_path = cache_path.unwrap_or_else(|| BuilderDirs::new().build_cache_dir());

    let spinner = create_spinner("Preparing cache...", quiet || json);
    let env = RustEnv::from_process();
    let cache = prepare_cache(&work_path, &cache_path, entrypoint, &Cargo::default(), &env)
        .with_context(|| format!("Failed to prepare cache in {}", cache_path.display()));
    spinner.finish_and_clear();
    let cache = cache?;

    if json {
        let report = CacheReport::new(&cache);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for path in cache.files.keys() {
        println!("{path}");
    }
    if !quiet {
        eprintln!(
            "{} Cached {} files ({}) in {}, {} discarded",
            status::SUCCESS,
            cache.files.len(),
            cache.format_size(),
            cache.target_dir.display(),
            cache.discarded
        );
    }

    Ok(())
}
