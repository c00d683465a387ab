//! Platform-specific directory management
//!
//! Provides the default cache root used by `prepare-cache`. Follows the XDG
//! Base Directory Specification on Linux and standard locations on macOS.
//!
//! `RUST_BUILDER_CACHE_DIR` overrides the default.

use std::env;
use std::path::PathBuf;

/// Environment variable overriding the cache directory
pub const ENV_CACHE_DIR: &str = "RUST_BUILDER_CACHE_DIR";

/// Application name used in directory paths
const APP_NAME: &str = "rust-builder";

/// Subdirectory holding cached `target/` trees
const BUILD_CACHE_SUBDIR: &str = "build-cache";

/// Platform-specific directory provider
#[derive(Debug, Clone)]
pub struct BuilderDirs {
    cache_dir: PathBuf,
}

impl BuilderDirs {
    /// Create a new `BuilderDirs` instance
    ///
    /// Checks the environment first, then falls back to platform defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache_dir: Self::resolve_cache_dir(env::var(ENV_CACHE_DIR).ok()),
        }
    }

    /// Get the cache directory path
    ///
    /// - Linux: `$XDG_CACHE_HOME/rust-builder` or `~/.cache/rust-builder`
    /// - macOS: `~/Library/Caches/rust-builder`
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone()
    }

    /// Default cache root for prepared `target/` trees
    #[must_use]
    pub fn build_cache_dir(&self) -> PathBuf {
        self.cache_dir.join(BUILD_CACHE_SUBDIR)
    }

    fn resolve_cache_dir(overridden: Option<String>) -> PathBuf {
        match overridden {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => Self::platform_cache_dir(),
        }
    }

    fn platform_cache_dir() -> PathBuf {
        dirs::cache_dir()
            .map(|p| p.join(APP_NAME))
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .map(|h| h.join(".cache").join(APP_NAME))
                    .unwrap_or_else(|| PathBuf::from(".").join(".cache").join(APP_NAME))
            })
    }
}

impl Default for BuilderDirs {
    fn default() -> Self {
        Self::new()
    }
}
