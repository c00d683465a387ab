//! Binary target resolution
//!
//! Maps an entrypoint file to the name of a `[[bin]]` target. When the
//! manifest declares no target for the entrypoint, one is synthesized and
//! written to the manifest for the duration of the build. In development mode
//! the original manifest is backed up first and restored on every exit path,
//! so the user's file is left byte-identical.

use std::path::{Path, PathBuf};

use crate::core::manifest::{BinTarget, CargoManifest, ManifestStore};
use crate::error::{CompileError, ManifestError, ResolveError};
use crate::infra::filesystem::to_key;

/// How the build was invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    /// Local iterative build; the manifest is restored afterwards
    Development,
    /// One-shot build; a synthesized target stays in the manifest
    #[default]
    Production,
}

impl BuildMode {
    /// Mode for a `--dev` flag value
    pub fn from_dev_flag(dev: bool) -> Self {
        if dev {
            Self::Development
        } else {
            Self::Production
        }
    }

    /// Whether this is a development build
    pub fn is_dev(self) -> bool {
        self == Self::Development
    }
}

/// Derive a binary name from the entrypoint's file name
///
/// The extension is dropped and `[`/`]` (used by dynamic route files such as
/// `[id].rs`) become `_`.
pub fn derive_bin_name(entry_path: &Path) -> String {
    entry_path
        .file_stem()
        .map(|stem| stem.to_string_lossy())
        .unwrap_or_default()
        .replace(['[', ']'], "_")
}

/// Path of the entrypoint relative to the manifest's directory
pub fn manifest_relative_path(manifest_path: &Path, entry_path: &Path) -> PathBuf {
    manifest_path
        .parent()
        .and_then(|dir| entry_path.strip_prefix(dir).ok())
        .unwrap_or(entry_path)
        .to_path_buf()
}

/// Path written into a synthesized `[[bin]]` entry
///
/// Relative paths use `/` separators. An entrypoint outside the manifest
/// directory keeps its absolute path as is.
pub fn target_path(relative: &Path) -> String {
    if relative.is_absolute() {
        relative.to_string_lossy().into_owned()
    } else {
        to_key(relative)
    }
}

/// Resolves and, if needed, synthesizes the binary target for an entrypoint
pub struct BinaryTargetResolver<'a> {
    store: &'a dyn ManifestStore,
    mode: BuildMode,
}

impl<'a> BinaryTargetResolver<'a> {
    /// Create a resolver writing through `store`
    pub fn new(store: &'a dyn ManifestStore, mode: BuildMode) -> Self {
        Self { store, mode }
    }

    /// Resolve the binary target for `entry_path` and run `build` with its name
    ///
    /// `manifest` must be the parsed contents of `manifest_path`. Errors from
    /// `build` are returned as [`ResolveError::Build`], which still carries the
    /// resolved name, after the manifest has been restored.
    pub fn resolve<F>(
        &self,
        manifest: &CargoManifest,
        manifest_path: &Path,
        entry_path: &Path,
        build: F,
    ) -> Result<String, ResolveError>
    where
        F: FnOnce(&str) -> Result<(), CompileError>,
    {
        let relative = manifest_relative_path(manifest_path, entry_path);

        if let Some(bin) = manifest.find_bin_by_path(&relative) {
            tracing::debug!(
                "Using declared binary target '{}' for {}",
                bin.name,
                relative.display()
            );
            return match build(&bin.name) {
                Ok(()) => Ok(bin.name),
                Err(source) => Err(ResolveError::Build {
                    bin_name: bin.name,
                    source,
                }),
            };
        }

        let target = BinTarget::new(derive_bin_name(entry_path), target_path(&relative));
        let content = manifest.with_bin_target(&target).to_toml_string()?;
        let guard = self.write_synthesized(manifest_path, &content)?;

        let outcome = build(&target.name);
        let restored = guard.map_or(Ok(()), RestoreGuard::release);

        match (outcome, restored) {
            (Ok(()), Ok(())) => Ok(target.name),
            (Ok(()), Err(e)) => Err(e.into()),
            (Err(source), restored) => {
                if let Err(e) = restored {
                    tracing::error!("{e}");
                }
                Err(ResolveError::Build {
                    bin_name: target.name,
                    source,
                })
            }
        }
    }

    /// Write the manifest carrying the synthesized target
    ///
    /// In development mode the original is backed up first and the returned
    /// guard restores it. If the write fails the guard is dropped here, which
    /// restores the backup before the error propagates.
    fn write_synthesized(
        &self,
        manifest_path: &Path,
        content: &str,
    ) -> Result<Option<RestoreGuard<'a>>, ManifestError> {
        let guard = if self.mode.is_dev() {
            tracing::debug!("Backing up Cargo.toml file");
            self.store.backup(manifest_path)?;
            Some(RestoreGuard::new(self.store, manifest_path))
        } else {
            None
        };

        tracing::debug!("Writing following toml to file: {content}");
        self.store.write(manifest_path, content)?;

        Ok(guard)
    }
}

/// Restores a backed-up manifest when released or dropped
struct RestoreGuard<'a> {
    store: &'a dyn ManifestStore,
    path: PathBuf,
    armed: bool,
}

impl<'a> RestoreGuard<'a> {
    fn new(store: &'a dyn ManifestStore, path: &Path) -> Self {
        Self {
            store,
            path: path.to_path_buf(),
            armed: true,
        }
    }

    /// Restore now and report the outcome
    fn release(mut self) -> Result<(), ManifestError> {
        self.armed = false;
        self.restore()
    }

    fn restore(&self) -> Result<(), ManifestError> {
        tracing::debug!("Restoring backed up Cargo.toml file");
        self.store.restore(&self.path)
    }
}

impl Drop for RestoreGuard<'_> {
    fn drop(&mut self) {
        if !self.armed || !self.store.has_backup(&self.path) {
            return;
        }
        if let Err(e) = self.restore() {
            tracing::error!("{e}");
        }
    }
}
