//! Build orchestration logic
//!
//! Drives a single build from toolchain acquisition to the packaged unit:
//!
//! 1. install the toolchain
//! 2. materialize the input files into the work path
//! 3. run the optional `build.sh` hook
//! 4. gather extra files to bundle
//! 5. locate the manifest and resolve the binary target, which runs cargo
//! 6. package the compiled binary as `bootstrap`
//!
//! Steps run in order and the first failure aborts the build.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use crate::core::build_env::{compiler_output_path, RustEnv};
use crate::core::config::BuilderConfig;
use crate::core::files::FileMap;
use crate::core::manifest::{CargoManifest, ManifestStore};
use crate::core::package::{DeployableUnit, Packager};
use crate::core::resolver::BinaryTargetResolver;
use crate::error::{BuildError, FilesystemError};
use crate::infra::cargo::{Compiler, ProjectLocator};
use crate::infra::toolchain::Toolchain;
use crate::infra::{filesystem, glob, script};

pub use crate::core::resolver::BuildMode;

/// Everything the platform hands over for one build
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Input files, keyed by logical name
    pub files: FileMap,
    /// Logical name of the entrypoint in `files`
    pub entrypoint: String,
    /// Directory the files are materialized into
    pub work_path: PathBuf,
    /// Development or production build
    pub mode: BuildMode,
    /// Build configuration
    pub config: BuilderConfig,
}

/// Result of a successful build
#[derive(Debug)]
pub struct BuildOutput {
    /// Resolved binary target name
    pub bin_name: String,
    /// Where cargo placed the binary
    pub binary: PathBuf,
    /// The packaged unit
    pub unit: DeployableUnit,
    /// Location of the packaged artifact
    pub location: PathBuf,
}

/// Collaborators a build runs against
pub struct Builder<'a> {
    env: RustEnv,
    toolchain: &'a dyn Toolchain,
    locator: &'a dyn ProjectLocator,
    compiler: &'a dyn Compiler,
    store: &'a dyn ManifestStore,
    packager: &'a dyn Packager,
}

/// Log which stage failed, keeping the error as is
fn stage_failed<E: Display>(stage: &'static str) -> impl FnOnce(E) -> E {
    move |e| {
        tracing::error!("Build failed while {stage}: {e}");
        e
    }
}

impl<'a> Builder<'a> {
    /// Create a builder
    pub fn new(
        env: RustEnv,
        toolchain: &'a dyn Toolchain,
        locator: &'a dyn ProjectLocator,
        compiler: &'a dyn Compiler,
        store: &'a dyn ManifestStore,
        packager: &'a dyn Packager,
    ) -> Self {
        Self {
            env,
            toolchain,
            locator,
            compiler,
            store,
            packager,
        }
    }

    /// Environment cargo runs in
    pub fn env(&self) -> &RustEnv {
        &self.env
    }

    /// Run a complete build
    pub async fn build(&self, request: &BuildRequest) -> Result<BuildOutput, BuildError> {
        self.toolchain
            .ensure_installed(&self.env)
            .map_err(stage_failed("installing the toolchain"))?;

        tracing::debug!("Downloading files");
        let downloaded = filesystem::materialize(&request.files, &request.work_path)
            .map_err(stage_failed("downloading files"))?;

        let entry = downloaded
            .get(&request.entrypoint)
            .ok_or_else(|| BuildError::EntrypointNotFound {
                name: request.entrypoint.clone(),
            })?;
        let entry_path = entry
            .fs_path
            .canonicalize()
            .map_err(|e| FilesystemError::Read {
                path: entry.fs_path.clone(),
                error: e.to_string(),
            })?;

        script::run_user_scripts(&entry_path, &self.env)
            .map_err(stage_failed("running the build script"))?;

        let mut extra_files =
            glob::gather_extra_files(&request.config.include_patterns(), &entry_path)
                .await
                .map_err(stage_failed("gathering extra files"))?;
        if let Some(output) = self.packager.output_location() {
            extra_files.retain(|_, file| !filesystem::is_within(&file.fs_path, output));
        }

        self.build_single_file(request, &entry_path, extra_files)
    }

    fn build_single_file(
        &self,
        request: &BuildRequest,
        entry_path: &Path,
        extra_files: FileMap,
    ) -> Result<BuildOutput, BuildError> {
        tracing::debug!("Building single file");
        let entry_dir = entry_path.parent().unwrap_or(entry_path);

        let manifest_path = match self.locator.locate(entry_dir, &self.env) {
            Ok(path) => path,
            Err(e) if e.is_not_found() => {
                tracing::error!("No Cargo.toml found for entrypoint: {}", request.entrypoint);
                return Err(BuildError::NoManifest {
                    entrypoint: request.entrypoint.clone(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let manifest = CargoManifest::load(self.store, &manifest_path).map_err(|e| {
            tracing::error!("Failed to parse TOML from entrypoint: {}", request.entrypoint);
            e
        })?;

        let resolver = BinaryTargetResolver::new(self.store, request.mode);
        let bin_name = resolver.resolve(&manifest, &manifest_path, entry_path, |bin| {
            self.compiler.build_bin(bin, entry_dir, &self.env)
        })?;

        let manifest_dir = manifest_path.parent().unwrap_or(entry_dir);
        let binary = compiler_output_path(manifest_dir, self.env.profile(), &bin_name);
        tracing::debug!("Binary file is: {}", binary.display());

        let unit = DeployableUnit::with_bootstrap(extra_files, &binary)
            .map_err(stage_failed("packaging"))?;
        let location = self
            .packager
            .package(&unit)
            .map_err(stage_failed("packaging"))?;

        Ok(BuildOutput {
            bin_name,
            binary,
            unit,
            location,
        })
    }
}
