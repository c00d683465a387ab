//! Build command implementation
//!
//! Implements `rust-builder build`: materializes the input files, compiles
//! the entrypoint and writes the packaged unit to the output directory.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use crate::cli::output::status;
use crate::core::build_env::RustEnv;
use crate::core::builder::{BuildMode, BuildRequest, Builder};
use crate::core::config::BuilderConfig;
use crate::core::files::FileMap;
use crate::core::manifest::FsManifestStore;
use crate::core::package::DirectoryPackager;
use crate::infra::cargo::Cargo;
use crate::infra::filesystem;
use crate::infra::toolchain::Rustup;

/// Directory under the work path the unit is written to by default
const DEFAULT_OUTPUT_DIR: &str = ".output";

/// Build options
#[derive(Debug)]
pub struct BuildOptions {
    /// Entrypoint, relative to the work path
    pub entrypoint: String,
    /// Directory the build runs in
    pub work_path: PathBuf,
    /// Directory holding the input files
    pub files: Option<PathBuf>,
    /// Development build
    pub dev: bool,
    /// Extra include patterns
    pub includes: Vec<String>,
    /// Explicit configuration file
    pub config: Option<PathBuf>,
    /// Output directory
    pub output: Option<PathBuf>,
    /// Suppress the summary
    pub quiet: bool,
}

/// Load the build configuration
///
/// An explicit config file must exist; the work path's `builder.toml` is
/// optional.
pub fn load_config(work_path: &Path, explicit: Option<&Path>) -> Result<BuilderConfig> {
    match explicit {
        Some(path) => {
            if !path.is_file() {
                bail!("Config file not found: {}", path.display());
            }
            BuilderConfig::load_from_path(path)
                .with_context(|| format!("Failed to load {}", path.display()))
        }
        None => BuilderConfig::load_from_work_path(work_path)
            .with_context(|| format!("Failed to load config from {}", work_path.display())),
    }
}

/// Input files under `files_dir`, leaving out a previous unit in `output_dir`
pub fn input_files(files_dir: &Path, output_dir: &Path) -> Result<FileMap> {
    let mut files = filesystem::collect_files(files_dir)
        .with_context(|| format!("Failed to read input files from {}", files_dir.display()))?;
    files.retain(|_, file| !filesystem::is_within(&file.fs_path, output_dir));
    Ok(files)
}

/// Execute the build command
pub async fn execute(options: BuildOptions) -> Result<()> {
    let work_path = options
        .work_path
        .canonicalize()
        .with_context(|| format!("Work path not found: {}", options.work_path.display()))?;

    let config = load_config(&work_path, options.config.as_deref())?
        .with_extra_includes(options.includes);

    let output_dir = options
        .output
        .unwrap_or_else(|| work_path.join(DEFAULT_OUTPUT_DIR));

    let files_dir = options.files.unwrap_or_else(|| work_path.clone());
    let files = input_files(&files_dir, &output_dir)?;
    tracing::info!("Found {} input files in {}", files.len(), files_dir.display());

    let env = RustEnv::from_process();
    let toolchain = Rustup::new(config.toolchain());
    let cargo = Cargo::default();
    let store = FsManifestStore;
    let packager = DirectoryPackager::new(output_dir).protecting(&work_path);
    let builder = Builder::new(env, &toolchain, &cargo, &cargo, &store, &packager);

    let request = BuildRequest {
        files,
        entrypoint: options.entrypoint,
        work_path,
        mode: BuildMode::from_dev_flag(options.dev),
        config,
    };

    let output = builder
        .build(&request)
        .await
        .with_context(|| format!("Failed to build {}", request.entrypoint))?;

    if !options.quiet {
        println!(
            "{} Built `{}` ({} profile)",
            status::SUCCESS,
            output.bin_name,
            builder.env().profile()
        );
        println!("  Binary: {}", output.binary.display());
        println!(
            "  Unit: {} ({} files, handler {}, runtime {})",
            output.location.display(),
            output.unit.files.len(),
            output.unit.handler,
            output.unit.runtime
        );
    }

    Ok(())
}
