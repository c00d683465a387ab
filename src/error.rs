//! Error types for rust-builder
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from locating the project manifest
#[derive(Error, Debug)]
pub enum LocateError {
    /// No manifest in the directory or any of its parents
    #[error("No Cargo.toml found in '{dir}' or any parent directory")]
    NotFound { dir: PathBuf },

    /// `cargo locate-project` ran but failed for another reason
    #[error("`cargo locate-project` failed in '{dir}': {stderr}")]
    Failed { dir: PathBuf, stderr: String },

    /// `cargo` could not be started
    #[error("Failed to run `cargo locate-project`: {error}")]
    Spawn { error: String },

    /// Output was not the expected JSON document
    #[error("Unexpected output from `cargo locate-project`: {error}")]
    InvalidOutput { error: String },
}

impl LocateError {
    /// Whether this is the expected "no manifest" outcome
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Manifest read/write errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Failed to read the manifest
    #[error("Failed to read manifest '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// Manifest is not valid TOML
    #[error("Failed to parse manifest '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Manifest could not be serialized back to TOML
    #[error("Failed to serialize manifest: {source}")]
    Serialize { source: toml::ser::Error },

    /// Failed to write the manifest
    #[error("Failed to write manifest '{path}': {error}")]
    Write { path: PathBuf, error: String },

    /// Failed to back up the manifest
    #[error("Failed to back up manifest '{path}': {error}")]
    Backup { path: PathBuf, error: String },

    /// Failed to restore the manifest from its backup
    #[error("Failed to restore manifest '{path}' from backup: {error}")]
    Restore { path: PathBuf, error: String },
}

/// Compiler invocation errors
#[derive(Error, Debug)]
pub enum CompileError {
    /// `cargo` could not be started
    #[error("Failed to run `cargo build`: {error}")]
    Spawn { error: String },

    /// `cargo build` exited unsuccessfully
    #[error("`cargo build --bin {bin}` failed: {status}")]
    Failed { bin: String, status: String },
}

/// Binary target resolution errors
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Manifest could not be updated or restored
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// The build action failed after the target was resolved
    #[error("Build of binary '{bin_name}' failed: {source}")]
    Build {
        bin_name: String,
        source: CompileError,
    },
}

impl ResolveError {
    /// The resolved binary name, if resolution got that far
    pub fn bin_name(&self) -> Option<&str> {
        match self {
            Self::Build { bin_name, .. } => Some(bin_name),
            Self::Manifest(_) => None,
        }
    }
}

/// Toolchain acquisition errors
#[derive(Error, Debug)]
pub enum ToolchainError {
    /// rustup installer failed
    #[error("Failed to install rust via rustup: {error}")]
    InstallFailed { error: String },
}

/// User hook script errors
#[derive(Error, Debug)]
pub enum ScriptError {
    /// Script could not be started
    #[error("Failed to run '{path}': {error}")]
    Spawn { path: PathBuf, error: String },

    /// Script exited unsuccessfully
    #[error("Script '{path}' failed: {status}")]
    Failed { path: PathBuf, status: String },
}

/// Extra file gathering errors
#[derive(Error, Debug)]
pub enum GlobError {
    /// Pattern is not a valid glob
    #[error("Invalid glob pattern '{pattern}': {error}")]
    InvalidPattern { pattern: String, error: String },

    /// A matched entry could not be read
    #[error("Failed to read match for '{pattern}': {error}")]
    Read { pattern: String, error: String },

    /// The blocking glob task was cancelled or panicked
    #[error("Glob task for '{pattern}' did not complete: {error}")]
    Task { pattern: String, error: String },
}

/// Deployable unit packaging errors
#[derive(Error, Debug)]
pub enum PackageError {
    /// A file listed in the unit does not exist
    #[error("Missing file for '{name}': {path}")]
    MissingFile { name: String, path: PathBuf },

    /// IO error while writing the unit
    #[error("IO error for '{path}': {error}")]
    Io { path: PathBuf, error: String },

    /// Unit descriptor could not be serialized or read back
    #[error("Failed to serialize unit descriptor: {0}")]
    Descriptor(String),

    /// Output directory contains the files being packaged
    #[error("Output directory '{output}' contains '{path}'; choose an output outside the project")]
    UnsafeOutput { output: PathBuf, path: PathBuf },

    /// Output directory holds something other than a previous unit
    #[error("Output directory '{output}' is not empty and holds no previous unit")]
    OutputNotEmpty { output: PathBuf },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove directory
    #[error("Failed to remove directory '{path}': {error}")]
    RemoveDir { path: PathBuf, error: String },

    /// Failed to copy file
    #[error("Failed to copy '{from}' to '{to}': {error}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },

    /// Failed to move a file or directory
    #[error("Failed to move '{from}' to '{to}': {error}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        error: String,
    },

    /// Failed to read file or directory
    #[error("Failed to read '{path}': {error}")]
    Read { path: PathBuf, error: String },
}

/// Cache preparation errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Project lookup failed for a reason other than "not found"
    #[error("Failed to locate project: {0}")]
    Locate(#[from] LocateError),

    /// Project root lies outside the work path, so it has no cache key
    #[error("Project root '{root}' is outside the work path '{work_path}'")]
    OutsideWorkPath { root: PathBuf, work_path: PathBuf },

    /// Filesystem error
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// Failed to parse config file
    #[error("Failed to parse config file '{path}': {error}")]
    Parse { path: PathBuf, error: String },
}

/// Top-level build error
#[derive(Error, Debug)]
pub enum BuildError {
    /// Toolchain error
    #[error("Toolchain error: {0}")]
    Toolchain(#[from] ToolchainError),

    /// Entrypoint is not part of the input file set
    #[error("Entrypoint '{name}' is not part of the input files")]
    EntrypointNotFound { name: String },

    /// No manifest for the entrypoint
    #[error("No Cargo.toml found for entrypoint '{entrypoint}'. Add a Cargo.toml to the project")]
    NoManifest { entrypoint: String },

    /// Locate error
    #[error("Locate error: {0}")]
    Locate(#[from] LocateError),

    /// Manifest error
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Resolve error
    #[error("{0}")]
    Resolve(#[from] ResolveError),

    /// Hook script error
    #[error("Hook script error: {0}")]
    Script(#[from] ScriptError),

    /// Extra file error
    #[error("Extra files error: {0}")]
    Glob(#[from] GlobError),

    /// Packaging error
    #[error("Packaging error: {0}")]
    Package(#[from] PackageError),

    /// Filesystem error
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),
}
