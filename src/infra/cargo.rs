//! Cargo invocation
//!
//! Wraps the two cargo subcommands the builder needs: `locate-project` to find
//! the manifest for an entrypoint, and `build --bin` to compile it.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::core::build_env::{Profile, RustEnv};
use crate::error::{CompileError, LocateError};

/// Finds the manifest of the project enclosing a directory
pub trait ProjectLocator {
    /// Absolute path of the nearest `Cargo.toml` above `dir`
    ///
    /// Returns [`LocateError::NotFound`] when there is none.
    fn locate(&self, dir: &Path, env: &RustEnv) -> Result<PathBuf, LocateError>;
}

/// Compiles a single binary target
pub trait Compiler {
    /// Build `bin_name` from `cwd`, streaming output to the terminal
    fn build_bin(&self, bin_name: &str, cwd: &Path, env: &RustEnv) -> Result<(), CompileError>;
}

/// `cargo` wrapper
#[derive(Debug, Clone)]
pub struct Cargo {
    cargo_path: PathBuf,
}

impl Cargo {
    /// Create a wrapper around the cargo binary at `cargo_path`
    pub fn new(cargo_path: PathBuf) -> Self {
        Self { cargo_path }
    }

    /// Get the path to the cargo binary
    pub fn cargo_path(&self) -> &PathBuf {
        &self.cargo_path
    }
}

impl Default for Cargo {
    fn default() -> Self {
        Self::new(PathBuf::from("cargo"))
    }
}

/// JSON printed by `cargo locate-project`
#[derive(Debug, Deserialize)]
struct LocateProject {
    root: PathBuf,
}

/// Turn a failed `cargo locate-project` into a typed error
///
/// cargo reports a missing manifest only through its diagnostic text.
pub fn classify_locate_failure(dir: &Path, stderr: &str) -> LocateError {
    if stderr.contains("could not find") {
        LocateError::NotFound {
            dir: dir.to_path_buf(),
        }
    } else {
        LocateError::Failed {
            dir: dir.to_path_buf(),
            stderr: stderr.trim().to_string(),
        }
    }
}

/// Parse the stdout of a successful `cargo locate-project`
pub fn parse_locate_output(stdout: &[u8]) -> Result<PathBuf, LocateError> {
    serde_json::from_slice::<LocateProject>(stdout)
        .map(|project| project.root)
        .map_err(|e| LocateError::InvalidOutput {
            error: e.to_string(),
        })
}

/// Arguments for building `bin_name` with `profile`
pub fn build_args(bin_name: &str, profile: Profile) -> Vec<String> {
    ["build", "--bin", bin_name]
        .into_iter()
        .chain(profile.cargo_flags().iter().copied())
        .map(String::from)
        .collect()
}

impl ProjectLocator for Cargo {
    fn locate(&self, dir: &Path, env: &RustEnv) -> Result<PathBuf, LocateError> {
        let output = Command::new(&self.cargo_path)
            .arg("locate-project")
            .current_dir(dir)
            .envs(env.vars())
            .output()
            .map_err(|e| {
                tracing::error!("Couldn't run `cargo locate-project`");
                LocateError::Spawn {
                    error: e.to_string(),
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let err = classify_locate_failure(dir, &stderr);
            if !err.is_not_found() {
                tracing::error!("Couldn't run `cargo locate-project`");
            }
            return Err(err);
        }

        parse_locate_output(&output.stdout).map_err(|e| {
            tracing::error!("Couldn't run `cargo locate-project`: {e}");
            e
        })
    }
}

impl Compiler for Cargo {
    fn build_bin(&self, bin_name: &str, cwd: &Path, env: &RustEnv) -> Result<(), CompileError> {
        tracing::debug!("Running `cargo build`...");

        let status = Command::new(&self.cargo_path)
            .args(build_args(bin_name, env.profile()))
            .current_dir(cwd)
            .envs(env.vars())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status();

        match status {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => {
                tracing::error!("failed to `cargo build`");
                Err(CompileError::Failed {
                    bin: bin_name.to_string(),
                    status: status.to_string(),
                })
            }
            Err(e) => {
                tracing::error!("failed to `cargo build`");
                Err(CompileError::Spawn {
                    error: e.to_string(),
                })
            }
        }
    }
}
