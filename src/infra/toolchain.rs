//! Toolchain management
//!
//! Makes sure a Rust toolchain is available before building, installing one
//! through rustup when missing.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::{defaults, urls};
use crate::core::build_env::RustEnv;
use crate::error::ToolchainError;

/// Provides the compiler toolchain
pub trait Toolchain {
    /// Install the toolchain unless it is already present
    fn ensure_installed(&self, env: &RustEnv) -> Result<(), ToolchainError>;
}

/// rustup-managed toolchain
#[derive(Debug, Clone)]
pub struct Rustup {
    /// Toolchain passed to `--default-toolchain`
    version: String,
}

impl Rustup {
    /// Create a rustup wrapper installing `version` when needed
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }

    /// Toolchain that will be installed
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Path of `rustup` on the build `PATH`, if any
    pub fn find(env: &RustEnv) -> Option<PathBuf> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        which::which_in("rustup", env.get("PATH"), cwd).ok()
    }

    /// Whether `rustup -V` runs successfully
    pub fn is_installed(env: &RustEnv) -> bool {
        Self::find(env).is_some_and(|rustup| probe(&rustup, env))
    }

    /// Shell command that downloads and runs the rustup installer
    pub fn install_command(&self) -> String {
        format!(
            "curl --proto '=https' --tlsv1.2 -sSf {} | sh -s -- -y --default-toolchain {}",
            urls::RUSTUP_INSTALLER,
            self.version
        )
    }

    fn install(&self, env: &RustEnv) -> Result<(), ToolchainError> {
        tracing::debug!("Downloading the rust toolchain");

        let status = Command::new("sh")
            .arg("-c")
            .arg(self.install_command())
            .envs(env.vars())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| ToolchainError::InstallFailed {
                error: e.to_string(),
            })?;

        if !status.success() {
            return Err(ToolchainError::InstallFailed {
                error: format!("installer exited with {status}"),
            });
        }
        Ok(())
    }
}

impl Default for Rustup {
    fn default() -> Self {
        Self::new(defaults::DEFAULT_TOOLCHAIN)
    }
}

impl Toolchain for Rustup {
    fn ensure_installed(&self, env: &RustEnv) -> Result<(), ToolchainError> {
        if Self::is_installed(env) {
            tracing::debug!("Rust already exists");
            return Ok(());
        }
        self.install(env)
    }
}

fn probe(rustup: &Path, env: &RustEnv) -> bool {
    Command::new(rustup)
        .arg("-V")
        .envs(env.vars())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}
