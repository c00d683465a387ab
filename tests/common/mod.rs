//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use rust_builder::core::build_env::RustEnv;
use rust_builder::error::{CompileError, LocateError, ToolchainError};
use rust_builder::infra::cargo::{Compiler, ProjectLocator};
use rust_builder::infra::toolchain::Toolchain;

/// Test project context
///
/// Creates a temporary directory for test projects and provides
/// utilities for setting up test scenarios.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Canonical path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir
            .path()
            .canonicalize()
            .expect("Failed to canonicalize temp directory")
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Create a directory in the test project
    pub fn create_dir(&self, name: &str) {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(path).expect("Failed to create directory");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the test project
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Environment with a fixed home and no debug toggle
pub fn test_env() -> RustEnv {
    RustEnv::from_vars([
        ("HOME".to_string(), "/nonexistent-home".to_string()),
        ("PATH".to_string(), "/usr/bin:/bin".to_string()),
    ])
}

/// Toolchain that is always present
pub struct InstalledToolchain;

impl Toolchain for InstalledToolchain {
    fn ensure_installed(&self, _env: &RustEnv) -> Result<(), ToolchainError> {
        Ok(())
    }
}

/// Toolchain whose installation always fails
pub struct BrokenToolchain;

impl Toolchain for BrokenToolchain {
    fn ensure_installed(&self, _env: &RustEnv) -> Result<(), ToolchainError> {
        Err(ToolchainError::InstallFailed {
            error: "network unreachable".to_string(),
        })
    }
}

/// Locator walking up from the directory like `cargo locate-project`
pub struct WalkingLocator;

impl ProjectLocator for WalkingLocator {
    fn locate(&self, dir: &Path, _env: &RustEnv) -> Result<PathBuf, LocateError> {
        dir.ancestors()
            .map(|d| d.join("Cargo.toml"))
            .find(|p| p.is_file())
            .ok_or_else(|| LocateError::NotFound {
                dir: dir.to_path_buf(),
            })
    }
}

/// Compiler recording each request and writing a fake release binary
///
/// The manifest in effect at compile time is captured so tests can check
/// what cargo would have seen.
#[derive(Default)]
pub struct FakeCompiler {
    pub calls: std::cell::RefCell<Vec<String>>,
    pub seen_manifests: std::cell::RefCell<Vec<String>>,
    pub fail: bool,
    pub skip_output: bool,
}

impl FakeCompiler {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn without_output() -> Self {
        Self {
            skip_output: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn seen_manifests(&self) -> Vec<String> {
        self.seen_manifests.borrow().clone()
    }
}

impl Compiler for FakeCompiler {
    fn build_bin(&self, bin_name: &str, cwd: &Path, env: &RustEnv) -> Result<(), CompileError> {
        self.calls.borrow_mut().push(bin_name.to_string());

        let manifest = WalkingLocator.locate(cwd, env).expect("manifest at compile time");
        self.seen_manifests
            .borrow_mut()
            .push(std::fs::read_to_string(&manifest).expect("readable manifest"));

        if self.fail {
            return Err(CompileError::Failed {
                bin: bin_name.to_string(),
                status: "exit status: 101".to_string(),
            });
        }

        if !self.skip_output {
            let out_dir = manifest.parent().unwrap().join("target/release");
            std::fs::create_dir_all(&out_dir).unwrap();
            std::fs::write(
                out_dir.join(format!("{bin_name}{}", std::env::consts::EXE_SUFFIX)),
                "compiled",
            )
            .unwrap();
        }
        Ok(())
    }
}

/// Manifest without any `[[bin]]` entries
pub const PLAIN_MANIFEST: &str = r#"[package]
name = "api"
version = "0.1.0"
edition = "2021"

[dependencies]
serde = "1"
"#;

/// Manifest declaring a binary at `main.rs`
pub const SVC_MANIFEST: &str = r#"[package]
name = "svc"
version = "0.1.0"
edition = "2021"

[[bin]]
name = "svc"
path = "main.rs"
"#;

/// Minimal Rust source
pub const MAIN_RS: &str = "fn main() {}\n";
