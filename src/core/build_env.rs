//! Build environment setup
//!
//! Provides the environment cargo runs in: `PATH` extended with the rustup
//! install location, `RUSTFLAGS` carrying the fixed codegen flags, and the
//! debug toggle selecting the build profile.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::defaults;

/// Cargo build profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Optimized, quiet build
    Release,
    /// Unoptimized, verbose build
    Debug,
}

impl Profile {
    /// Directory name under `target/`
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Release => "release",
            Self::Debug => "debug",
        }
    }

    /// Flags appended to `cargo build`
    pub fn cargo_flags(self) -> &'static [&'static str] {
        match self {
            Self::Release => &["--quiet", "--release"],
            Self::Debug => &["--verbose"],
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Environment for toolchain, hook and cargo processes
#[derive(Debug, Clone, PartialEq)]
pub struct RustEnv {
    vars: BTreeMap<String, String>,
    debug: bool,
}

impl RustEnv {
    /// Build the environment from the current process environment
    pub fn from_process() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Build the environment from explicit variables
    ///
    /// `HOME` falls back to the platform home directory when unset.
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut vars: BTreeMap<String, String> = vars.into_iter().collect();

        let debug = vars
            .get(defaults::DEBUG_ENV_VAR)
            .is_some_and(|v| !v.is_empty());

        let home = vars
            .get("HOME")
            .map(PathBuf::from)
            .or_else(dirs::home_dir);
        if let Some(home) = home {
            let path = prepend_path(&home.join(".cargo").join("bin"), vars.get("PATH"));
            vars.insert("PATH".to_string(), path);
        }

        let rustflags = append_codegen_flags(vars.get("RUSTFLAGS").map(String::as_str));
        vars.insert("RUSTFLAGS".to_string(), rustflags);

        Self { vars, debug }
    }

    /// Whether the debug toggle is set
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Whether verbose, unoptimized builds were requested
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Profile cargo builds with
    pub fn profile(&self) -> Profile {
        if self.debug {
            Profile::Debug
        } else {
            Profile::Release
        }
    }

    /// Look up a variable
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// All variables, for passing to a child process
    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }
}

/// Join the user's `RUSTFLAGS` with the fixed codegen flags
///
/// User flags come first and are never replaced.
pub fn append_codegen_flags(user_flags: Option<&str>) -> String {
    user_flags
        .into_iter()
        .chain(defaults::CODEGEN_FLAGS.iter().copied())
        .filter(|flag| !flag.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn prepend_path(dir: &Path, existing: Option<&String>) -> String {
    let mut paths = vec![dir.to_path_buf()];
    if let Some(existing) = existing {
        paths.extend(std::env::split_paths(existing));
    }
    match std::env::join_paths(paths) {
        Ok(joined) => joined.to_string_lossy().into_owned(),
        Err(e) => {
            tracing::warn!("Could not add {} to PATH: {e}", dir.display());
            existing.cloned().unwrap_or_default()
        }
    }
}

/// Where cargo places the binary `bin_name`
///
/// `<manifest-dir>/target/<profile>/<bin_name>`, with `.exe` on Windows.
pub fn compiler_output_path(manifest_dir: &Path, profile: Profile, bin_name: &str) -> PathBuf {
    manifest_dir
        .join(defaults::TARGET_DIR)
        .join(profile.dir_name())
        .join(format!("{bin_name}{}", std::env::consts::EXE_SUFFIX))
}
