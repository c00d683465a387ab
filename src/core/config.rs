//! Build configuration
//!
//! Per-build settings read from `builder.toml` (or an explicit `--config`
//! file). Missing files mean defaults; invalid files are an error.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::config::defaults;
use crate::error::ConfigError;

/// Glob patterns naming extra files to bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IncludeFiles {
    /// A single pattern
    One(String),
    /// Several patterns
    Many(Vec<String>),
}

impl IncludeFiles {
    /// The patterns as a list
    pub fn patterns(&self) -> Vec<String> {
        match self {
            Self::One(pattern) => vec![pattern.clone()],
            Self::Many(patterns) => patterns.clone(),
        }
    }
}

/// Configuration for a single build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// Extra files bundled next to the executable
    #[serde(default, alias = "includeFiles")]
    pub include_files: Option<IncludeFiles>,

    /// Toolchain installed when rustup is missing
    #[serde(default)]
    pub toolchain: Option<String>,
}

impl BuilderConfig {
    /// Load configuration from a specific path
    ///
    /// If the file doesn't exist, returns the default configuration.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_toml(path, &content)
    }

    /// Load `builder.toml` from the work path
    pub fn load_from_work_path(work_path: &Path) -> Result<Self, ConfigError> {
        Self::load_from_path(&work_path.join(defaults::CONFIG_FILE))
    }

    /// Parse configuration text
    pub fn from_toml(path: &Path, content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Add patterns on top of the configured ones
    #[must_use]
    pub fn with_extra_includes(mut self, extra: Vec<String>) -> Self {
        if extra.is_empty() {
            return self;
        }
        let mut patterns = self.include_patterns();
        patterns.extend(extra);
        self.include_files = Some(IncludeFiles::Many(patterns));
        self
    }

    /// Configured include patterns, possibly empty
    pub fn include_patterns(&self) -> Vec<String> {
        self.include_files
            .as_ref()
            .map(IncludeFiles::patterns)
            .unwrap_or_default()
    }

    /// Toolchain to install
    pub fn toolchain(&self) -> &str {
        self.toolchain
            .as_deref()
            .unwrap_or(defaults::DEFAULT_TOOLCHAIN)
    }
}
