//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod build;
pub mod cache;
pub mod locate;

use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile an entrypoint and package it as a deployable unit
    Build {
        /// Entrypoint, relative to the work path
        #[arg(short, long)]
        entrypoint: String,

        /// Directory the build runs in
        #[arg(short, long, default_value = ".")]
        work_path: PathBuf,

        /// Directory holding the input files (defaults to the work path)
        #[arg(long)]
        files: Option<PathBuf>,

        /// Development build: leave Cargo.toml untouched afterwards
        #[arg(long)]
        dev: bool,

        /// Extra files to bundle (glob, relative to the entrypoint)
        #[arg(short, long = "include")]
        includes: Vec<String>,

        /// Configuration file (defaults to builder.toml in the work path)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory for the packaged unit
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Move target/ into the cache and list the files worth keeping
    PrepareCache {
        /// Entrypoint, relative to the work path
        #[arg(short, long)]
        entrypoint: String,

        /// Directory the build ran in
        #[arg(short, long, default_value = ".")]
        work_path: PathBuf,

        /// Cache root (defaults to the platform cache directory)
        #[arg(long)]
        cache_path: Option<PathBuf>,

        /// Output in JSON format for scripting
        #[arg(long)]
        json: bool,
    },

    /// Print the Cargo.toml enclosing a directory
    Locate {
        /// Directory to start from
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },
}

impl Commands {
    /// Execute the command
    pub async fn run(self, quiet: bool) -> Result<()> {
        match self {
            Self::Build {
                entrypoint,
                work_path,
                files,
                dev,
                includes,
                config,
                output,
            } => {
                let options = build::BuildOptions {
                    entrypoint,
                    work_path,
                    files,
                    dev,
                    includes,
                    config,
                    output,
                    quiet,
                };
                build::execute(options).await
            }
            Self::PrepareCache {
                entrypoint,
                work_path,
                cache_path,
                json,
            } => cache::execute(&work_path, cache_path, &entrypoint, json, quiet).await,
            Self::Locate { dir } => locate::execute(&dir).await,
        }
    }
}
