//! Core build logic
//!
//! Process spawning and filesystem access go through [`crate::infra`];
//! the modules here decide what to do with the results.
//!
//! # Submodules
//!
//! - [`files`] - File maps handed between build steps
//! - [`manifest`] - Cargo.toml value, binary targets and manifest storage
//! - [`resolver`] - Binary target resolution
//! - [`build_env`] - Build environment setup
//! - [`builder`] - Build orchestration logic
//! - [`cache`] - Build cache preparation
//! - [`package`] - Deployable unit packaging
//! - [`config`] - Per-build configuration

pub mod build_env;
pub mod builder;
pub mod cache;
pub mod config;
pub mod files;
pub mod manifest;
pub mod package;
pub mod resolver;
