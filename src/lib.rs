//! rust-builder - Build Rust serverless functions into deployable units
//!
//! This library compiles a Rust entrypoint with cargo, packages the binary as
//! a `bootstrap` executable and prepares the build cache for the next run.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Build logic: manifest handling, target resolution, packaging
//! - [`infra`] - Infrastructure layer (filesystem, processes)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
