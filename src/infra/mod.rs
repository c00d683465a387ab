//! Infrastructure layer
//!
//! Handles all I/O operations: filesystem and external processes.
//! This module is the only place where side effects occur.

pub mod cargo;
pub mod dirs;
pub mod filesystem;
pub mod glob;
pub mod script;
pub mod toolchain;
