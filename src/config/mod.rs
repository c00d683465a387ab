//! Configuration constants
//!
//! - [`defaults`] - Fixed flags, file names and cache patterns
//! - [`urls`] - Toolchain download locations

pub mod defaults;
pub mod urls;
