//! Toolchain URLs

/// rustup installer script
pub const RUSTUP_INSTALLER: &str = "https://sh.rustup.rs";
