//! Default configuration values

/// Codegen flags appended to `RUSTFLAGS` so binaries run on every machine of
/// the execution fleet, whatever CPU the build host has.
pub const CODEGEN_FLAGS: &[&str] = &[
    "-C",
    "target-cpu=ivybridge",
    "-C",
    "target-feature=-aes,-avx,+fxsr,-popcnt,+sse,+sse2,-sse3,-sse4.1,-sse4.2,-ssse3,-xsave,-xsaveopt",
];

/// Environment variable toggling verbose, unoptimized builds
pub const DEBUG_ENV_VAR: &str = "BUILDER_DEBUG";

/// Suffix appended to the manifest path for its backup copy
pub const BACKUP_SUFFIX: &str = ".backup";

/// Manifest file name
pub const MANIFEST_FILE: &str = "Cargo.toml";

/// Optional user hook, looked up next to the entrypoint
pub const HOOK_SCRIPT: &str = "build.sh";

/// Name of the executable inside the deployable unit (without extension)
pub const BOOTSTRAP_NAME: &str = "bootstrap";

/// Runtime identifier for units that ship their own native runtime
pub const RUNTIME: &str = "provided";

/// File mode for the packaged executable
pub const EXECUTABLE_MODE: u32 = 0o755;

/// File mode used when the source mode can't be read
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Toolchain installed by rustup when none is configured
pub const DEFAULT_TOOLCHAIN: &str = "stable";

/// Per-project configuration file, looked up in the work path
pub const CONFIG_FILE: &str = "builder.toml";

/// Name of the file describing a packaged unit
pub const UNIT_DESCRIPTOR: &str = "unit.json";

/// Compiler output directory name
pub const TARGET_DIR: &str = "target";

/// Paths inside the cache root worth persisting between builds
pub const CACHE_PATTERNS: &[&str] = &[
    r"(?:^|/)target/release/\.fingerprint/",
    r"(?:^|/)target/release/build/",
    r"(?:^|/)target/release/deps/",
    r"(?:^|/)target/debug/\.fingerprint/",
    r"(?:^|/)target/debug/build/",
    r"(?:^|/)target/debug/deps/",
];
