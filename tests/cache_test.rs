//! Integration tests for build cache preparation
//!
//! - target/ is moved under the cache root at the project's relative path
//! - only fingerprints, build outputs and deps are retained
//! - a stale cached target/ is replaced

mod common;

use common::{test_env, TestProject, WalkingLocator, MAIN_RS, PLAIN_MANIFEST};
use rust_builder::core::build_env::RustEnv;
use rust_builder::core::cache::prepare_cache;
use rust_builder::error::{CacheError, LocateError};
use rust_builder::infra::cargo::ProjectLocator;
use std::path::{Path, PathBuf};

/// Locator that must never be consulted
struct UnusedLocator;

impl ProjectLocator for UnusedLocator {
    fn locate(&self, dir: &Path, _env: &RustEnv) -> Result<PathBuf, LocateError> {
        panic!("unexpected locate for {}", dir.display());
    }
}

fn project_with_target(prefix: &str) -> TestProject {
    let project = TestProject::new();
    project.create_file(&format!("{prefix}Cargo.toml"), PLAIN_MANIFEST);
    project.create_file(&format!("{prefix}src/main.rs"), MAIN_RS);
    project.create_file(&format!("{prefix}target/release/api"), "binary");
    project.create_file(&format!("{prefix}target/release/api.d"), "deps");
    project.create_file(&format!("{prefix}target/release/deps/libserde.rlib"), "rlib");
    project.create_file(
        &format!("{prefix}target/release/.fingerprint/serde-1/lib-serde"),
        "fp",
    );
    project.create_file(&format!("{prefix}target/release/build/ring-1/output"), "out");
    project.create_file(&format!("{prefix}target/release/incremental/x/y"), "inc");
    project
}

#[test]
fn test_manifest_entrypoint_moves_target_without_locate() {
    let project = project_with_target("api/");
    let cache = TestProject::new();

    let prepared = prepare_cache(
        &project.path(),
        &cache.path(),
        "api/Cargo.toml",
        &UnusedLocator,
        &test_env(),
    )
    .unwrap();

    assert_eq!(prepared.target_dir, cache.path().join("api/target"));
    assert!(!project.file_exists("api/target"));
    assert!(cache.file_exists("api/target/release/api"));

    let kept: Vec<_> = prepared.files.keys().cloned().collect();
    assert_eq!(
        kept,
        vec![
            "api/target/release/.fingerprint/serde-1/lib-serde",
            "api/target/release/build/ring-1/output",
            "api/target/release/deps/libserde.rlib",
        ]
    );
    assert_eq!(prepared.discarded, 3);
}

#[test]
fn test_source_entrypoint_uses_located_project_root() {
    let project = project_with_target("svc/");
    let cache = TestProject::new();

    let prepared = prepare_cache(
        &project.path(),
        &cache.path(),
        "svc/src/main.rs",
        &WalkingLocator,
        &test_env(),
    )
    .unwrap();

    assert_eq!(prepared.target_dir, cache.path().join("svc/target"));
    assert!(prepared
        .files
        .contains_key("svc/target/release/deps/libserde.rlib"));
    assert!(!prepared.files.contains_key("svc/target/release/api"));
    assert_eq!(
        prepared.files["svc/target/release/deps/libserde.rlib"].fs_path,
        cache.path().join("svc/target/release/deps/libserde.rlib")
    );
}

#[test]
fn test_stale_cached_target_is_replaced() {
    let project = project_with_target("");
    let cache = TestProject::new();
    cache.create_file("target/release/deps/stale.rlib", "old");

    let prepared = prepare_cache(
        &project.path(),
        &cache.path(),
        "Cargo.toml",
        &UnusedLocator,
        &test_env(),
    )
    .unwrap();

    assert!(!cache.file_exists("target/release/deps/stale.rlib"));
    assert!(prepared
        .files
        .contains_key("target/release/deps/libserde.rlib"));
    assert!(prepared.size_bytes() > 0);
}

#[test]
fn test_missing_target_is_error() {
    let project = TestProject::new();
    project.create_file("Cargo.toml", PLAIN_MANIFEST);
    let cache = TestProject::new();

    let err = prepare_cache(
        &project.path(),
        &cache.path(),
        "Cargo.toml",
        &UnusedLocator,
        &test_env(),
    )
    .unwrap_err();

    assert!(matches!(err, CacheError::Filesystem(_)));
}
