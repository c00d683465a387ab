//! Deployable unit packaging
//!
//! A deployable unit is the compiled `bootstrap` executable plus any extra
//! bundled files, an entry handler name and a runtime identifier.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::config::defaults;
use crate::core::files::{FileMap, FileRef};
use crate::error::PackageError;
use crate::infra::filesystem;

/// Name of the packaged executable on this platform
pub fn bootstrap_name() -> String {
    format!("{}{}", defaults::BOOTSTRAP_NAME, std::env::consts::EXE_SUFFIX)
}

/// Files and metadata of a deployable unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployableUnit {
    /// Output-relative path → file handle
    pub files: FileMap,
    /// Entry handler, the executable invoked by the platform
    pub handler: String,
    /// Runtime identifier
    pub runtime: String,
}

impl DeployableUnit {
    /// Assemble a unit, checking that every file exists
    pub fn new(files: FileMap, handler: &str, runtime: &str) -> Result<Self, PackageError> {
        if let Some((name, file)) = files.iter().find(|(_, file)| !file.fs_path.is_file()) {
            return Err(PackageError::MissingFile {
                name: name.clone(),
                path: file.fs_path.clone(),
            });
        }

        Ok(Self {
            files,
            handler: handler.to_string(),
            runtime: runtime.to_string(),
        })
    }

    /// Unit shipping `binary` as its own native runtime, alongside `extra_files`
    pub fn with_bootstrap(extra_files: FileMap, binary: &Path) -> Result<Self, PackageError> {
        let bootstrap = bootstrap_name();
        let mut files = extra_files;
        files.insert(
            bootstrap.clone(),
            FileRef::new(binary.to_path_buf(), defaults::EXECUTABLE_MODE),
        );
        Self::new(files, &bootstrap, defaults::RUNTIME)
    }
}

/// Turns a deployable unit into the platform's artifact
pub trait Packager {
    /// Package `unit`, returning the location of the artifact
    fn package(&self, unit: &DeployableUnit) -> Result<PathBuf, PackageError>;

    /// Local directory the artifact is written to, if any
    ///
    /// Files below it are never gathered into a unit.
    fn output_location(&self) -> Option<&Path> {
        None
    }
}

/// Writes the unit as a directory with a JSON descriptor
///
/// Only a previous unit, as listed by its `unit.json`, is ever removed from
/// the output directory.
#[derive(Debug, Clone)]
pub struct DirectoryPackager {
    output_dir: PathBuf,
    protected: Vec<PathBuf>,
}

/// Descriptor written next to the unit's files
#[derive(Debug, Serialize)]
struct UnitDescriptor<'a> {
    handler: &'a str,
    runtime: &'a str,
    files: Vec<DescriptorFile<'a>>,
}

#[derive(Debug, Serialize)]
struct DescriptorFile<'a> {
    path: &'a str,
    mode: String,
}

/// Descriptor of a unit written by an earlier run
#[derive(Debug, Deserialize)]
struct PreviousUnit {
    files: Vec<PreviousFile>,
}

#[derive(Debug, Deserialize)]
struct PreviousFile {
    path: String,
}

fn io_err(path: &Path, error: impl ToString) -> PackageError {
    PackageError::Io {
        path: path.to_path_buf(),
        error: error.to_string(),
    }
}

/// Whether a descriptor entry stays inside the output directory
fn is_contained(relative: &Path) -> bool {
    relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

impl DirectoryPackager {
    /// Create a packager writing into `output_dir`
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            protected: Vec::new(),
        }
    }

    /// Refuse to package into `dir` or any directory above it
    #[must_use]
    pub fn protecting(mut self, dir: impl Into<PathBuf>) -> Self {
        self.protected.push(dir.into());
        self
    }

    /// Output directory
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Reject an output directory that holds the project or the unit's inputs
    fn check_output(&self, unit: &DeployableUnit) -> Result<(), PackageError> {
        let inputs = unit.files.values().map(|f| f.fs_path.as_path());
        for path in self.protected.iter().map(PathBuf::as_path).chain(inputs) {
            if filesystem::is_within(path, &self.output_dir) {
                return Err(PackageError::UnsafeOutput {
                    output: self.output_dir.clone(),
                    path: path.to_path_buf(),
                });
            }
        }
        Ok(())
    }

    /// Remove the unit a previous run left in the output directory
    fn clear_previous_unit(&self) -> Result<(), PackageError> {
        let descriptor_path = self.output_dir.join(defaults::UNIT_DESCRIPTOR);
        if !descriptor_path.is_file() {
            let is_empty = match std::fs::read_dir(&self.output_dir) {
                Ok(mut entries) => entries.next().is_none(),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
                Err(e) => return Err(io_err(&self.output_dir, e)),
            };
            if is_empty {
                return Ok(());
            }
            return Err(PackageError::OutputNotEmpty {
                output: self.output_dir.clone(),
            });
        }

        let content =
            std::fs::read_to_string(&descriptor_path).map_err(|e| io_err(&descriptor_path, e))?;
        let previous: PreviousUnit = serde_json::from_str(&content)
            .map_err(|e| PackageError::Descriptor(format!("{}: {e}", descriptor_path.display())))?;

        tracing::debug!("Removing previous unit from {}", self.output_dir.display());
        for file in previous.files {
            let relative = Path::new(&file.path);
            if !is_contained(relative) {
                tracing::warn!("Skipping unexpected path in previous unit: {}", file.path);
                continue;
            }
            let path = self.output_dir.join(relative);
            if path.is_file() {
                std::fs::remove_file(&path).map_err(|e| io_err(&path, e))?;
            }
        }
        std::fs::remove_file(&descriptor_path).map_err(|e| io_err(&descriptor_path, e))
    }
}

impl Packager for DirectoryPackager {
    fn package(&self, unit: &DeployableUnit) -> Result<PathBuf, PackageError> {
        self.check_output(unit)?;
        self.clear_previous_unit()?;
        filesystem::create_dir_all(&self.output_dir).map_err(|e| io_err(&self.output_dir, e))?;

        for (name, file) in &unit.files {
            let dest = self.output_dir.join(name);
            filesystem::copy_file(&file.fs_path, &dest, file.mode).map_err(|e| io_err(&dest, e))?;
        }

        let descriptor = UnitDescriptor {
            handler: &unit.handler,
            runtime: &unit.runtime,
            files: unit
                .files
                .iter()
                .map(|(path, file)| DescriptorFile {
                    path,
                    mode: format!("{:o}", file.mode),
                })
                .collect(),
        };
        let json = serde_json::to_string_pretty(&descriptor)
            .map_err(|e| PackageError::Descriptor(e.to_string()))?;
        let descriptor_path = self.output_dir.join(defaults::UNIT_DESCRIPTOR);
        std::fs::write(&descriptor_path, json).map_err(|e| io_err(&descriptor_path, e))?;

        tracing::info!("Packaged unit into {}", self.output_dir.display());
        Ok(self.output_dir.clone())
    }

    fn output_location(&self) -> Option<&Path> {
        Some(&self.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_bootstrap_name() {
        assert_eq!(
            bootstrap_name(),
            format!("bootstrap{}", std::env::consts::EXE_SUFFIX)
        );
    }

    #[test]
    fn test_missing_binary_is_missing_file() {
        let dir = TempDir::new().unwrap();
        let err =
            DeployableUnit::with_bootstrap(FileMap::new(), &dir.path().join("target/release/api"))
                .unwrap_err();
        assert!(matches!(err, PackageError::MissingFile { ref name, .. } if *name == bootstrap_name()));
    }

    #[test]
    fn test_unit_with_bootstrap() {
        let dir = TempDir::new().unwrap();
        let binary = dir.path().join("api");
        std::fs::write(&binary, "binary").unwrap();
        let mut extra = FileMap::new();
        std::fs::write(dir.path().join("data.json"), "{}").unwrap();
        extra.insert(
            "data.json".to_string(),
            FileRef::new(dir.path().join("data.json"), 0o644),
        );

        let unit = DeployableUnit::with_bootstrap(extra, &binary).unwrap();

        assert_eq!(unit.handler, bootstrap_name());
        assert_eq!(unit.runtime, "provided");
        assert_eq!(unit.files.len(), 2);
        assert_eq!(unit.files[&bootstrap_name()].mode, 0o755);
    }

    #[test]
    fn test_directory_packager_writes_files_and_descriptor() {
        let dir = TempDir::new().unwrap();
        let binary = dir.path().join("api");
        std::fs::write(&binary, "binary").unwrap();
        let unit = DeployableUnit::with_bootstrap(FileMap::new(), &binary).unwrap();

        let out = dir.path().join("out");
        let location = DirectoryPackager::new(out.clone()).package(&unit).unwrap();

        assert_eq!(location, out);
        assert_eq!(
            std::fs::read_to_string(out.join(bootstrap_name())).unwrap(),
            "binary"
        );
        let descriptor: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out.join("unit.json")).unwrap())
                .unwrap();
        assert_eq!(descriptor["runtime"], "provided");
        assert_eq!(descriptor["handler"], bootstrap_name().as_str());
        assert_eq!(descriptor["files"][0]["mode"], "755");
    }

    fn packaged_unit(dir: &Path) -> DeployableUnit {
        let binary = dir.join("target/release/api");
        std::fs::create_dir_all(binary.parent().unwrap()).unwrap();
        std::fs::write(&binary, "binary").unwrap();
        DeployableUnit::with_bootstrap(FileMap::new(), &binary).unwrap()
    }

    #[test]
    fn test_output_above_project_is_rejected_untouched() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Cargo.toml"), "[package]").unwrap();
        let unit = packaged_unit(dir.path());

        let err = DirectoryPackager::new(dir.path().to_path_buf())
            .package(&unit)
            .unwrap_err();

        assert!(matches!(err, PackageError::UnsafeOutput { .. }));
        assert!(dir.path().join("Cargo.toml").exists());
        assert!(dir.path().join("target/release/api").exists());
    }

    #[test]
    fn test_output_equal_to_protected_dir_is_rejected() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("project");
        std::fs::create_dir_all(&project).unwrap();
        std::fs::write(project.join("main.rs"), "fn main() {}").unwrap();
        let unit = packaged_unit(&dir.path().join("elsewhere"));

        let err = DirectoryPackager::new(project.clone())
            .protecting(&project)
            .package(&unit)
            .unwrap_err();

        assert!(matches!(err, PackageError::UnsafeOutput { ref path, .. } if *path == project));
        assert!(project.join("main.rs").exists());
    }

    #[test]
    fn test_foreign_output_dir_is_not_wiped() {
        let dir = TempDir::new().unwrap();
        let unit = packaged_unit(&dir.path().join("project"));
        let out = dir.path().join("out");
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(out.join("notes.txt"), "keep me").unwrap();

        let err = DirectoryPackager::new(out.clone()).package(&unit).unwrap_err();

        assert!(matches!(err, PackageError::OutputNotEmpty { .. }));
        assert_eq!(std::fs::read_to_string(out.join("notes.txt")).unwrap(), "keep me");
    }

    #[test]
    fn test_previous_unit_is_replaced() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("project");
        let out = dir.path().join("out");
        std::fs::create_dir_all(&project).unwrap();
        std::fs::write(project.join("old.txt"), "old").unwrap();
        let mut extra = FileMap::new();
        extra.insert("old.txt".to_string(), FileRef::new(project.join("old.txt"), 0o644));
        let binary = project.join("api");
        std::fs::write(&binary, "v1").unwrap();
        let packager = DirectoryPackager::new(out.clone());
        packager
            .package(&DeployableUnit::with_bootstrap(extra, &binary).unwrap())
            .unwrap();

        std::fs::write(&binary, "v2").unwrap();
        packager
            .package(&DeployableUnit::with_bootstrap(FileMap::new(), &binary).unwrap())
            .unwrap();

        assert!(!out.join("old.txt").exists());
        assert_eq!(std::fs::read_to_string(out.join(bootstrap_name())).unwrap(), "v2");
        assert_eq!(packager.output_location(), Some(out.as_path()));
    }

    #[test]
    fn test_descriptor_paths_cannot_escape_output() {
        assert!(is_contained(Path::new("static/a.txt")));
        assert!(!is_contained(Path::new("../Cargo.toml")));
        assert!(!is_contained(Path::new("/etc/passwd")));
    }
}
