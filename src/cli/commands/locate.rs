//! Locate command implementation

use anyhow::Result;
use std::path::Path;

use crate::cli::output::status;
use crate::core::build_env::RustEnv;
use crate::infra::cargo::{Cargo, ProjectLocator};

/// Execute the locate command
pub async fn execute(dir: &Path) -> Result<()> {
    let env = RustEnv::from_process();
    match Cargo::default().locate(dir, &env) {
        Ok(manifest) => {
            println!("{}", manifest.display());
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            println!("{} No Cargo.toml found in {}", status::WARNING, dir.display());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
