//! User hook scripts
//!
//! Runs the optional `build.sh` placed next to the entrypoint before the
//! build starts.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::defaults;
use crate::core::build_env::RustEnv;
use crate::error::ScriptError;

/// Location of the hook script for an entrypoint
pub fn hook_script_path(entry_path: &Path) -> PathBuf {
    entry_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(defaults::HOOK_SCRIPT)
}

/// Run the hook script next to `entry_path`, if there is one
///
/// Returns whether a script ran. A missing script is not an error.
pub fn run_user_scripts(entry_path: &Path, env: &RustEnv) -> Result<bool, ScriptError> {
    let script = hook_script_path(entry_path);
    if !script.is_file() {
        return Ok(false);
    }

    tracing::debug!("Running `{}`...", defaults::HOOK_SCRIPT);
    run_shell_script(&script, env)?;
    Ok(true)
}

/// Run a shell script to completion from its own directory
pub fn run_shell_script(script: &Path, env: &RustEnv) -> Result<(), ScriptError> {
    let cwd = script.parent().unwrap_or_else(|| Path::new("."));

    let status = Command::new("sh")
        .arg(script)
        .current_dir(cwd)
        .envs(env.vars())
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|e| ScriptError::Spawn {
            path: script.to_path_buf(),
            error: e.to_string(),
        })?;

    if !status.success() {
        return Err(ScriptError::Failed {
            path: script.to_path_buf(),
            status: status.to_string(),
        });
    }
    Ok(())
}
