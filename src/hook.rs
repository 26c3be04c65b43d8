//! Invocation of per-tool installer hooks.
//!
//! A hook is any executable inside the tool directory. It is run with the
//! tool directory as working directory and two positional arguments, the
//! version and the resolved artifact location, and reports only through its
//! exit status. Its output is passed straight through to ours.

use crate::error::HookError;
use crate::types::ToolDirectory;
use std::process::Command;

/// Extra environment handed to hooks so they can call back into toolshelf.
pub const ENV_TOOL_DIR: &str = "TOOLSHELF_TOOL_DIR";
pub const ENV_TOOL_NAME: &str = "TOOLSHELF_TOOL_NAME";
pub const ENV_DEBUG: &str = "TOOLSHELF_DEBUG";

pub fn run_hook(
    tool: &ToolDirectory,
    version: &str,
    location: &str,
    debug: bool,
) -> Result<(), HookError> {
    tracing::debug!(
        "Executing: {} {} {} (in {})",
        tool.hook.display(),
        version,
        location,
        tool.path.display()
    );

    let mut cmd = Command::new(&tool.hook);
    cmd.arg(version)
        .arg(location)
        .current_dir(&tool.path)
        .env(ENV_TOOL_DIR, &tool.path)
        .env(ENV_TOOL_NAME, &tool.name);
    if debug {
        cmd.env(ENV_DEBUG, "1");
    }

    let status = cmd.status().map_err(|source| HookError::Spawn {
        tool: tool.name.clone(),
        version: version.to_string(),
        hook: tool.hook.clone(),
        source,
    })?;

    if status.success() {
        Ok(())
    } else {
        Err(HookError::Failed {
            tool: tool.name.clone(),
            version: version.to_string(),
            status,
        })
    }
}
