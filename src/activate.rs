//! Activation: turn a requested version (or alias) into the one concrete
//! installation directory to use.
//!
//! `.ignore` markers are honoured here and nowhere else. A marker directly in
//! the tool directory disables the tool; a marker inside a version directory
//! disables that version.

use crate::alias::LATEST;
use crate::error::ActivationError;
use crate::version::is_valid_version_name;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const IGNORE_MARKER: &str = ".ignore";
const MAX_LINK_DEPTH: usize = 32;

/// `jdk` -> `JDK_VERSION`, `node-lts` -> `NODE_LTS_VERSION`.
pub fn version_env_var(tool_name: &str) -> String {
    let stem: String = tool_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{}_VERSION", stem)
}

/// The version to activate: explicit request, then `$<TOOL>_VERSION`,
/// then `latest`.
pub fn requested_version<F>(tool_name: &str, explicit: Option<&str>, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    explicit
        .map(str::to_string)
        .or_else(|| lookup(&version_env_var(tool_name)).filter(|v| !v.is_empty()))
        .unwrap_or_else(|| LATEST.to_string())
}

/// Follow the alias chain for `requested` inside `tool_dir` one link at a
/// time and return the concrete version directory.
pub fn resolve(tool_dir: &Path, requested: &str) -> Result<PathBuf, ActivationError> {
    let tool = tool_dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: io::Error| ActivationError::Io { path, source }
    };

    if tool_dir.join(IGNORE_MARKER).exists() {
        return Err(ActivationError::ToolIgnored(tool));
    }

    let not_installed = || ActivationError::NotInstalled {
        tool: tool.clone(),
        version: requested.to_string(),
    };

    if !is_valid_version_name(requested) {
        return Err(not_installed());
    }

    let mut current = tool_dir.join(requested);
    for _ in 0..MAX_LINK_DEPTH {
        let meta = match fs::symlink_metadata(&current) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_installed()),
            Err(e) => return Err(io_err(&current)(e)),
        };

        if meta.file_type().is_symlink() {
            let target = fs::read_link(&current).map_err(io_err(&current))?;
            tracing::debug!("{} -> {}", current.display(), target.display());
            current = match current.parent() {
                Some(parent) if target.is_relative() => parent.join(target),
                _ => target,
            };
            continue;
        }

        if !meta.is_dir() {
            return Err(not_installed());
        }

        if current.join(IGNORE_MARKER).exists() {
            let version = current
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| requested.to_string());
            return Err(ActivationError::VersionIgnored { tool, version });
        }

        return fs::canonicalize(&current).map_err(io_err(&current));
    }

    Err(ActivationError::AliasLoop(tool_dir.join(requested)))
}
