//! Version aliases: truncated version links and `latest`.
//!
//! Installing `11.0.20.1` yields `11.0.20 -> 11.0.20.1`, `11.0 -> 11.0.20`
//! and `11 -> 11.0`. Only existing symbolic links are ever replaced; a real
//! directory or file with an alias name is left alone.

use crate::error::LinkError;
use crate::types::AliasLink;
use crate::version::{compare_versions, highest, looks_like_version};
use std::fs;
use std::io;
use std::path::Path;

pub const LATEST: &str = "latest";

/// Successively shorter names derived from `version` by dropping the last
/// dot-delimited component. Single-token versions have none.
pub fn truncations(version: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut current = version;
    while let Some((head, _)) = current.rsplit_once('.') {
        if head.is_empty() || head == current {
            break;
        }
        names.push(head.to_string());
        current = head;
    }
    names
}

/// Create or refresh the alias chain for an installed version.
///
/// Returns the links that now exist. Names held by real directories are
/// skipped with a warning and the chain continues from them.
pub fn link_aliases(tool_dir: &Path, version: &str) -> Result<Vec<AliasLink>, LinkError> {
    let mut linked = Vec::new();
    let mut previous = version.to_string();

    for name in truncations(version) {
        match replace_symlink(tool_dir, &name, &previous) {
            Ok(()) => {
                tracing::debug!("Linked {} -> {}", name, previous);
                linked.push(AliasLink {
                    alias: name.clone(),
                    target: previous.clone(),
                });
            }
            Err(LinkError::Occupied { path }) => {
                tracing::warn!(
                    "Not linking alias {}: {} is a real installation",
                    name,
                    path.display()
                );
            }
            Err(e) => return Err(e),
        }
        previous = name;
    }

    Ok(linked)
}

/// Point `latest` at the highest of `versions`.
///
/// An empty set is not an error: a warning is logged and nothing is linked.
pub fn select_latest(tool_dir: &Path, versions: &[String]) -> Result<Option<AliasLink>, LinkError> {
    let Some(newest) = highest(versions) else {
        tracing::warn!(
            "No installed versions in {}, not linking {}",
            tool_dir.display(),
            LATEST
        );
        return Ok(None);
    };

    match replace_symlink(tool_dir, LATEST, newest) {
        Ok(()) => {
            tracing::info!("Linked {} -> {}", LATEST, newest);
            Ok(Some(AliasLink {
                alias: LATEST.to_string(),
                target: newest.to_string(),
            }))
        }
        Err(LinkError::Occupied { path }) => {
            tracing::warn!("Not linking {}: {} is not a symbolic link", LATEST, path.display());
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Real (non-symlink) directories directly under `tool_dir` whose names
/// look like versions, in ascending version order. Hook leftovers such as
/// `cache/` or `src/` are not versions.
pub fn concrete_versions(tool_dir: &Path) -> io::Result<Vec<String>> {
    let mut versions = Vec::new();
    for entry in fs::read_dir(tool_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if !looks_like_version(&name) {
            continue;
        }
        // DirEntry::file_type does not follow symlinks
        if entry.file_type()?.is_dir() {
            versions.push(name);
        }
    }
    versions.sort_by(|a, b| compare_versions(a, b));
    Ok(versions)
}

/// Symbolic links directly under `tool_dir` with their immediate targets.
pub fn list_aliases(tool_dir: &Path) -> io::Result<Vec<AliasLink>> {
    let mut aliases = Vec::new();
    for entry in fs::read_dir(tool_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') || !entry.file_type()?.is_symlink() {
            continue;
        }
        let target = fs::read_link(entry.path())?;
        aliases.push(AliasLink {
            alias: name,
            target: target.to_string_lossy().to_string(),
        });
    }
    aliases.sort_by(|a, b| compare_versions(&a.alias, &b.alias));
    Ok(aliases)
}

/// Make `tool_dir/name` a symlink to `target` without a window in which the
/// name is missing. The new link is created under a temporary name and
/// renamed over the old one.
fn replace_symlink(tool_dir: &Path, name: &str, target: &str) -> Result<(), LinkError> {
    let link_path = tool_dir.join(name);

    match fs::symlink_metadata(&link_path) {
        Ok(meta) if !meta.file_type().is_symlink() => {
            return Err(LinkError::Occupied { path: link_path });
        }
        Ok(_) => {
            if fs::read_link(&link_path).is_ok_and(|current| current == Path::new(target)) {
                return Ok(());
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(LinkError::Io {
                path: link_path,
                source,
            })
        }
    }

    let temp_path = tool_dir.join(format!(".{}.{}.tmp", name, std::process::id()));
    if fs::symlink_metadata(&temp_path).is_ok() {
        fs::remove_file(&temp_path).map_err(|source| LinkError::Io {
            path: temp_path.clone(),
            source,
        })?;
    }

    create_symlink(target, &temp_path)?;

    if let Err(source) = fs::rename(&temp_path, &link_path) {
        let _ = fs::remove_file(&temp_path);
        return Err(LinkError::Io {
            path: link_path,
            source,
        });
    }
    Ok(())
}

#[cfg(unix)]
fn create_symlink(target: &str, path: &Path) -> Result<(), LinkError> {
    std::os::unix::fs::symlink(target, path).map_err(|source| LinkError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(not(unix))]
fn create_symlink(_target: &str, _path: &Path) -> Result<(), LinkError> {
    Err(LinkError::Unsupported)
}
