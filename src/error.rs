//! Error types shared by the installer components.
//!
//! Structural problems skip a tool, hook failures abort the rest of that
//! tool's manifest, and nothing here ever aborts the batch on its own.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest not found at {0}")]
    NotFound(PathBuf),
    #[error("manifest at {path} is unreadable: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A tool directory that does not have the expected shape.
#[derive(Debug, Error)]
pub enum StructuralError {
    #[error("tool directory {0} does not exist")]
    MissingDirectory(PathBuf),
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),
    #[error("tool directory {path} is not accessible: {source}")]
    Inaccessible {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error("installer hook not found at {0}")]
    MissingHook(PathBuf),
    #[error("installer hook {0} is not executable")]
    HookNotExecutable(PathBuf),
}

#[derive(Debug, Error)]
pub enum HookError {
    #[error("could not start installer hook {hook} for {tool} {version}: {source}")]
    Spawn {
        tool: String,
        version: String,
        hook: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("installer hook for {tool} {version} failed ({status})")]
    Failed {
        tool: String,
        version: String,
        status: ExitStatus,
    },
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("{path} exists and is not a symbolic link")]
    Occupied { path: PathBuf },
    #[error("could not link {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[cfg(not(unix))]
    #[error("symbolic links are not supported on this platform")]
    Unsupported,
}

#[derive(Debug, Error)]
pub enum ActivationError {
    #[error("tool {0} is disabled by an .ignore marker")]
    ToolIgnored(String),
    #[error("version {version} of {tool} is disabled by an .ignore marker")]
    VersionIgnored { tool: String, version: String },
    #[error("version {version} of {tool} is not installed")]
    NotInstalled { tool: String, version: String },
    #[error("alias chain starting at {0} is too deep or cyclic")]
    AliasLoop(PathBuf),
    #[error("could not resolve {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
