//! Installation driver.
//!
//! Each tool directory goes through validate -> resolve paths -> install
//! every manifest entry in ascending order -> link `latest`. Tools are
//! processed one after another in the order given. A broken tool directory
//! is skipped, a failing hook stops that tool, and neither stops the batch.

use crate::alias::{concrete_versions, link_aliases, select_latest};
use crate::error::StructuralError;
use crate::hook::run_hook;
use crate::manifest::Manifest;
use crate::types::*;
use chrono::Utc;
use std::fs;
use std::io;
use std::path::Path;

pub struct Driver {
    config: InstallConfig,
}

impl Driver {
    pub fn new(config: InstallConfig) -> Self {
        Self { config }
    }

    pub fn settings(&self) -> &Settings {
        &self.config.settings
    }

    pub fn run(&self) -> BatchReport {
        let started_at = Utc::now();
        let total = self.config.tool_directories.len();
        let mut tools = Vec::with_capacity(total);

        for (index, dir) in self.config.tool_directories.iter().enumerate() {
            tracing::info!("[{}/{}] Processing {}", index + 1, total, dir.display());
            tools.push(self.install_tool(dir));
        }

        let report = BatchReport {
            started_at,
            finished_at: Utc::now(),
            tools,
        };

        tracing::info!(
            "Finished {} tool(s): {} completed, {} skipped, {} failed",
            total,
            report.count(ToolStatus::Completed),
            report.count(ToolStatus::Skipped),
            report.count(ToolStatus::Failed)
        );
        report
    }

    /// Run one tool directory to a terminal state.
    pub fn install_tool(&self, dir: &Path) -> ToolReport {
        let name = tool_name(dir);
        let mut report = ToolReport::new(&name, dir);

        let (tool, manifest) = match self.validate(dir) {
            Ok(validated) => validated,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", name, e);
                report.status = ToolStatus::Skipped;
                report.reason = Some(e.to_string());
                return report;
            }
        };
        report.path = tool.path.clone();

        tracing::debug!(
            "Read {} version(s) from {}",
            manifest.len(),
            manifest.path().display()
        );
        for line in manifest.skipped() {
            report.warnings.push(format!(
                "{} line {}: {} ({})",
                tool.manifest.display(),
                line.line_number,
                line.reason,
                line.content.trim()
            ));
        }
        if manifest.is_empty() {
            tracing::warn!("Manifest {} lists no versions", tool.manifest.display());
        }

        let settings = self.settings();
        for entry in &manifest {
            let location = entry.resolve_location(&settings.version_placeholder);
            tracing::info!("Installing {} {} from {}", tool.name, entry.version, location);

            if let Err(e) = run_hook(&tool, &entry.version, &location, settings.debug) {
                tracing::error!("{}", e);
                report.status = ToolStatus::Failed;
                report.reason = Some(e.to_string());
                return report;
            }
            report.installed.push(entry.version.clone());

            match link_aliases(&tool.path, &entry.version) {
                Ok(links) => report.aliases.extend(links),
                Err(e) => {
                    tracing::warn!("Aliases for {} {} not updated: {}", tool.name, entry.version, e);
                    report.warnings.push(e.to_string());
                }
            }
        }

        let candidates = match settings.latest_scope {
            LatestScope::Run => report.installed.clone(),
            LatestScope::Disk => {
                let mut versions = concrete_versions(&tool.path).unwrap_or_else(|e| {
                    tracing::warn!("Could not scan {}: {}", tool.path.display(), e);
                    Vec::new()
                });
                // Installed this run even when the name does not look like a version
                for version in &report.installed {
                    if !versions.contains(version) {
                        versions.push(version.clone());
                    }
                }
                versions
            }
        };

        match select_latest(&tool.path, &candidates) {
            Ok(link) => report.latest = link.map(|l| l.target),
            Err(e) => {
                tracing::warn!("Could not link latest for {}: {}", tool.name, e);
                report.warnings.push(e.to_string());
            }
        }

        tracing::info!(
            "Completed {}: {} version(s) installed",
            tool.name,
            report.installed.len()
        );
        report
    }

    /// Check the directory layout and read the manifest. Paths in the
    /// returned `ToolDirectory` are canonical.
    pub fn validate(&self, dir: &Path) -> Result<(ToolDirectory, Manifest), StructuralError> {
        let metadata = match fs::metadata(dir) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StructuralError::MissingDirectory(dir.to_path_buf()))
            }
            Err(source) => {
                return Err(StructuralError::Inaccessible {
                    path: dir.to_path_buf(),
                    source,
                })
            }
        };
        if !metadata.is_dir() {
            return Err(StructuralError::NotADirectory(dir.to_path_buf()));
        }

        // Readable and searchable: listing it and canonicalizing through it.
        let inaccessible = |source| StructuralError::Inaccessible {
            path: dir.to_path_buf(),
            source,
        };
        fs::read_dir(dir).map_err(inaccessible)?;
        let path = fs::canonicalize(dir).map_err(inaccessible)?;

        let settings = self.settings();
        let manifest_path = path.join(&settings.manifest_name);
        let manifest = Manifest::read(&manifest_path)?;
        let manifest_path = fs::canonicalize(&manifest_path).unwrap_or(manifest_path);

        let hook = path.join(&settings.hook_name);
        match fs::metadata(&hook) {
            Ok(meta) if meta.is_file() && is_executable(&meta) => {}
            Ok(meta) if meta.is_file() => return Err(StructuralError::HookNotExecutable(hook)),
            _ => return Err(StructuralError::MissingHook(hook)),
        }

        Ok((
            ToolDirectory {
                name: tool_name(&path),
                path,
                manifest: manifest_path,
                hook,
            },
            manifest,
        ))
    }
}

pub fn tool_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| dir.display().to_string())
}

#[cfg(unix)]
fn is_executable(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &fs::Metadata) -> bool {
    true
}
