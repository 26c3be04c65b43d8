//! Reader for per-tool artifact manifests.
//!
//! A manifest is a whitespace separated two column table:
//!
//! ```text
//! # VERSION   ARTIFACT_LOCATION
//! 11.0.20.1   https://example.com/jdk-{version}.tar.gz
//! 8u382       https://example.com/jdk-{version}.tar.gz
//! ```
//!
//! Comment lines (leading whitespace allowed) and blank lines are ignored.
//! Entries come back in ascending version order regardless of file order.

use crate::error::ManifestError;
use crate::version::{compare_versions, is_valid_version_name};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub version: String,
    pub location: String,
}

impl ManifestEntry {
    /// Substitute every occurrence of `placeholder` with the version.
    pub fn resolve_location(&self, placeholder: &str) -> String {
        if placeholder.is_empty() {
            return self.location.clone();
        }
        self.location.replace(placeholder, &self.version)
    }
}

/// A line that was not a comment, not blank, and not a usable entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    pub line_number: usize,
    pub content: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct Manifest {
    path: PathBuf,
    entries: Vec<ManifestEntry>,
    skipped: Vec<SkippedLine>,
}

impl Manifest {
    pub fn read(path: &Path) -> Result<Self, ManifestError> {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ManifestError::NotFound(path.to_path_buf()))
            }
            Err(source) => {
                return Err(ManifestError::Unreadable {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        if !metadata.is_file() {
            return Err(ManifestError::Unreadable {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "not a regular file",
                ),
            });
        }

        let content = fs::read_to_string(path).map_err(|source| ManifestError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let mut manifest = Self::parse(&content);
        manifest.path = path.to_path_buf();
        Ok(manifest)
    }

    pub fn parse(content: &str) -> Self {
        let mut entries: Vec<ManifestEntry> = Vec::new();
        let mut skipped = Vec::new();

        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            let line_number = index + 1;

            if fields.len() != 2 {
                tracing::warn!(
                    "Skipping manifest line {}: expected 2 fields, found {}",
                    line_number,
                    fields.len()
                );
                skipped.push(SkippedLine {
                    line_number,
                    content: raw.to_string(),
                    reason: format!("expected 2 fields, found {}", fields.len()),
                });
                continue;
            }

            if !is_valid_version_name(fields[0]) {
                tracing::warn!(
                    "Skipping manifest line {}: {} is not a usable version name",
                    line_number,
                    fields[0]
                );
                skipped.push(SkippedLine {
                    line_number,
                    content: raw.to_string(),
                    reason: format!("{} is not a usable version name", fields[0]),
                });
                continue;
            }

            if entries.iter().any(|e| e.version == fields[0]) {
                tracing::warn!(
                    "Skipping manifest line {}: version {} is already listed",
                    line_number,
                    fields[0]
                );
                skipped.push(SkippedLine {
                    line_number,
                    content: raw.to_string(),
                    reason: format!("duplicate version {}", fields[0]),
                });
                continue;
            }

            entries.push(ManifestEntry {
                version: fields[0].to_string(),
                location: fields[1].to_string(),
            });
        }

        entries.sort_by(|a, b| compare_versions(&a.version, &b.version));

        Self {
            path: PathBuf::new(),
            entries,
            skipped,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries in ascending version order. Can be iterated any number of times.
    pub fn entries(&self) -> std::slice::Iter<'_, ManifestEntry> {
        self.entries.iter()
    }

    pub fn skipped(&self) -> &[SkippedLine] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a ManifestEntry;
    type IntoIter = std::slice::Iter<'a, ManifestEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries()
    }
}
