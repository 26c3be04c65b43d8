use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which versions the `latest` alias is chosen from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LatestScope {
    /// Only versions installed during the current run.
    #[default]
    Run,
    /// Every concrete version directory found under the tool directory.
    Disk,
}

impl std::str::FromStr for LatestScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "run" => Ok(LatestScope::Run),
            "disk" => Ok(LatestScope::Disk),
            other => Err(format!("unknown latest scope '{}' (expected run or disk)", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub strict: bool,
    #[serde(default = "default_manifest_name")]
    pub manifest_name: String,
    #[serde(default = "default_hook_name")]
    pub hook_name: String,
    #[serde(default = "default_version_placeholder")]
    pub version_placeholder: String,
    #[serde(default)]
    pub latest_scope: LatestScope,
}

fn default_manifest_name() -> String {
    "versions.txt".to_string()
}
fn default_hook_name() -> String {
    "install".to_string()
}
fn default_version_placeholder() -> String {
    "{version}".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            strict: false,
            manifest_name: default_manifest_name(),
            hook_name: default_hook_name(),
            version_placeholder: default_version_placeholder(),
            latest_scope: LatestScope::default(),
        }
    }
}

/// Everything the installation driver needs for one batch. Built once in
/// `main` and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct InstallConfig {
    pub tool_directories: Vec<PathBuf>,
    pub settings: Settings,
}

/// A validated tool namespace: the directory, its manifest and its hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDirectory {
    pub name: String,
    pub path: PathBuf,
    pub manifest: PathBuf,
    pub hook: PathBuf,
}

/// One symbolic link written by the alias linker or latest selector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AliasLink {
    pub alias: String,
    pub target: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Completed,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolReport {
    pub name: String,
    pub path: PathBuf,
    pub status: ToolStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default)]
    pub installed: Vec<String>,
    #[serde(default)]
    pub aliases: Vec<AliasLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ToolReport {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            status: ToolStatus::Completed,
            reason: None,
            installed: Vec::new(),
            aliases: Vec::new(),
            latest: None,
            warnings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub tools: Vec<ToolReport>,
}

impl BatchReport {
    pub fn count(&self, status: ToolStatus) -> usize {
        self.tools.iter().filter(|t| t.status == status).count()
    }

    pub fn is_clean(&self) -> bool {
        self.tools.iter().all(|t| t.status == ToolStatus::Completed)
    }
}
