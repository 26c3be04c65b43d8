use crate::types::*;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "toolshelf";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const CONFIG_PATH_ENV: &str = "TOOLSHELF_CONFIG";

/// Config file to read: explicit path, then `$TOOLSHELF_CONFIG`, then the
/// per-user default. `None` when no location can be determined.
pub fn get_config_file_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_FILE_NAME))
}

/// Load settings from the config file (if any) and apply environment
/// overrides. A missing file yields the defaults; an explicitly named file
/// must exist.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    let mut settings = match get_config_file_path(explicit) {
        Some(path) if path.exists() => {
            tracing::debug!("Config file path: {}", path.display());
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Could not read config file at {}", path.display()))?;
            serde_json::from_str(&content).with_context(|| {
                format!("Could not parse config file {} as JSON", path.display())
            })?
        }
        Some(path) if explicit.is_some() => {
            anyhow::bail!("Config file {} does not exist", path.display());
        }
        _ => Settings::default(),
    };

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

pub fn apply_env_overrides<F>(settings: &mut Settings, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(debug) = lookup("TOOLSHELF_DEBUG") {
        settings.debug = parse_flag(&debug);
    }
    if let Some(strict) = lookup("TOOLSHELF_STRICT") {
        settings.strict = parse_flag(&strict);
    }
    if let Some(name) = lookup("TOOLSHELF_MANIFEST").filter(|v| !v.is_empty()) {
        settings.manifest_name = name;
    }
    if let Some(name) = lookup("TOOLSHELF_HOOK").filter(|v| !v.is_empty()) {
        settings.hook_name = name;
    }
    if let Some(token) = lookup("TOOLSHELF_PLACEHOLDER") {
        settings.version_placeholder = token;
    }
    if let Some(scope) = lookup("TOOLSHELF_LATEST_SCOPE") {
        settings.latest_scope = scope
            .parse()
            .map_err(|e: String| anyhow::anyhow!("TOOLSHELF_LATEST_SCOPE: {}", e))?;
    }
    Ok(())
}

pub fn normalize_key(key: &str) -> String {
    key.replace('-', "_")
        .chars()
        .map(|c| {
            if c.is_ascii_uppercase() {
                format!("_{}", c.to_lowercase())
            } else {
                c.to_string()
            }
        })
        .collect::<String>()
        .to_lowercase()
}

/// Render settings for `config show`.
pub fn render_settings(settings: &Settings, format: &str) -> Result<String> {
    match format {
        "json" => Ok(serde_json::to_string_pretty(settings)?),
        "yaml" => Ok(serde_yaml::to_string(settings)?),
        "plain" => {
            let value = serde_json::to_value(settings)?;
            let mut out = String::new();
            if let Some(map) = value.as_object() {
                for (key, value) in map {
                    let shown = value
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| value.to_string());
                    out.push_str(&format!("{}: {}\n", key, shown));
                }
            }
            Ok(out)
        }
        other => anyhow::bail!("Unknown format '{}' (expected json, yaml or plain)", other),
    }
}

/// Look up one setting by (normalized) key for `config get`.
pub fn get_setting(settings: &Settings, key: &str) -> Result<String> {
    let key = normalize_key(key);
    let value = serde_json::to_value(settings)?;
    value
        .get(&key)
        .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
        .ok_or_else(|| anyhow::anyhow!("'{}' is not a valid configuration setting", key))
}
