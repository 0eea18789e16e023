//! User configuration handling

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::options::DiffOptions;

/// Environment variable naming a colours file or built-in palette.
pub const COLORS_ENV: &str = "GERRIT_DIFF_COLORS";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// Layout and decoration preferences.
    pub diff: DiffOptions,
    /// Built-in palette name or path to a colours file.
    pub colors: Option<String>,
    /// Force colour output on or off.
    pub color: Option<bool>,
}

impl UserConfig {
    /// Palette to use: `GERRIT_DIFF_COLORS` wins over the config file.
    #[must_use]
    pub fn colors_spec(&self) -> Option<String> {
        std::env::var(COLORS_ENV)
            .ok()
            .filter(|value| !value.is_empty())
            .or_else(|| self.colors.clone())
    }
}

/// Load the user configuration from the user's config directory.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be read or parsed.
pub fn load_user_config() -> anyhow::Result<Option<UserConfig>> {
    let Some(path) = config_path() else {
        return Ok(None);
    };
    load_config_from_path(&path)
}

/// Load a configuration file; a missing file is not an error.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config_from_path(path: &Path) -> anyhow::Result<Option<UserConfig>> {
    if !path.exists() {
        log::debug!("no config at {}", path.display());
        return Ok(None);
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let config = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    Ok(Some(config))
}

/// Save the user configuration to the user's config directory.
///
/// # Errors
///
/// Returns an error if the config directory cannot be created or the file cannot be written.
pub fn save_user_config(config: &UserConfig) -> anyhow::Result<()> {
    let Some(path) = config_path() else {
        return Ok(());
    };
    save_config_to_path(config, &path)
}

/// Write `config` as pretty JSON, creating parent directories.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file cannot be written.
pub fn save_config_to_path(config: &UserConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let contents = serde_json::to_string_pretty(config)?;
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write config: {}", path.display()))?;
    Ok(())
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    let base = if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg)
    } else if let Ok(home) = std::env::var("HOME") {
        Path::new(&home).join(".config")
    } else {
        return None;
    };

    Some(base.join("gerrit-diff").join("config.json"))
}
