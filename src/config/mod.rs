//! Configuration module for search-relay
//!
//! Handles loading settings from YAML files and environment variables.

mod settings;

pub use settings::*;

use crate::error::ConfigError;
use std::path::PathBuf;

/// Environment variable naming an explicit settings file
pub const SETTINGS_PATH_ENV: &str = "SEARCH_RELAY_SETTINGS_PATH";

/// Candidate settings files, most specific first
pub fn settings_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(path) = std::env::var(SETTINGS_PATH_ENV) {
        paths.push(PathBuf::from(path));
    }
    paths.push(PathBuf::from("settings.yml"));
    paths.push(PathBuf::from("config/settings.yml"));
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("search-relay/settings.yml"));
    }
    paths
}

/// Load settings from the first existing candidate file, or defaults.
///
/// Returns the file that was read, if any. Environment overrides are
/// applied either way. Nothing is logged here since this runs before the
/// subscriber is installed.
pub fn load() -> Result<(Settings, Option<PathBuf>), ConfigError> {
    load_from(&settings_paths())
}

/// Like [`load`], over an explicit candidate list
pub fn load_from(paths: &[PathBuf]) -> Result<(Settings, Option<PathBuf>), ConfigError> {
    let source = paths.iter().find(|p| p.exists()).cloned();
    let mut settings = match source {
        Some(ref path) => Settings::from_file(path)?,
        None => Settings::default(),
    };
    settings.merge_env();
    Ok((settings, source))
}
