//! Assistant configuration.
//!
//! Defaults work out of the box; a JSON file and a few environment variables
//! can override them.

use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs;

/// Overrides the auto-save interval in seconds.
pub const ENV_AUTOSAVE_SECS: &str = "DM_ASSIST_AUTOSAVE_SECS";
/// Points at a JSON entity catalog.
pub const ENV_CATALOG: &str = "DM_ASSIST_CATALOG";
/// Overrides the last-save marker file.
pub const ENV_STATE_FILE: &str = "DM_ASSIST_STATE_FILE";

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::InvalidValue { .. } => ErrorKind::InvalidInput,
            _ => ErrorKind::PersistenceFailure,
        }
    }
}

/// Settings for a DM session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Seconds between combat auto-saves.
    pub auto_save_interval_secs: u64,

    /// Marker file that remembers the last combat save path.
    pub last_state_file: PathBuf,

    /// Where auto-save writes when no save path has been chosen yet.
    pub default_auto_save_path: PathBuf,

    /// JSON entity catalog; the built-in catalog is used when unset.
    pub catalog_path: Option<PathBuf>,

    /// Pixels per grid cell in exported map images.
    pub tile_size: u32,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            auto_save_interval_secs: 120,
            last_state_file: PathBuf::from("last_combat_state_path.txt"),
            default_auto_save_path: PathBuf::from("auto_save_combat_state.json"),
            catalog_path: None,
            tile_size: 16,
        }
    }
}

impl AssistantConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_auto_save_interval(mut self, secs: u64) -> Self {
        self.auto_save_interval_secs = secs;
        self
    }

    pub fn with_last_state_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.last_state_file = path.into();
        self
    }

    pub fn with_default_auto_save_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_auto_save_path = path.into();
        self
    }

    pub fn with_catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = Some(path.into());
        self
    }

    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn auto_save_interval(&self) -> Duration {
        Duration::from_secs(self.auto_save_interval_secs.max(1))
    }

    /// Load from a JSON file. Missing fields keep their defaults.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any variable source.
    pub fn apply_vars<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_AUTOSAVE_SECS) {
            self.auto_save_interval_secs = value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidValue {
                    name: ENV_AUTOSAVE_SECS,
                    value,
                })?;
        }
        if let Some(value) = lookup(ENV_CATALOG).filter(|v| !v.trim().is_empty()) {
            self.catalog_path = Some(PathBuf::from(value.trim()));
        }
        if let Some(value) = lookup(ENV_STATE_FILE).filter(|v| !v.trim().is_empty()) {
            self.last_state_file = PathBuf::from(value.trim());
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AssistantConfig::new();
        assert_eq!(config.auto_save_interval(), Duration::from_secs(120));
        assert_eq!(config.last_state_file, PathBuf::from("last_combat_state_path.txt"));
        assert_eq!(config.tile_size, 16);
        assert!(config.catalog_path.is_none());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: AssistantConfig = serde_json::from_str(r#"{"tile_size": 32}"#).unwrap();
        assert_eq!(config.tile_size, 32);
        assert_eq!(config.auto_save_interval_secs, 120);
    }

    #[test]
    fn test_variable_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_AUTOSAVE_SECS, "30"),
            (ENV_CATALOG, "monsters.json"),
        ]
        .into_iter()
        .collect();
        let config = AssistantConfig::new()
            .apply_vars(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.auto_save_interval_secs, 30);
        assert_eq!(config.catalog_path, Some(PathBuf::from("monsters.json")));
        assert_eq!(config.last_state_file, PathBuf::from("last_combat_state_path.txt"));

        let err = AssistantConfig::new()
            .apply_vars(|name| (name == ENV_AUTOSAVE_SECS).then(|| "soon".to_string()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_load_json_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let config = AssistantConfig::new().with_auto_save_interval(60).with_tile_size(8);
        tokio::fs::write(&path, serde_json::to_string(&config).unwrap())
            .await
            .unwrap();
        assert_eq!(AssistantConfig::load_json(&path).await.unwrap(), config);
    }
}
