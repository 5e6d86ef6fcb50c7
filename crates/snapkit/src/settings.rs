//! Settings for the snapkit CLI.
//!
//! Settings are loaded from, in order:
//! 1. The file named by `SNAPKIT_CONFIG`, or `<config dir>/snapkit/config.json`
//! 2. Environment overrides: `SNAPKIT_DEFAULT_CONFIG`, `SNAPKIT_BUS_ADDRESS`,
//!    `SNAPKIT_SNAPPER`, `SNAPKIT_JOB_KEY`, `SNAPKIT_LOG_LEVEL`
//!
//! A missing file yields the defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use snapkit_snapshot::DEFAULT_JOB_KEY;
use std::path::{Path, PathBuf};
use tracing::debug;

const CONFIG_ENV: &str = "SNAPKIT_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Snapper configuration used when `--config` is not given.
    pub default_config: String,

    /// D-Bus address of the bus snapper listens on; the system bus when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bus_address: Option<String>,

    /// Path of the `snapper` binary, used for undo.
    pub snapper: PathBuf,

    /// Userdata key holding job identifiers.
    pub job_key: String,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_config: "root".to_string(),
            bus_address: None,
            snapper: PathBuf::from("snapper"),
            job_key: DEFAULT_JOB_KEY.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from disk and the environment.
    pub fn load() -> Result<Self> {
        let mut settings = match settings_path() {
            Some(path) if path.exists() => Self::load_file(&path)?,
            _ => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Load settings from a JSON file.
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let settings = serde_json::from_str(&content)
            .with_context(|| format!("Invalid settings file {}", path.display()))?;
        debug!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Apply `SNAPKIT_*` overrides.
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| var(key).filter(|v| !v.is_empty());

        if let Some(value) = non_empty("SNAPKIT_DEFAULT_CONFIG") {
            self.default_config = value;
        }
        if let Some(value) = non_empty("SNAPKIT_BUS_ADDRESS") {
            self.bus_address = Some(value);
        }
        if let Some(value) = non_empty("SNAPKIT_SNAPPER") {
            self.snapper = PathBuf::from(value);
        }
        if let Some(value) = non_empty("SNAPKIT_JOB_KEY") {
            self.job_key = value;
        }
        if let Some(value) = non_empty("SNAPKIT_LOG_LEVEL") {
            self.log_level = value;
        }
    }
}

/// Settings file location.
fn settings_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    dirs::config_dir().map(|dir| dir.join("snapkit").join("config.json"))
}
