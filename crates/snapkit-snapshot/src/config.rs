//! Snapshot configuration settings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A value for a configuration setting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Flag(bool),
    Text(String),
}

impl ConfigValue {
    /// Render the value the way the service expects it: booleans become
    /// `yes`/`no`, text is sent as-is.
    pub fn to_service_string(&self) -> String {
        match self {
            Self::Flag(true) => "yes".to_string(),
            Self::Flag(false) => "no".to_string(),
            Self::Text(text) => text.clone(),
        }
    }

    /// Parse a command-line value. `true`/`false` become flags.
    pub fn parse(value: &str) -> Self {
        match value {
            "true" => Self::Flag(true),
            "false" => Self::Flag(false),
            other => Self::Text(other.to_string()),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_service_string())
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Normalize settings for the service.
///
/// Keys are upper-cased to the service convention and keys starting with
/// `__` are dropped.
pub fn service_settings(settings: &BTreeMap<String, ConfigValue>) -> BTreeMap<String, String> {
    settings
        .iter()
        .filter(|(key, _)| !key.starts_with("__"))
        .map(|(key, value)| (key.to_uppercase(), value.to_service_string()))
        .collect()
}
