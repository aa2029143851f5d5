//! Configuration for the contacts bridge.
//!
//! Loaded from `config.toml` in [`config_dir`]. Every field has a default, so
//! a missing file or a partial file is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ContactsError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactsConfig {
    /// Script interpreter settings.
    pub executor: ExecutorConfig,
    /// Server-side bounds applied before any script is built.
    pub limits: Limits,
    /// Which tools are exposed.
    pub tool_mode: ToolMode,
}

/// Script interpreter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Interpreter program name or path.
    pub interpreter: String,
    /// Upper bound on one interpreter run. Contacts.app may sit on a
    /// permission prompt indefinitely.
    pub timeout_secs: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            interpreter: "osascript".to_owned(),
            timeout_secs: 30,
        }
    }
}

/// Row and window bounds, clamped before they reach a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum results for a filtered search.
    pub search_max: usize,
    /// Maximum people enumerated when searching without a query.
    pub browse_window: usize,
    /// Maximum rows for a recent listing.
    pub recent_max: usize,
    /// Largest accepted `daysBack`.
    pub max_days_back: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            search_max: 100,
            browse_window: 50,
            recent_max: 100,
            max_days_back: 3650,
        }
    }
}

/// Tool exposure mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolMode {
    /// Only search, fetch and recent.
    ReadOnly,
    /// All tools, including create and update.
    #[default]
    Full,
}

impl ContactsConfig {
    /// Load configuration from a TOML file, falling back to defaults for
    /// missing fields.
    ///
    /// # Errors
    ///
    /// Returns [`ContactsError::Config`] if the file cannot be read, parsed
    /// or fails validation.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ContactsError::Config(format!(
                "failed to read config file '{}': {e}",
                path.display()
            ))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            ContactsError::Config(format!(
                "failed to parse config file '{}': {e}",
                path.display()
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from [`default_config_path`] if it exists, else defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ContactsError::Config`] if an existing file is invalid.
    pub fn load() -> Result<Self> {
        let path = default_config_path();
        if path.exists() {
            tracing::info!(path = %path.display(), "loading config");
            Self::from_file(&path)
        } else {
            tracing::debug!(path = %path.display(), "no config file; using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`ContactsError::Config`] on serialization or write failure.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ContactsError::Config(format!(
                    "failed to create config directory '{}': {e}",
                    parent.display()
                ))
            })?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| ContactsError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, content).map_err(|e| {
            ContactsError::Config(format!(
                "failed to write config file '{}': {e}",
                path.display()
            ))
        })
    }

    /// Reject values that would make every call fail or hang.
    ///
    /// # Errors
    ///
    /// Returns [`ContactsError::Config`] naming the offending key.
    pub fn validate(&self) -> Result<()> {
        if self.executor.interpreter.trim().is_empty() {
            return Err(ContactsError::Config(
                "executor.interpreter cannot be empty".to_owned(),
            ));
        }
        if self.executor.timeout_secs == 0 {
            return Err(ContactsError::Config(
                "executor.timeout_secs must be at least 1".to_owned(),
            ));
        }
        let limits = [
            ("limits.search_max", self.limits.search_max),
            ("limits.browse_window", self.limits.browse_window),
            ("limits.recent_max", self.limits.recent_max),
            ("limits.max_days_back", self.limits.max_days_back as usize),
        ];
        if let Some((key, _)) = limits.iter().find(|(_, v)| *v == 0) {
            return Err(ContactsError::Config(format!("{key} must be at least 1")));
        }
        Ok(())
    }
}

/// Configuration directory.
///
/// Resolves to `dirs::config_dir()/contacts-bridge/` by default. Override
/// with the `CONTACTS_BRIDGE_CONFIG_DIR` environment variable.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("CONTACTS_BRIDGE_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("contacts-bridge"))
        .unwrap_or_else(|| PathBuf::from("/tmp/contacts-bridge-config"))
}

/// Default config file path: `config_dir()/config.toml`.
#[must_use]
pub fn default_config_path() -> PathBuf {
    config_dir().join("config.toml")
}
