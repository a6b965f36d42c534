//! Configuration management
//!
//! Settings live in `dbsetup.json` inside the config directory:
//! ```json
//! {
//!   "database": "app.duckdb",
//!   "dialect": "duckdb",
//!   "bootstrap": { "sentinelTable": "users", "sentinelSchema": null }
//! }
//! ```
//! Keys this crate does not know about are preserved when saving.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};
use crate::domain::Dialect;
use crate::services::BootstrapSettings;

pub const SETTINGS_FILE: &str = "dbsetup.json";

/// Database file used when nothing is configured (DuckDB only)
pub const DEFAULT_DATABASE: &str = "dbsetup.duckdb";

/// Raw dbsetup.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dialect: Option<Dialect>,
    #[serde(default)]
    bootstrap: BootstrapFileSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BootstrapFileSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sentinel_table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sentinel_schema: Option<String>,
}

/// dbsetup configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// DuckDB file path or PostgreSQL connection string
    pub database: Option<String>,
    pub dialect: Dialect,
    pub sentinel_table: String,
    pub sentinel_schema: Option<String>,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            dialect: Dialect::default(),
            sentinel_table: BootstrapSettings::default().sentinel_table,
            sentinel_schema: None,
            _raw_settings: SettingsFile::default(),
        }
    }
}

impl Config {
    /// Load config from the config directory
    ///
    /// `DBSETUP_DATABASE` and `DBSETUP_DIALECT` override the file.
    pub fn load(config_dir: &Path) -> Result<Self> {
        Self::load_with_env(config_dir, |name| std::env::var(name).ok())
    }

    /// Load config with an explicit environment lookup
    pub fn load_with_env<F>(config_dir: &Path, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings_path = config_dir.join(SETTINGS_FILE);

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).map_err(|e| {
                Error::config(format!("invalid {}: {}", settings_path.display(), e))
            })?
        } else {
            SettingsFile::default()
        };

        let database = env("DBSETUP_DATABASE")
            .filter(|v| !v.trim().is_empty())
            .or_else(|| raw.database.clone());

        let dialect = match env("DBSETUP_DIALECT") {
            Some(value) => value.parse()?,
            None => raw.dialect.unwrap_or_default(),
        };

        Ok(Self {
            database,
            dialect,
            sentinel_table: raw
                .bootstrap
                .sentinel_table
                .clone()
                .unwrap_or_else(|| BootstrapSettings::default().sentinel_table),
            sentinel_schema: raw.bootstrap.sentinel_schema.clone(),
            _raw_settings: raw,
        })
    }

    /// Save config to the config directory
    /// Preserves other settings that dbsetup doesn't manage
    pub fn save(&self, config_dir: &Path) -> Result<()> {
        let settings_path = config_dir.join(SETTINGS_FILE);

        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).unwrap_or_default()
        } else {
            self._raw_settings.clone()
        };

        settings.database = self.database.clone();
        settings.dialect = Some(self.dialect);
        settings.bootstrap.sentinel_table = Some(self.sentinel_table.clone());
        settings.bootstrap.sentinel_schema = self.sentinel_schema.clone();

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }

    /// Bootstrap settings for the migration service
    pub fn bootstrap_settings(&self) -> BootstrapSettings {
        BootstrapSettings {
            sentinel_schema: self.sentinel_schema.clone(),
            sentinel_table: self.sentinel_table.clone(),
            ..BootstrapSettings::default()
        }
    }

    /// DuckDB file to open; relative paths resolve against the config directory
    pub fn duckdb_path(&self, config_dir: &Path) -> PathBuf {
        let database = self.database.as_deref().unwrap_or(DEFAULT_DATABASE);
        let path = Path::new(database);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            config_dir.join(path)
        }
    }
}
