//! CLI command implementations

pub mod init;
pub mod migrate;
pub mod next_number;
pub mod status;

use std::path::PathBuf;

use anyhow::{Context, Result};
use dbsetup_core::DbSetupContext;

/// Get the dbsetup config directory from environment or default
pub fn get_config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("DBSETUP_DIR") {
        PathBuf::from(dir)
    } else {
        dirs::home_dir()
            .map(|home| home.join(".dbsetup"))
            .unwrap_or_else(|| PathBuf::from(".dbsetup"))
    }
}

/// Open the configured database and build the migration registry
pub fn get_context(database: Option<&str>) -> Result<DbSetupContext> {
    let config_dir = get_config_dir();

    std::fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;

    tracing::debug!(config_dir = %config_dir.display(), "Opening dbsetup context");
    DbSetupContext::new(&config_dir, database).context("Failed to initialize dbsetup context")
}
