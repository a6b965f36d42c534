//! Init command - write dbsetup.json

use std::path::Path;

use anyhow::{Context, Result};
use dbsetup_core::config::{Config, SETTINGS_FILE};
use dbsetup_core::Dialect;

use super::get_config_dir;
use crate::output;

/// Settings given on the command line; `None` keeps the current value
#[derive(Debug, Default)]
pub struct InitOptions {
    pub database: Option<String>,
    pub dialect: Option<String>,
    pub sentinel_table: Option<String>,
    pub sentinel_schema: Option<String>,
}

pub fn run(options: InitOptions) -> Result<()> {
    let config_dir = get_config_dir();
    std::fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;

    let config = write_settings(&config_dir, options)?;

    output::success(&format!(
        "Wrote {}",
        config_dir.join(SETTINGS_FILE).display()
    ));
    println!("  dialect:  {}", config.dialect);
    println!(
        "  database: {}",
        match config.dialect {
            Dialect::DuckDb => config.duckdb_path(&config_dir).display().to_string(),
            Dialect::Postgres => config.database.clone().unwrap_or_default(),
        }
    );
    println!(
        "  sentinel: {}.{}",
        config
            .sentinel_schema
            .as_deref()
            .unwrap_or_else(|| config.dialect.default_schema()),
        config.sentinel_table
    );

    Ok(())
}

/// Merge `options` into the settings file in `config_dir` and save it
///
/// Environment overrides are not read here, so they never end up in the file.
fn write_settings(config_dir: &Path, options: InitOptions) -> Result<Config> {
    let mut config = Config::load_with_env(config_dir, |_| None)
        .context("Failed to read existing settings")?;

    if let Some(database) = options.database {
        config.database = Some(database);
    }
    if let Some(dialect) = options.dialect {
        config.dialect = dialect.parse()?;
    }
    if let Some(table) = options.sentinel_table {
        config.sentinel_table = table;
    }
    if let Some(schema) = options.sentinel_schema {
        config.sentinel_schema = Some(schema);
    }

    if config.dialect == Dialect::Postgres && config.database.is_none() {
        anyhow::bail!("postgres dialect needs --database with a connection string");
    }

    config.save(config_dir).context("Failed to save settings")?;
    Ok(config)
}
