//! dbsetup core - idempotent schema migrations defined in code
//!
//! This crate follows a hexagonal layout:
//!
//! - **domain**: migration keys, version numbering, dialects, errors
//! - **ports**: the `MigrationConnection` trait migrations run against
//! - **services**: registry, executor, bootstrap initializer and runner
//! - **adapters**: DuckDB and (feature `postgres`) PostgreSQL connections
//!
//! ```no_run
//! use dbsetup_core::adapters::duckdb::DuckDbConnection;
//! use dbsetup_core::{Dialect, MigrationRegistry, MigrationService};
//!
//! # fn main() -> dbsetup_core::Result<()> {
//! let mut registry = MigrationRegistry::new(Dialect::DuckDb);
//! registry.register("add_orders", "CREATE TABLE orders (id INTEGER PRIMARY KEY)");
//!
//! let mut conn = DuckDbConnection::open(std::path::Path::new("app.duckdb"))?;
//! let report = MigrationService::new(&registry).run(&mut conn)?;
//! println!("applied {:?}", report.applied);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::Path;

use adapters::duckdb::DuckDbConnection;
use config::Config;

// Re-export commonly used types at crate root
pub use domain::result::{Error, Result};
pub use domain::{next_migration_number, AppliedMigration, Dialect, MigrationKey};
pub use ports::MigrationConnection;
pub use services::{
    add_migration, BootstrapOutcome, BootstrapSettings, MigrationReport, MigrationRegistry,
    MigrationService,
};

/// Main context for dbsetup operations
///
/// Holds the configuration, an open connection and the registry seeded
/// with the initial schema. Applications register their own migrations
/// through `registry` before calling `run_migrations`.
pub struct DbSetupContext {
    pub config: Config,
    pub connection: Box<dyn MigrationConnection>,
    pub registry: MigrationRegistry,
}

impl DbSetupContext {
    /// Load config from `config_dir` and open the configured database
    pub fn new(config_dir: &Path, database_override: Option<&str>) -> Result<Self> {
        let mut config = Config::load(config_dir)?;
        if let Some(database) = database_override {
            config.database = Some(database.to_string());
        }

        let connection = open_connection(&config, config_dir)?;
        let registry = MigrationRegistry::new(config.dialect);

        Ok(Self {
            config,
            connection,
            registry,
        })
    }

    /// Run all pending migrations
    pub fn run_migrations(&mut self) -> Result<MigrationReport> {
        let service = MigrationService::new(&self.registry)
            .with_bootstrap(self.config.bootstrap_settings());
        service.run(self.connection.as_mut())
    }

    pub fn applied(&mut self) -> Result<Vec<AppliedMigration>> {
        let service = MigrationService::new(&self.registry);
        service.applied(self.connection.as_mut())
    }

    pub fn pending(&mut self) -> Result<Vec<MigrationKey>> {
        let service = MigrationService::new(&self.registry);
        service.pending(self.connection.as_mut())
    }

    pub fn next_number(&mut self) -> Result<String> {
        let service = MigrationService::new(&self.registry);
        service.next_number(self.connection.as_mut())
    }
}

/// Open a connection for the configured dialect
pub fn open_connection(config: &Config, config_dir: &Path) -> Result<Box<dyn MigrationConnection>> {
    match config.dialect {
        Dialect::DuckDb => {
            let path = config.duckdb_path(config_dir);
            Ok(Box::new(DuckDbConnection::open(&path)?))
        }
        Dialect::Postgres => open_postgres(config),
    }
}

#[cfg(feature = "postgres")]
fn open_postgres(config: &Config) -> Result<Box<dyn MigrationConnection>> {
    let params = config
        .database
        .as_deref()
        .ok_or_else(|| Error::config("postgres dialect requires a connection string in `database`"))?;
    Ok(Box::new(adapters::postgres::PostgresConnection::connect(params)?))
}

#[cfg(not(feature = "postgres"))]
fn open_postgres(_config: &Config) -> Result<Box<dyn MigrationConnection>> {
    Err(Error::config(
        "postgres dialect requested but dbsetup was built without the `postgres` feature",
    ))
}
