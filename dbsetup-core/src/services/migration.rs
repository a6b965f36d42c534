//! Migration service - runs the registered migrations against a database
//!
//! Each run first adopts legacy deployments (see `bootstrap`), then walks
//! the registry in order and hands every migration to the executor. The
//! first failure stops the run; migrations committed before it stay
//! recorded.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::result::{Error, Result};
use crate::domain::{next_migration_number, AppliedMigration, MigrationKey};
use crate::ports::MigrationConnection;
use crate::services::bootstrap::{initialize_tracking, BootstrapOutcome, BootstrapSettings};
use crate::services::executor::execute_migration;
use crate::services::registry::MigrationRegistry;
use crate::services::tracking::{applied_records, tracking_table_exists};

/// Result of running migrations
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    /// What the bootstrap step did before the run
    pub bootstrap: BootstrapOutcome,
    /// Keys of newly applied migrations, in order
    pub applied: Vec<String>,
    /// Count of migrations that were already applied
    pub already_applied: usize,
}

/// Service for running registered migrations
pub struct MigrationService<'a> {
    registry: &'a MigrationRegistry,
    bootstrap: BootstrapSettings,
}

impl<'a> MigrationService<'a> {
    pub fn new(registry: &'a MigrationRegistry) -> Self {
        Self {
            registry,
            bootstrap: BootstrapSettings::default(),
        }
    }

    /// Override where the bootstrap step looks for a legacy schema
    pub fn with_bootstrap(mut self, settings: BootstrapSettings) -> Self {
        self.bootstrap = settings;
        self
    }

    /// Run all pending migrations
    ///
    /// 1. Bootstraps tracking for legacy deployments (never fails the run)
    /// 2. Executes every registered migration in registration order
    /// 3. Stops at the first failing migration and returns its error
    pub fn run<C>(&self, conn: &mut C) -> Result<MigrationReport>
    where
        C: MigrationConnection + ?Sized,
    {
        let bootstrap = initialize_tracking(conn, &self.bootstrap);
        if let BootstrapOutcome::Failed { reason } = &bootstrap {
            warn!(reason = %reason, "Bootstrap failed, continuing with migration run");
        }

        let mut applied = Vec::new();
        let mut already_applied = 0;

        for migration in self.registry.all_migrations() {
            let key = migration.key.to_string();
            if execute_migration(conn, &migration.sql, &key)? {
                applied.push(key);
            } else {
                already_applied += 1;
            }
        }

        info!(
            applied = applied.len(),
            already_applied,
            "Migration run complete"
        );

        Ok(MigrationReport {
            bootstrap,
            applied,
            already_applied,
        })
    }

    /// Recorded migrations, oldest first
    ///
    /// Read-only: a database without a tracking table has nothing applied.
    pub fn applied<C>(&self, conn: &mut C) -> Result<Vec<AppliedMigration>>
    where
        C: MigrationConnection + ?Sized,
    {
        let records = if tracking_table_exists(conn)? {
            applied_records(conn)?
        } else {
            Vec::new()
        };
        conn.rollback()?;
        Ok(records)
    }

    /// Registered migrations with no tracking row, in run order
    pub fn pending<C>(&self, conn: &mut C) -> Result<Vec<MigrationKey>>
    where
        C: MigrationConnection + ?Sized,
    {
        let applied: HashSet<String> = self
            .applied(conn)?
            .into_iter()
            .map(|r| r.migration_name)
            .collect();

        Ok(self
            .registry
            .keys()
            .into_iter()
            .filter(|key| !applied.contains(&key.to_string()))
            .collect())
    }

    /// Out-of-band version prefix after everything the database recorded.
    ///
    /// This is not the number the registry would assign; see
    /// `domain::version`.
    pub fn next_number<C>(&self, conn: &mut C) -> Result<String>
    where
        C: MigrationConnection + ?Sized,
    {
        let records = self.applied(conn)?;
        Ok(next_migration_number(
            records.iter().map(|r| r.migration_name.as_str()),
        ))
    }
}

/// Register a migration and apply just that one.
///
/// Returns the key it was applied (or found already applied) under.
pub fn add_migration<C>(
    conn: &mut C,
    registry: &mut MigrationRegistry,
    name: &str,
    sql: &str,
) -> Result<MigrationKey>
where
    C: MigrationConnection + ?Sized,
{
    registry.register(name, sql);

    let key = registry
        .key_for(name)
        .ok_or_else(|| Error::KeyResolution(name.to_string()))?;

    execute_migration(conn, sql, &key.to_string())?;
    info!(key = %key, "Added and executed new migration");

    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::duckdb::DuckDbConnection;
    use crate::domain::Dialect;

    fn registry_with(extra: &[(&str, &str)]) -> MigrationRegistry {
        let mut registry = MigrationRegistry::new(Dialect::DuckDb);
        for (name, sql) in extra {
            registry.register(*name, *sql);
        }
        registry
    }

    #[test]
    fn test_run_twice_applies_once() {
        let registry = registry_with(&[("add_orders", "CREATE TABLE orders (id INTEGER)")]);
        let service = MigrationService::new(&registry);
        let mut conn = DuckDbConnection::open_in_memory().unwrap();

        let first = service.run(&mut conn).unwrap();
        assert_eq!(first.applied, vec!["001_initial_schema", "002_add_orders"]);
        assert_eq!(first.already_applied, 0);
        assert_eq!(first.bootstrap, BootstrapOutcome::FreshDatabase);

        let second = service.run(&mut conn).unwrap();
        assert!(second.applied.is_empty());
        assert_eq!(second.already_applied, 2);
        assert_eq!(second.bootstrap, BootstrapOutcome::AlreadyTracked);
        assert!(!conn.in_transaction());
    }

    #[test]
    fn test_pending_shrinks_after_run() {
        let registry = registry_with(&[("add_orders", "CREATE TABLE orders (id INTEGER)")]);
        let service = MigrationService::new(&registry);
        let mut conn = DuckDbConnection::open_in_memory().unwrap();

        let pending: Vec<String> = service
            .pending(&mut conn)
            .unwrap()
            .iter()
            .map(|k| k.to_string())
            .collect();
        assert_eq!(pending, vec!["001_initial_schema", "002_add_orders"]);

        service.run(&mut conn).unwrap();
        assert!(service.pending(&mut conn).unwrap().is_empty());
    }

    #[test]
    fn test_failure_halts_run() {
        let registry = registry_with(&[
            ("add_orders", "CREATE TABLE orders (id INTEGER)"),
            ("broken", "CREATE TABLE orders (id INTEGER)"),
            ("add_items", "CREATE TABLE items (id INTEGER)"),
        ]);
        let service = MigrationService::new(&registry);
        let mut conn = DuckDbConnection::open_in_memory().unwrap();

        let err = service.run(&mut conn).unwrap_err();
        assert_eq!(err.migration_key(), Some("003_broken"));

        let names: Vec<String> = service
            .applied(&mut conn)
            .unwrap()
            .into_iter()
            .map(|r| r.migration_name)
            .collect();
        assert_eq!(names, vec!["001_initial_schema", "002_add_orders"]);
        assert!(!conn.table_exists("main", "items").unwrap());
    }

    #[test]
    fn test_add_migration_applies_single_entry() {
        let mut registry = MigrationRegistry::new(Dialect::DuckDb);
        let mut conn = DuckDbConnection::open_in_memory().unwrap();
        MigrationService::new(&registry).run(&mut conn).unwrap();

        let key = add_migration(
            &mut conn,
            &mut registry,
            "add_orders",
            "CREATE TABLE orders (id INTEGER)",
        )
        .unwrap();

        assert_eq!(key.to_string(), "002_add_orders");
        assert!(conn.table_exists("main", "orders").unwrap());

        // A later full run only skips
        let report = MigrationService::new(&registry).run(&mut conn).unwrap();
        assert!(report.applied.is_empty());
        assert_eq!(report.already_applied, 2);
    }

    #[test]
    fn test_next_number_from_recorded_keys() {
        let registry = registry_with(&[("add_orders", "CREATE TABLE orders (id INTEGER)")]);
        let service = MigrationService::new(&registry);
        let mut conn = DuckDbConnection::open_in_memory().unwrap();

        assert_eq!(service.next_number(&mut conn).unwrap(), "001");
        service.run(&mut conn).unwrap();
        assert_eq!(service.next_number(&mut conn).unwrap(), "003");
    }

    #[test]
    fn test_listing_does_not_create_tracking_table() {
        let registry = registry_with(&[("add_orders", "CREATE TABLE orders (id INTEGER)")]);
        let service = MigrationService::new(&registry);
        let mut conn = DuckDbConnection::open_in_memory().unwrap();

        assert!(service.applied(&mut conn).unwrap().is_empty());
        assert_eq!(service.pending(&mut conn).unwrap().len(), 2);
        assert_eq!(service.next_number(&mut conn).unwrap(), "001");
        assert!(!conn.table_exists("main", "schema_migrations").unwrap());
    }

    #[test]
    fn test_listing_closes_its_read_transaction() {
        let registry = MigrationRegistry::new(Dialect::DuckDb);
        let service = MigrationService::new(&registry);
        let mut conn = DuckDbConnection::open_in_memory().unwrap();
        service.run(&mut conn).unwrap();

        assert_eq!(service.applied(&mut conn).unwrap().len(), 1);
        assert!(!conn.in_transaction());
    }
}
