//! Migration registry - the in-code catalog of migrations

use std::collections::HashMap;

use tracing::debug;

use crate::domain::{Dialect, MigrationKey, VersionedMigration, INITIAL_SCHEMA_NAME};

/// Ordered catalog of migrations defined in application code
///
/// Built once by the process entry point and handed to the runner by
/// reference. Registration order is append-only: a name keeps the
/// position it was first registered at, and that position is its version.
#[derive(Debug, Clone)]
pub struct MigrationRegistry {
    order: Vec<String>,
    bodies: HashMap<String, String>,
}

impl MigrationRegistry {
    /// Create a registry seeded with the dialect's `initial_schema`.
    ///
    /// The initial schema is always version 001.
    pub fn new(dialect: Dialect) -> Self {
        let mut registry = Self {
            order: Vec::new(),
            bodies: HashMap::new(),
        };
        registry.register(INITIAL_SCHEMA_NAME, dialect.initial_schema());
        registry
    }

    /// Register a migration, returning its name.
    ///
    /// Re-registering an existing name replaces its SQL and keeps its
    /// position. The SQL is not validated here; a bad body fails when
    /// it is executed.
    pub fn register(&mut self, name: impl Into<String>, sql: impl Into<String>) -> String {
        let name = name.into();
        if !self.bodies.contains_key(&name) {
            self.order.push(name.clone());
            debug!(name = %name, position = self.order.len(), "Registered migration");
        }
        self.bodies.insert(name.clone(), sql.into());
        name
    }

    /// All migrations with their versioned keys, in registration order
    pub fn all_migrations(&self) -> Vec<VersionedMigration> {
        self.order
            .iter()
            .enumerate()
            .map(|(index, name)| VersionedMigration {
                key: MigrationKey::for_position(index, name.as_str()),
                sql: self.bodies.get(name).cloned().unwrap_or_default(),
            })
            .collect()
    }

    /// Versioned keys in registration order
    pub fn keys(&self) -> Vec<MigrationKey> {
        self.order
            .iter()
            .enumerate()
            .map(|(index, name)| MigrationKey::for_position(index, name.as_str()))
            .collect()
    }

    /// Key currently assigned to `name`
    pub fn key_for(&self, name: &str) -> Option<MigrationKey> {
        self.order
            .iter()
            .position(|n| n == name)
            .map(|index| MigrationKey::for_position(index, name))
    }

    pub fn sql_for(&self, name: &str) -> Option<&str> {
        self.bodies.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
