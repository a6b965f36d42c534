//! Migration domain models

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};

use crate::domain::version::format_version;

/// Name of the mandatory first migration
pub const INITIAL_SCHEMA_NAME: &str = "initial_schema";

/// Durable identity of a migration: `"<version>_<name>"`, e.g. `001_initial_schema`.
///
/// The version is the 1-based registration position, so renaming or
/// reordering registrations produces a different key and the tracking
/// table will treat the migration as new.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MigrationKey {
    version: usize,
    name: String,
}

impl MigrationKey {
    pub fn new(version: usize, name: impl Into<String>) -> Self {
        Self {
            version,
            name: name.into(),
        }
    }

    /// Key for the migration registered at 0-based `index`
    pub fn for_position(index: usize, name: impl Into<String>) -> Self {
        Self::new(index + 1, name)
    }

    /// `001_initial_schema`
    pub fn initial_schema() -> Self {
        Self::new(1, INITIAL_SCHEMA_NAME)
    }

    pub fn version(&self) -> usize {
        self.version
    }

    /// Zero-padded version prefix ("001")
    pub fn version_prefix(&self) -> String {
        format_version(self.version)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for MigrationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", format_version(self.version), self.name)
    }
}

impl Serialize for MigrationKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A registered migration with its computed key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedMigration {
    pub key: MigrationKey,
    pub sql: String,
}

/// A row of the tracking table
#[derive(Debug, Clone, Serialize)]
pub struct AppliedMigration {
    pub id: i64,
    pub migration_name: String,
    pub applied_at: Option<NaiveDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        assert_eq!(MigrationKey::initial_schema().to_string(), "001_initial_schema");
        assert_eq!(MigrationKey::for_position(41, "add_orders").to_string(), "042_add_orders");
        assert_eq!(MigrationKey::new(1000, "big").to_string(), "1000_big");
    }

    #[test]
    fn test_key_serializes_as_string() {
        let json = serde_json::to_string(&MigrationKey::new(7, "x")).unwrap();
        assert_eq!(json, "\"007_x\"");
    }
}
