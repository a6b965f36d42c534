//! Core domain entities
//!
//! Pure data structures and numbering logic - no I/O.

mod dialect;
mod migration;
pub mod result;
pub mod version;

pub use dialect::Dialect;
pub use migration::{AppliedMigration, MigrationKey, VersionedMigration, INITIAL_SCHEMA_NAME};
pub use version::{format_version, next_migration_number};
