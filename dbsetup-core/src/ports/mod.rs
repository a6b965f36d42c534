//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The migration
//! services depend only on these traits, not on a concrete database.

mod connection;

pub use connection::MigrationConnection;
