//! Adapter implementations
//!
//! Adapters implement the `MigrationConnection` port:
//! - DuckDB (always available)
//! - PostgreSQL via the blocking `postgres` client (feature `postgres`)

pub mod duckdb;
#[cfg(feature = "postgres")]
pub mod postgres;
