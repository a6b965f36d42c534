//! Built-in SQL - embedded at compile time
//!
//! The tracking table and the mandatory initial schema ship with the
//! binary via include_str!, one file per dialect. Application migrations
//! are registered in code through `MigrationRegistry::register`.

/// Tracking table DDL for PostgreSQL.
///
/// The column layout is shared with existing deployments and must not change.
pub const TRACKING_TABLE_POSTGRES: &str = include_str!("000_schema_migrations.postgres.sql");

/// Tracking table DDL for DuckDB
pub const TRACKING_TABLE_DUCKDB: &str = include_str!("000_schema_migrations.duckdb.sql");

/// Initial schema for PostgreSQL (needs the uuid-ossp extension)
pub const INITIAL_SCHEMA_POSTGRES: &str = include_str!("001_initial_schema.postgres.sql");

/// Initial schema for DuckDB
pub const INITIAL_SCHEMA_DUCKDB: &str = include_str!("001_initial_schema.duckdb.sql");
