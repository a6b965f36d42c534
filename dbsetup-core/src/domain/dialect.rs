//! SQL dialects supported by the migration engine

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::result::Error;
use crate::migrations::{
    INITIAL_SCHEMA_DUCKDB, INITIAL_SCHEMA_POSTGRES, TRACKING_TABLE_DUCKDB, TRACKING_TABLE_POSTGRES,
};

/// Target database engine
///
/// The dialect decides the DDL for the tracking table and the initial
/// schema, the schema that holds unqualified tables, and how bind
/// parameters are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    DuckDb,
    Postgres,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::DuckDb => "duckdb",
            Dialect::Postgres => "postgres",
        }
    }

    /// DDL creating the `schema_migrations` table if it does not exist
    pub fn tracking_table_ddl(&self) -> &'static str {
        match self {
            Dialect::DuckDb => TRACKING_TABLE_DUCKDB,
            Dialect::Postgres => TRACKING_TABLE_POSTGRES,
        }
    }

    /// SQL body of the mandatory `initial_schema` migration
    pub fn initial_schema(&self) -> &'static str {
        match self {
            Dialect::DuckDb => INITIAL_SCHEMA_DUCKDB,
            Dialect::Postgres => INITIAL_SCHEMA_POSTGRES,
        }
    }

    /// Schema that unqualified `CREATE TABLE` statements land in
    pub fn default_schema(&self) -> &'static str {
        match self {
            Dialect::DuckDb => "main",
            Dialect::Postgres => "public",
        }
    }

    /// Bind parameter for the 1-based position `n`
    pub fn placeholder(&self, n: usize) -> String {
        match self {
            Dialect::DuckDb => "?".to_string(),
            Dialect::Postgres => format!("${}", n),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "duckdb" => Ok(Dialect::DuckDb),
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            other => Err(Error::config(format!("unknown dialect '{}'", other))),
        }
    }
}
