//! Result and error types for the core library

use thiserror::Error;

/// Core library error type
///
/// `TrackingTable` and `ExecutionFailure` carry the migration key they
/// were raised for. Skipping an already-applied migration is not an
/// error and never shows up here.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Tracking table error for {key}: {message}")]
    TrackingTable { key: String, message: String },

    #[error("Migration {key} failed: {message}")]
    ExecutionFailure { key: String, message: String },

    #[error("Could not find migration key for {0}")]
    KeyResolution(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wrap a failure to create or query the tracking table
    pub fn tracking_table(key: impl Into<String>, cause: Error) -> Self {
        Self::TrackingTable {
            key: key.into(),
            message: cause.to_string(),
        }
    }

    /// Wrap a failure while applying or recording a migration
    pub fn execution(key: impl Into<String>, cause: Error) -> Self {
        Self::ExecutionFailure {
            key: key.into(),
            message: cause.to_string(),
        }
    }

    /// The migration key an error was raised for, if any
    pub fn migration_key(&self) -> Option<&str> {
        match self {
            Self::TrackingTable { key, .. } | Self::ExecutionFailure { key, .. } => Some(key.as_str()),
            _ => None,
        }
    }

    pub fn is_execution_failure(&self) -> bool {
        matches!(self, Self::ExecutionFailure { .. })
    }
}

impl From<duckdb::Error> for Error {
    fn from(err: duckdb::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[cfg(feature = "postgres")]
impl From<postgres::Error> for Error {
    fn from(err: postgres::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_failure_display_includes_key() {
        let err = Error::execution("002_add_orders", Error::database("syntax error at or near \"CRATE\""));
        assert_eq!(
            err.to_string(),
            "Migration 002_add_orders failed: Database error: syntax error at or near \"CRATE\""
        );
        assert_eq!(err.migration_key(), Some("002_add_orders"));
        assert!(err.is_execution_failure());
    }

    #[test]
    fn test_tracking_table_error_is_not_execution_failure() {
        let err = Error::tracking_table("001_initial_schema", Error::database("permission denied"));
        assert!(!err.is_execution_failure());
        assert_eq!(err.migration_key(), Some("001_initial_schema"));
    }

    #[test]
    fn test_key_resolution_display() {
        let err = Error::KeyResolution("add_orders".into());
        assert_eq!(err.to_string(), "Could not find migration key for add_orders");
        assert_eq!(err.migration_key(), None);
    }
}
