//! DuckDB connection adapter

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use duckdb::{params_from_iter, Connection};
use tracing::{debug, warn};

use crate::domain::result::{Error, Result};
use crate::domain::Dialect;
use crate::ports::MigrationConnection;

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("could not set lock on file")
        || lower.contains("file is already open")
}

/// DuckDB-backed migration connection
///
/// DuckDB runs in autocommit mode by default; this adapter issues
/// `BEGIN TRANSACTION` before the first statement after each commit or
/// rollback so that it behaves like a DB-API driver.
pub struct DuckDbConnection {
    conn: Connection,
    db_path: Option<PathBuf>,
    in_transaction: bool,
}

impl DuckDbConnection {
    /// Open (or create) a database file
    ///
    /// Retries with exponential backoff when another process holds the
    /// file lock.
    pub fn open(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn,
                        db_path: Some(db_path.to_path_buf()),
                        in_transaction: false,
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        warn!(
                            path = %db_path.display(),
                            delay_ms = delay.as_millis() as u64,
                            attempt = attempt + 1,
                            max_attempts = MAX_RETRIES,
                            error = %err_msg,
                            "Database busy, retrying"
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::database(format!("Failed to open database after {} retries", MAX_RETRIES))
        }))
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        Ok(Self {
            conn,
            db_path: None,
            in_transaction: false,
        })
    }

    fn try_open_connection(db_path: &Path) -> Result<Connection> {
        // Extension autoloading stays off; the built-in DDL needs no extensions
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Ok(Connection::open_with_flags(db_path, config)?)
    }

    /// Open a second connection to the same database instance.
    ///
    /// The clone has its own transaction state.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            conn: self.conn.try_clone()?,
            db_path: self.db_path.clone(),
            in_transaction: false,
        })
    }

    /// Path of the database file, `None` for in-memory databases
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn begin_if_needed(&mut self) -> Result<()> {
        if !self.in_transaction {
            self.conn.execute_batch("BEGIN TRANSACTION")?;
            self.in_transaction = true;
        }
        Ok(())
    }
}

impl MigrationConnection for DuckDbConnection {
    fn dialect(&self) -> Dialect {
        Dialect::DuckDb
    }

    fn execute(&mut self, sql: &str, params: &[&str]) -> Result<usize> {
        self.begin_if_needed()?;
        Ok(self.conn.execute(sql, params_from_iter(params.iter()))?)
    }

    fn execute_batch(&mut self, sql: &str) -> Result<()> {
        self.begin_if_needed()?;
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    fn query_count(&mut self, sql: &str, params: &[&str]) -> Result<i64> {
        self.begin_if_needed()?;
        match self
            .conn
            .query_row(sql, params_from_iter(params.iter()), |row| row.get::<_, i64>(0))
        {
            Ok(count) => Ok(count),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn query_rows(
        &mut self,
        sql: &str,
        params: &[&str],
        columns: usize,
    ) -> Result<Vec<Vec<Option<String>>>> {
        self.begin_if_needed()?;
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
            (0..columns)
                .map(|i| row.get::<_, Option<String>>(i))
                .collect::<duckdb::Result<Vec<_>>>()
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    fn commit(&mut self) -> Result<()> {
        if self.in_transaction {
            self.conn.execute_batch("COMMIT")?;
            self.in_transaction = false;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Ok(());
        }
        self.in_transaction = false;
        if let Err(e) = self.conn.execute_batch("ROLLBACK") {
            // A failed COMMIT has already ended the transaction
            debug!(error = %e, "Rollback found no active transaction");
        }
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.in_transaction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncommitted_work_is_rolled_back() {
        let mut conn = DuckDbConnection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (x INTEGER)").unwrap();
        conn.commit().unwrap();

        conn.execute("INSERT INTO t VALUES (1)", &[]).unwrap();
        conn.rollback().unwrap();

        assert_eq!(conn.query_count("SELECT COUNT(*) FROM t", &[]).unwrap(), 0);
    }

    #[test]
    fn test_committed_work_survives_rollback() {
        let mut conn = DuckDbConnection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (x VARCHAR)").unwrap();
        conn.execute("INSERT INTO t VALUES (?)", &["a"]).unwrap();
        conn.commit().unwrap();
        conn.rollback().unwrap();

        assert_eq!(
            conn.query_count("SELECT COUNT(*) FROM t WHERE x = ?", &["a"]).unwrap(),
            1
        );
    }

    #[test]
    fn test_rollback_without_transaction_is_noop() {
        let mut conn = DuckDbConnection::open_in_memory().unwrap();
        conn.rollback().unwrap();
        conn.commit().unwrap();
    }

    #[test]
    fn test_table_exists_in_main_schema() {
        let mut conn = DuckDbConnection::open_in_memory().unwrap();
        assert!(!conn.table_exists("main", "users").unwrap());

        conn.execute_batch("CREATE TABLE users (id INTEGER)").unwrap();
        conn.commit().unwrap();

        assert!(conn.table_exists("main", "users").unwrap());
        assert!(!conn.table_exists("other", "users").unwrap());
    }

    #[test]
    fn test_query_rows_reads_text_columns() {
        let mut conn = DuckDbConnection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (a VARCHAR, b VARCHAR); INSERT INTO t VALUES ('x', NULL)")
            .unwrap();

        let rows = conn.query_rows("SELECT a, b FROM t", &[], 2).unwrap();
        assert_eq!(rows, vec![vec![Some("x".to_string()), None]]);
    }
}
