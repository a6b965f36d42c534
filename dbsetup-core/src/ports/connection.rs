//! Connection port - the database handle migrations run against

use crate::domain::result::Result;
use crate::domain::Dialect;

/// Blocking database connection with DB-API style transactions
///
/// The first statement after a `commit` or `rollback` implicitly opens a
/// transaction; nothing is durable until `commit` returns. `rollback` on a
/// connection with no open transaction is a no-op.
///
/// Opening and closing the connection is the caller's business - the
/// migration services only borrow it.
pub trait MigrationConnection {
    /// Dialect used to pick DDL and bind parameter syntax
    fn dialect(&self) -> Dialect;

    /// Execute one statement with string bind parameters, returning the
    /// number of affected rows
    fn execute(&mut self, sql: &str, params: &[&str]) -> Result<usize>;

    /// Execute a batch of statements without parameters (migration bodies)
    fn execute_batch(&mut self, sql: &str) -> Result<()>;

    /// Fetch the first column of the first row as an integer.
    ///
    /// Used for `COUNT(*)` lookups; a query returning no rows yields 0.
    fn query_count(&mut self, sql: &str, params: &[&str]) -> Result<i64>;

    /// Fetch `columns` text columns of every row.
    ///
    /// Non-text columns must be cast in the query.
    fn query_rows(
        &mut self,
        sql: &str,
        params: &[&str],
        columns: usize,
    ) -> Result<Vec<Vec<Option<String>>>>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;

    /// Whether a transaction is open (work since the last commit/rollback)
    fn in_transaction(&self) -> bool;

    /// Whether `schema.table` is present in the schema catalog
    fn table_exists(&mut self, schema: &str, table: &str) -> Result<bool> {
        let dialect = self.dialect();
        let sql = format!(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = {} AND table_name = {}",
            dialect.placeholder(1),
            dialect.placeholder(2),
        );
        Ok(self.query_count(&sql, &[schema, table])? > 0)
    }
}

impl<C: MigrationConnection + ?Sized> MigrationConnection for Box<C> {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn execute(&mut self, sql: &str, params: &[&str]) -> Result<usize> {
        (**self).execute(sql, params)
    }

    fn execute_batch(&mut self, sql: &str) -> Result<()> {
        (**self).execute_batch(sql)
    }

    fn query_count(&mut self, sql: &str, params: &[&str]) -> Result<i64> {
        (**self).query_count(sql, params)
    }

    fn query_rows(
        &mut self,
        sql: &str,
        params: &[&str],
        columns: usize,
    ) -> Result<Vec<Vec<Option<String>>>> {
        (**self).query_rows(sql, params, columns)
    }

    fn commit(&mut self) -> Result<()> {
        (**self).commit()
    }

    fn rollback(&mut self) -> Result<()> {
        (**self).rollback()
    }

    fn in_transaction(&self) -> bool {
        (**self).in_transaction()
    }

    fn table_exists(&mut self, schema: &str, table: &str) -> Result<bool> {
        (**self).table_exists(schema, table)
    }
}
