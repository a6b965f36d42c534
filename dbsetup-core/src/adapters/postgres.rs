//! PostgreSQL connection adapter (feature `postgres`)

use postgres::types::ToSql;
use postgres::{Client, NoTls};

use crate::domain::result::{Error, Result};
use crate::domain::Dialect;
use crate::ports::MigrationConnection;

/// Blocking PostgreSQL connection
///
/// The `postgres` client autocommits; like the DuckDB adapter this one
/// issues `BEGIN` before the first statement after a commit or rollback.
pub struct PostgresConnection {
    client: Client,
    in_transaction: bool,
}

fn to_sql_params<'a>(params: &'a [&'a str]) -> Vec<&'a (dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

impl PostgresConnection {
    /// Connect with a libpq-style connection string or URL
    pub fn connect(params: &str) -> Result<Self> {
        let client = Client::connect(params, NoTls)?;
        Ok(Self::from_client(client))
    }

    /// Wrap an already connected client
    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            in_transaction: false,
        }
    }

    fn begin_if_needed(&mut self) -> Result<()> {
        if !self.in_transaction {
            self.client.batch_execute("BEGIN")?;
            self.in_transaction = true;
        }
        Ok(())
    }
}

impl MigrationConnection for PostgresConnection {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn execute(&mut self, sql: &str, params: &[&str]) -> Result<usize> {
        self.begin_if_needed()?;
        let affected = self.client.execute(sql, &to_sql_params(params))?;
        Ok(affected as usize)
    }

    fn execute_batch(&mut self, sql: &str) -> Result<()> {
        self.begin_if_needed()?;
        self.client.batch_execute(sql)?;
        Ok(())
    }

    fn query_count(&mut self, sql: &str, params: &[&str]) -> Result<i64> {
        self.begin_if_needed()?;
        let rows = self.client.query(sql, &to_sql_params(params))?;
        match rows.first() {
            Some(row) => Ok(row.try_get::<_, i64>(0)?),
            None => Ok(0),
        }
    }

    fn query_rows(
        &mut self,
        sql: &str,
        params: &[&str],
        columns: usize,
    ) -> Result<Vec<Vec<Option<String>>>> {
        self.begin_if_needed()?;
        let rows = self.client.query(sql, &to_sql_params(params))?;
        rows.iter()
            .map(|row| {
                (0..columns)
                    .map(|i| row.try_get::<_, Option<String>>(i).map_err(Error::from))
                    .collect::<Result<Vec<_>>>()
            })
            .collect()
    }

    fn commit(&mut self) -> Result<()> {
        if self.in_transaction {
            // COMMIT ends the transaction even when it fails
            self.in_transaction = false;
            self.client.batch_execute("COMMIT")?;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        if self.in_transaction {
            self.in_transaction = false;
            self.client.batch_execute("ROLLBACK")?;
        }
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.in_transaction
    }
}
