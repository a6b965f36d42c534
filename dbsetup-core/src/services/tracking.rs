//! Tracking table access - the `schema_migrations` bookkeeping shared by
//! the executor, the bootstrap initializer and the runner.

use chrono::NaiveDateTime;
use tracing::debug;

use crate::domain::result::{Error, Result};
use crate::domain::AppliedMigration;
use crate::ports::MigrationConnection;

pub const TRACKING_TABLE: &str = "schema_migrations";

/// Create the tracking table if needed and commit, so that the table
/// survives a later failure in the same run.
pub fn ensure_tracking_table<C>(conn: &mut C) -> Result<()>
where
    C: MigrationConnection + ?Sized,
{
    let ddl = conn.dialect().tracking_table_ddl();
    conn.execute_batch(ddl)?;
    conn.commit()?;
    debug!(table = TRACKING_TABLE, "Tracking table ready");
    Ok(())
}

/// Whether the tracking table exists in the dialect's default schema.
/// Leaves the catalog read uncommitted.
pub fn tracking_table_exists<C>(conn: &mut C) -> Result<bool>
where
    C: MigrationConnection + ?Sized,
{
    let schema = conn.dialect().default_schema();
    conn.table_exists(schema, TRACKING_TABLE)
}

/// Whether `key` has a row in the tracking table
pub fn is_recorded<C>(conn: &mut C, key: &str) -> Result<bool>
where
    C: MigrationConnection + ?Sized,
{
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE migration_name = {}",
        TRACKING_TABLE,
        conn.dialect().placeholder(1)
    );
    Ok(conn.query_count(&sql, &[key])? > 0)
}

/// Insert a row for `key` with the default timestamp. Not committed.
pub fn record_applied<C>(conn: &mut C, key: &str) -> Result<()>
where
    C: MigrationConnection + ?Sized,
{
    let sql = format!(
        "INSERT INTO {} (migration_name) VALUES ({})",
        TRACKING_TABLE,
        conn.dialect().placeholder(1)
    );
    conn.execute(&sql, &[key])?;
    Ok(())
}

/// All recorded migrations in insertion order
pub fn applied_records<C>(conn: &mut C) -> Result<Vec<AppliedMigration>>
where
    C: MigrationConnection + ?Sized,
{
    let sql = format!(
        "SELECT CAST(id AS VARCHAR), migration_name, CAST(applied_at AS VARCHAR) FROM {} ORDER BY id",
        TRACKING_TABLE
    );
    let rows = conn.query_rows(&sql, &[], 3)?;

    rows.into_iter()
        .map(|row| {
            let mut cols = row.into_iter();
            let id = cols
                .next()
                .flatten()
                .and_then(|v| v.parse::<i64>().ok())
                .ok_or_else(|| Error::database("tracking row without an id"))?;
            let migration_name = cols
                .next()
                .flatten()
                .ok_or_else(|| Error::database(format!("tracking row {} without a name", id)))?;
            let applied_at = cols.next().flatten().and_then(|v| parse_timestamp(&v));
            Ok(AppliedMigration {
                id,
                migration_name,
                applied_at,
            })
        })
        .collect()
}

/// Parse a timestamp rendered as text by DuckDB or PostgreSQL
/// ("2024-01-15 10:30:00" with optional fractional seconds).
fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::duckdb::DuckDbConnection;

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-01-15 10:30:00").is_some());
        assert!(parse_timestamp("2024-01-15 10:30:00.123456").is_some());
        assert!(parse_timestamp("2024-01-15T10:30:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_ensure_tracking_table_is_idempotent() {
        let mut conn = DuckDbConnection::open_in_memory().unwrap();
        ensure_tracking_table(&mut conn).unwrap();
        ensure_tracking_table(&mut conn).unwrap();
        assert!(conn.table_exists("main", TRACKING_TABLE).unwrap());
    }

    #[test]
    fn test_record_and_read_back() {
        let mut conn = DuckDbConnection::open_in_memory().unwrap();
        ensure_tracking_table(&mut conn).unwrap();

        assert!(!is_recorded(&mut conn, "001_initial_schema").unwrap());
        record_applied(&mut conn, "001_initial_schema").unwrap();
        record_applied(&mut conn, "002_add_orders").unwrap();
        conn.commit().unwrap();

        assert!(is_recorded(&mut conn, "001_initial_schema").unwrap());
        let records = applied_records(&mut conn).unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.migration_name.as_str()).collect();
        assert_eq!(names, vec!["001_initial_schema", "002_add_orders"]);
        assert!(records.iter().all(|r| r.applied_at.is_some()));
        assert!(records[0].id < records[1].id);
    }

    #[test]
    fn test_duplicate_record_violates_unique_constraint() {
        let mut conn = DuckDbConnection::open_in_memory().unwrap();
        ensure_tracking_table(&mut conn).unwrap();
        record_applied(&mut conn, "001_initial_schema").unwrap();
        conn.commit().unwrap();

        assert!(record_applied(&mut conn, "001_initial_schema").is_err());
        conn.rollback().unwrap();
    }
}
