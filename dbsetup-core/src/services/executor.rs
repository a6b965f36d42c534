//! Migration executor - applies one migration exactly once

use tracing::{debug, error, info};

use crate::domain::result::{Error, Result};
use crate::ports::MigrationConnection;
use crate::services::tracking::{ensure_tracking_table, is_recorded, record_applied};

/// Apply `sql` under `key` unless the tracking table already records it.
///
/// Returns `Ok(true)` when the migration was applied and `Ok(false)` when
/// it was skipped as already applied. The SQL body and the tracking row
/// commit together; the tracking table itself is created and committed
/// first, on its own.
///
/// On any failure the open transaction is rolled back, the error is
/// logged with the key and returned. Under concurrent runners the unique
/// constraint on `migration_name` makes the losing insert fail here.
pub fn execute_migration<C>(conn: &mut C, sql: &str, key: &str) -> Result<bool>
where
    C: MigrationConnection + ?Sized,
{
    match apply_if_missing(conn, sql, key) {
        Ok(applied) => Ok(applied),
        Err(err) => {
            if let Err(rollback_err) = conn.rollback() {
                debug!(key = %key, error = %rollback_err, "Rollback failed");
            }
            error!(key = %key, error = %err, "Error applying migration");
            Err(err)
        }
    }
}

fn apply_if_missing<C>(conn: &mut C, sql: &str, key: &str) -> Result<bool>
where
    C: MigrationConnection + ?Sized,
{
    ensure_tracking_table(conn).map_err(|e| Error::tracking_table(key, e))?;

    if is_recorded(conn, key).map_err(|e| Error::tracking_table(key, e))? {
        conn.commit().map_err(|e| Error::tracking_table(key, e))?;
        info!(key = %key, "Migration already applied, skipping");
        return Ok(false);
    }

    info!(key = %key, "Applying migration");
    conn.execute_batch(sql).map_err(|e| Error::execution(key, e))?;
    record_applied(conn, key).map_err(|e| Error::execution(key, e))?;
    conn.commit().map_err(|e| Error::execution(key, e))?;
    info!(key = %key, "Migration applied successfully");

    Ok(true)
}
