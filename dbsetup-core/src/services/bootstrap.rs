//! Bootstrap initializer - adopts databases created before migration tracking
//!
//! A deployment whose initial schema was created by hand has the sentinel
//! table but no record of `001_initial_schema`. The initializer writes that
//! record without running the SQL, so the runner skips it.
//!
//! Failures here never abort a run. They are rolled back, logged and
//! reported as `BootstrapOutcome::Failed`; the runner then proceeds and
//! will try the initial schema through the executor.

use serde::Serialize;
use tracing::{debug, error, info};

use crate::domain::result::Result;
use crate::domain::MigrationKey;
use crate::ports::MigrationConnection;
use crate::services::tracking::{ensure_tracking_table, is_recorded, record_applied};

/// Where to look for a pre-existing initial schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapSettings {
    /// Schema holding the sentinel table; `None` uses the dialect default
    pub sentinel_schema: Option<String>,
    /// Table whose presence means the initial schema already exists
    pub sentinel_table: String,
    /// Key recorded for the adopted schema
    pub initial_key: MigrationKey,
}

impl Default for BootstrapSettings {
    fn default() -> Self {
        Self {
            sentinel_schema: None,
            sentinel_table: "users".to_string(),
            initial_key: MigrationKey::initial_schema(),
        }
    }
}

/// What the bootstrap step did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BootstrapOutcome {
    /// No sentinel table; the initial schema will be applied normally
    FreshDatabase,
    /// Sentinel present and the initial key was already recorded
    AlreadyTracked,
    /// Sentinel present; the initial key was recorded without running it
    MarkedInitialSchema,
    /// Bootstrap failed and was rolled back
    Failed { reason: String },
}

impl BootstrapOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, BootstrapOutcome::Failed { .. })
    }
}

/// Mark the initial schema as applied on legacy deployments.
///
/// Never returns an error: see the module docs.
pub fn initialize_tracking<C>(conn: &mut C, settings: &BootstrapSettings) -> BootstrapOutcome
where
    C: MigrationConnection + ?Sized,
{
    match try_initialize(conn, settings) {
        Ok(outcome) => outcome,
        Err(err) => {
            if let Err(rollback_err) = conn.rollback() {
                debug!(error = %rollback_err, "Rollback failed");
            }
            error!(error = %err, "Error initializing migration tracking");
            BootstrapOutcome::Failed {
                reason: err.to_string(),
            }
        }
    }
}

fn try_initialize<C>(conn: &mut C, settings: &BootstrapSettings) -> Result<BootstrapOutcome>
where
    C: MigrationConnection + ?Sized,
{
    let dialect = conn.dialect();
    let schema = settings
        .sentinel_schema
        .as_deref()
        .unwrap_or_else(|| dialect.default_schema());

    if !conn.table_exists(schema, &settings.sentinel_table)? {
        // Close the catalog read before the executor starts its own work
        conn.commit()?;
        debug!(
            schema = %schema,
            table = %settings.sentinel_table,
            "Sentinel table absent, nothing to bootstrap"
        );
        return Ok(BootstrapOutcome::FreshDatabase);
    }

    ensure_tracking_table(conn)?;

    let key = settings.initial_key.to_string();
    if is_recorded(conn, &key)? {
        conn.commit()?;
        debug!(key = %key, "Initial schema already tracked");
        return Ok(BootstrapOutcome::AlreadyTracked);
    }

    record_applied(conn, &key)?;
    conn.commit()?;
    info!(key = %key, "Marked initial schema as already applied for existing deployment");

    Ok(BootstrapOutcome::MarkedInitialSchema)
}
