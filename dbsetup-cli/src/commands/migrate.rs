//! Migrate command - apply pending migrations

use anyhow::{Context, Result};

use super::get_context;
use crate::output;

pub fn run(database: Option<&str>, json: bool) -> Result<()> {
    let mut ctx = get_context(database)?;
    let report = ctx.run_migrations().context("Migration run failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    output::bootstrap_notice(&report.bootstrap);
    output::run_summary(&report);

    Ok(())
}
