//! Status command - show applied and pending migrations

use anyhow::Result;
use colored::Colorize;
use comfy_table::Cell;
use serde_json::json;

use super::get_context;
use crate::output;

pub fn run(database: Option<&str>, json: bool) -> Result<()> {
    let mut ctx = get_context(database)?;
    let applied = ctx.applied()?;
    let pending = ctx.pending()?;

    if json {
        let value = json!({
            "dialect": ctx.config.dialect,
            "applied": applied,
            "pending": pending,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{} ({})", "Migration Status".bold(), ctx.config.dialect);
    println!();

    let mut table = output::migration_table();

    for record in &applied {
        let applied_at = record
            .applied_at
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(&record.migration_name),
            output::status_cell(true),
            Cell::new(applied_at),
        ]);
    }
    for key in &pending {
        table.add_row(vec![
            Cell::new(key.to_string()),
            output::status_cell(false),
            Cell::new(""),
        ]);
    }

    println!("{}", table);
    println!();
    println!(
        "Summary: {} applied, {} pending",
        applied.len().to_string().green(),
        pending.len().to_string().yellow(),
    );

    Ok(())
}
