//! Terminal rendering for migration runs and status

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use dbsetup_core::{BootstrapOutcome, MigrationReport};

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Explain what the bootstrap step did, if it did anything worth telling
pub fn bootstrap_notice(outcome: &BootstrapOutcome) {
    match outcome {
        BootstrapOutcome::MarkedInitialSchema => println!(
            "{}",
            "Existing schema detected; marked initial schema as applied".cyan()
        ),
        BootstrapOutcome::Failed { reason } => {
            println!("{} {}", "warning: bootstrap skipped:".yellow(), reason)
        }
        BootstrapOutcome::FreshDatabase | BootstrapOutcome::AlreadyTracked => {}
    }
}

/// Applied keys followed by a one-line summary
pub fn run_summary(report: &MigrationReport) {
    for key in &report.applied {
        println!("  {} {}", "+".green(), key);
    }

    if report.applied.is_empty() {
        success(&format!(
            "Database is up to date ({} migrations already applied)",
            report.already_applied
        ));
    } else {
        success(&format!(
            "Applied {} migration(s), {} already applied",
            report.applied.len(),
            report.already_applied
        ));
    }
}

/// Status table with the migration columns already in place
pub fn migration_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Migration", "Status", "Applied At"]);
    table
}

pub fn status_cell(applied: bool) -> Cell {
    if applied {
        Cell::new("applied").fg(Color::Green)
    } else {
        Cell::new("pending").fg(Color::Yellow)
    }
}
