//! dbsetup CLI - apply in-code schema migrations from the terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{init, migrate, next_number, status};

/// dbsetup - idempotent schema migrations
#[derive(Parser)]
#[command(name = "dbsetup", version, about, long_about = None)]
struct Cli {
    /// Show debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write dbsetup.json in the config directory
    Init {
        /// DuckDB file or PostgreSQL connection string
        #[arg(long)]
        database: Option<String>,
        /// duckdb or postgres
        #[arg(long)]
        dialect: Option<String>,
        /// Table whose presence marks a pre-tracking deployment
        #[arg(long)]
        sentinel_table: Option<String>,
        /// Schema holding the sentinel table
        #[arg(long)]
        sentinel_schema: Option<String>,
    },

    /// Apply all pending migrations
    Migrate {
        /// Database file or connection string (overrides config)
        #[arg(long, env = "DBSETUP_DATABASE")]
        database: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show applied and pending migrations
    Status {
        /// Database file or connection string (overrides config)
        #[arg(long, env = "DBSETUP_DATABASE")]
        database: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the next free version prefix after the recorded migrations
    NextNumber {
        /// Database file or connection string (overrides config)
        #[arg(long, env = "DBSETUP_DATABASE")]
        database: Option<String>,
    },
}

/// Install the tracing subscriber
///
/// `RUST_LOG` wins when set; otherwise `info`, or `debug` with --verbose.
/// `DBSETUP_JSON_LOGS` switches to JSON lines on stderr.
fn setup_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // A second init (e.g. in tests) is harmless
    if std::env::var("DBSETUP_JSON_LOGS").is_ok() {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init {
            database,
            dialect,
            sentinel_table,
            sentinel_schema,
        } => init::run(init::InitOptions {
            database,
            dialect,
            sentinel_table,
            sentinel_schema,
        }),
        Commands::Migrate { database, json } => migrate::run(database.as_deref(), json),
        Commands::Status { database, json } => status::run(database.as_deref(), json),
        Commands::NextNumber { database } => next_number::run(database.as_deref()),
    }
}
