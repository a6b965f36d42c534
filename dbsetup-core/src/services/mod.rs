//! Service layer - migration tracking and application
//!
//! The registry and the runner are the public surface; the executor and
//! bootstrap initializer are exposed for callers that drive single
//! migrations themselves.

pub mod bootstrap;
pub mod executor;
pub mod migration;
mod registry;
pub mod tracking;

pub use bootstrap::{initialize_tracking, BootstrapOutcome, BootstrapSettings};
pub use executor::execute_migration;
pub use migration::{add_migration, MigrationReport, MigrationService};
pub use registry::MigrationRegistry;
