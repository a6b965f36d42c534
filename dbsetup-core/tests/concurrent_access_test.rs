//! Concurrent migration runner tests
//!
//! Two runners racing against the same empty database must never record a
//! migration twice. The loser of a race either sees everything applied
//! and skips, or fails with an error for the key it lost on.
//!
//! Run with: cargo test --test concurrent_access_test -- --nocapture

use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

use dbsetup_core::adapters::duckdb::DuckDbConnection;
use dbsetup_core::{Dialect, Error, MigrationConnection, MigrationRegistry, MigrationService};

/// Number of concurrent runners
const RUNNER_COUNT: usize = 2;

fn build_registry() -> MigrationRegistry {
    let mut registry = MigrationRegistry::new(Dialect::DuckDb);
    registry.register("add_sessions", "CREATE TABLE sessions (session_id VARCHAR)");
    registry.register("add_teams", "CREATE TABLE teams (team_id INTEGER)");
    registry.register("add_members", "CREATE TABLE members (team_id INTEGER, user_email VARCHAR)");
    registry
}

/// Test: two runners, each with its own connection to the same database,
/// start at the same time.
#[test]
fn test_concurrent_runners_apply_each_migration_once() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test_concurrent.duckdb");

    // Connections cloned from one handle share the database instance
    let primary = DuckDbConnection::open(&db_path).unwrap();
    let barrier = Arc::new(Barrier::new(RUNNER_COUNT));

    let mut handles = vec![];
    for runner_id in 0..RUNNER_COUNT {
        let mut conn = primary.try_clone().unwrap();
        let barrier = Arc::clone(&barrier);

        let handle = thread::spawn(move || {
            let registry = build_registry();
            barrier.wait();

            let result = MigrationService::new(&registry).run(&mut conn);
            match &result {
                Ok(report) => println!(
                    "Runner {}: applied {:?}, skipped {}",
                    runner_id, report.applied, report.already_applied
                ),
                Err(e) => println!("Runner {}: failed: {}", runner_id, e),
            }
            result.map(|report| report.applied)
        });
        handles.push(handle);
    }

    let results: Vec<Result<Vec<String>, Error>> =
        handles.into_iter().map(|h| h.join().unwrap()).collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert!(successes >= 1, "at least one runner must finish: {:?}", results);

    // A lost race surfaces either while creating/reading the tracking
    // table or while applying a body, always tagged with the key
    for result in &results {
        if let Err(e) = result {
            assert!(
                matches!(
                    e,
                    Error::TrackingTable { .. } | Error::ExecutionFailure { .. }
                ),
                "unexpected error kind for a lost race: {:?}",
                e
            );
            assert!(
                e.migration_key().is_some(),
                "failure should name the migration it lost on: {}",
                e
            );
        }
    }

    // Every migration was applied by exactly one runner
    let mut all_applied: Vec<String> = results
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .flatten()
        .cloned()
        .collect();
    all_applied.sort();
    let before_dedup = all_applied.len();
    all_applied.dedup();
    assert_eq!(before_dedup, all_applied.len(), "a migration was applied twice");

    // A follow-up run sees a complete, duplicate-free tracking table
    let registry = build_registry();
    let mut conn = primary.try_clone().unwrap();
    let report = MigrationService::new(&registry).run(&mut conn).unwrap();
    assert!(report.applied.is_empty());
    assert_eq!(report.already_applied, registry.len());

    let total = conn
        .query_count("SELECT COUNT(*) FROM schema_migrations", &[])
        .unwrap();
    let distinct = conn
        .query_count(
            "SELECT COUNT(DISTINCT migration_name) FROM schema_migrations",
            &[],
        )
        .unwrap();
    assert_eq!(total, registry.len() as i64);
    assert_eq!(distinct, total);
}

/// Test: runners started one after another never fail; the second only skips
#[test]
fn test_sequential_runners_on_separate_connections() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test_sequential.duckdb");
    let primary = DuckDbConnection::open(&db_path).unwrap();

    for expected_applied in [4usize, 0] {
        let mut conn = primary.try_clone().unwrap();
        let handle = thread::spawn(move || {
            let registry = build_registry();
            MigrationService::new(&registry).run(&mut conn)
        });
        let report = handle.join().unwrap().unwrap();
        assert_eq!(report.applied.len(), expected_applied);
    }
}
