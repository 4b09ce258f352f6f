//! Shared helpers for `PostgreSQL` integration tests.
//!
//! The tests run only when `MIRRORFLEET_TEST_DATABASE_URL` names a database
//! the current user may create schemas in. Each test gets its own schema.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use mirrorfleet::store::adapters::postgres;
use mirrorfleet::store::ports::Repositories;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Environment variable naming the test database.
pub const DATABASE_URL_VAR: &str = "MIRRORFLEET_TEST_DATABASE_URL";

/// SQL creating the store schema.
pub const CREATE_STORE_SQL: &str =
    include_str!("../../migrations/2026-01-01-000000_create_store/up.sql");

static SCHEMA_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Repositories bound to a freshly migrated schema.
pub struct TestStore {
    pub repositories: Repositories,
}

/// Creates an isolated schema, applies the migrations and connects to it.
///
/// Returns `None` when no test database is configured.
///
/// # Errors
///
/// Returns an error when the schema cannot be created or migrated.
pub fn test_store() -> Result<Option<TestStore>, eyre::Report> {
    let Ok(base_url) = std::env::var(DATABASE_URL_VAR) else {
        return Ok(None);
    };
    let schema = format!(
        "mirrorfleet_test_{}_{}",
        std::process::id(),
        SCHEMA_COUNTER.fetch_add(1, Ordering::Relaxed)
    );
    let mut admin = PgConnection::establish(&base_url)?;
    admin.batch_execute(&format!(
        "DROP SCHEMA IF EXISTS {schema} CASCADE; CREATE SCHEMA {schema};"
    ))?;

    let separator = if base_url.contains('?') { '&' } else { '?' };
    let scoped_url = format!("{base_url}{separator}options=-csearch_path%3D{schema}");
    let mut scoped = PgConnection::establish(&scoped_url)?;
    scoped.batch_execute(CREATE_STORE_SQL)?;

    let pool = postgres::build_pool(&scoped_url, 4)?;
    Ok(Some(TestStore {
        repositories: postgres::repositories(&pool),
    }))
}
