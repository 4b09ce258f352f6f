//! `PostgreSQL` integration tests for the store adapters.
//!
//! Tests are organized into modules by functionality:
//! - `helpers`: Schema-per-test setup against `MIRRORFLEET_TEST_DATABASE_URL`
//! - `store_tests`: Version-checked updates, listings, agents and images

mod postgres {
    pub mod helpers;

    mod store_tests;
}
