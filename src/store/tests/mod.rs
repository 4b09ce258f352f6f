//! Unit tests for the coordination store.

mod domain_tests;
