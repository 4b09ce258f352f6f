//! Coordination store shared by the server and the agents.
//!
//! Tasks carry an optimistic-lock token, and every mutation is a
//! compare-and-set against the version the caller read. Layout:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
