//! Store adapters: in-memory and `PostgreSQL`.

pub mod memory;
pub mod postgres;
