//! Hand-off of rendered plugin configs to their execution target.

pub mod adapters;
pub mod ports;
