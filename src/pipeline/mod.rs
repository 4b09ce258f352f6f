//! Image sync pipeline executed by the plugin.
//!
//! The plugin logs in to the target registry once, then pulls, retags and
//! pushes every image concurrently, and reports per-image and per-task
//! outcomes. Tools sit behind ports in [`ports`] so tests can replace them.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
