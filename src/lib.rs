//! Mirrorfleet: distributed container image mirroring.
//!
//! A server assigns mirroring tasks to a fleet of agents. Each agent renders
//! a per-task plugin configuration and hands it to the plugin, which pulls,
//! retags and pushes the images and reports the results back.
//!
//! # Architecture
//!
//! Each bounded context follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, tools, HTTP)
//!
//! # Modules
//!
//! - [`store`]: Tasks, agents, registries and images under optimistic
//!   concurrency
//! - [`queue`]: Rate-limited deduplicating work queue
//! - [`exec`]: Bounded-time external command execution
//! - [`pipeline`]: Image sync pipeline run by the plugin
//! - [`delivery`]: Hand-off of rendered plugin configs
//! - [`agent`]: Agent registration, heartbeat, discovery and reconciliation
//! - [`server`]: Task scheduling and agent liveness monitoring
//! - [`config`] and [`telemetry`]: Process settings and logging

pub mod agent;
pub mod clock;
pub mod config;
pub mod delivery;
pub mod exec;
pub mod pipeline;
pub mod queue;
pub mod server;
pub mod store;
pub mod telemetry;
