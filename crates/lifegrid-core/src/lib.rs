//! Computation core of the Lifegrid cluster.
//!
//! Everything here runs inside a single process: the life rule over a
//! toroidal grid, the row partitioner used for both node bands and worker
//! sub-ranges, the blocking worker pool, and the configuration every
//! binary loads at startup.
//!
//! # Modules
//!
//! - [`engine`] -- Neighbour counting, next-state, and live-cell listing
//! - [`partition`] -- Remainder-balanced row ranges
//! - [`pool`] -- Fan-out of one step over `threads` blocking tasks
//! - [`flip`] -- Symmetric difference of live-cell sets
//! - [`config`] -- YAML configuration with environment overrides
//! - [`telemetry`] -- Tracing subscriber setup

pub mod config;
pub mod engine;
pub mod flip;
pub mod partition;
pub mod pool;
pub mod telemetry;

pub use config::{ConfigError, LifegridConfig, LogFormat, LoggingConfig};
pub use flip::flipped_cells;
pub use partition::partition_rows;
pub use pool::{PoolError, WorkerPool};
