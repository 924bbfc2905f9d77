//! Session driver for the Lifegrid cluster.
//!
//! The driver is the single client of the broker. It starts a session,
//! forwards control keys, polls progress, and hands grids to an image
//! collaborator.
//!
//! # Modules
//!
//! - [`client`] -- Typed client for every broker operation
//! - [`error`] -- Driver and image error types
//! - [`events`] -- Event stream emitted during a session
//! - [`io`] -- Image loader/writer traits with PGM and in-memory adapters
//! - [`keys`] -- Keypress mapping and the stdin key source
//! - [`session`] -- The [`Driver`] orchestrating one session

pub mod client;
pub mod error;
pub mod events;
pub mod io;
pub mod keys;
pub mod session;

pub use client::BrokerClient;
pub use error::{DriverError, ImageError};
pub use events::{Event, EventSink, RunState};
pub use io::{ImageLoader, ImageWriter, MemoryImages, PgmDirectory};
pub use keys::Key;
pub use session::Driver;
