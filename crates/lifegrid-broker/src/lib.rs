//! Broker for the Lifegrid cluster.
//!
//! The broker is the single source of truth for a running session. It
//! keeps the registry of compute nodes, splits the grid into one band per
//! node, drives every turn (halo round, then process round, then
//! aggregation), and answers the control plane: pause, save, quit, and
//! shutdown.
//!
//! # Architecture
//!
//! All operations go through one [`Coordinator`]. `RunGol` runs the
//! session loop on a task of its own and waits for it, so a caller that
//! disconnects cannot cancel a session half-way; control-plane calls reach
//! it through a command queue that the loop drains between turns. Nodes
//! are reached through [`NodeLink`](lifegrid_node::NodeLink)s, so the same
//! coordinator drives remote nodes over HTTP or an in-process ring.
//!
//! # Modules
//!
//! - [`coordinator`] -- Session lifecycle and control plane
//! - [`runner`] -- Per-turn protocol against the ring
//! - [`registry`] -- Ordered node registry
//! - [`session`] -- Session state and phases
//! - [`control`] -- Control commands and queue draining
//! - [`handlers`], [`router`], [`server`] -- RPC server
//! - [`error`] -- Broker error type

pub mod control;
pub mod coordinator;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod router;
pub mod runner;
pub mod server;
pub mod session;

pub use coordinator::Coordinator;
pub use error::CoordinatorError;
pub use router::build_router;
pub use server::{ServerError, bind, serve};
pub use session::{BrokerStatus, Phase};
