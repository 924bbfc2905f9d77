//! Compute node for the Lifegrid cluster.
//!
//! A node holds one horizontal band of the grid, swaps edge rows with its
//! ring neighbours, and steps its band with the local worker pool. The
//! broker drives it through the six [`NodeOp`](lifegrid_types::NodeOp)
//! operations served by [`router::build_router`].
//!
//! # Modules
//!
//! - [`node`] -- Band state and node operations
//! - [`link`] -- Remote/local node handles and the in-process network
//! - [`client`] -- HTTP client for a node; broker registration
//! - [`rpc`] -- JSON-over-HTTP call helper
//! - [`handlers`], [`router`], [`server`] -- RPC server
//! - [`error`] -- Node error type

pub mod client;
pub mod error;
pub mod handlers;
pub mod link;
pub mod node;
pub mod router;
pub mod rpc;
pub mod server;

pub use client::{NodeClient, register_with_broker};
pub use error::NodeError;
pub use link::{Connector, LocalNetwork, NodeLink};
pub use node::{ComputeNode, NodeStatus};
pub use router::build_router;
pub use rpc::RpcError;
pub use server::{ServerError, bind, serve};
