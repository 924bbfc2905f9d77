//! Shared type definitions for the Lifegrid cluster.
//!
//! This crate is the single source of truth for the data that crosses
//! process boundaries: the cell grid, run parameters, node identities,
//! and the request/response payloads of every remote operation.
//!
//! # Modules
//!
//! - [`grid`] -- Row-major cell grid and live-cell coordinates
//! - [`params`] -- Session parameters and their validation
//! - [`ids`] -- Node ids and ring peers
//! - [`wire`] -- Closed operation enums and RPC payloads

pub mod grid;
pub mod ids;
pub mod params;
pub mod wire;

// Re-export all public types at crate root for convenience.
pub use grid::{Cell, DEAD, Grid, GridError, LIVE};
pub use ids::{NodeId, Peer};
pub use params::{Params, ParamsError};
pub use wire::{
    AliveCellsResponse, BrokerOp, ControlResponse, Empty, ErrorBody, HaloRow, InitialiseRequest,
    MAX_RPC_BODY_BYTES, NodeOp, PartialResult, RegisterRequest, RegisterResponse, RunGolRequest, RunGolResponse,
    RunOutcome,
};
