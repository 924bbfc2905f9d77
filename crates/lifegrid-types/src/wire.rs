//! Remote operation catalogue and request/response payloads.
//!
//! Every remote call in the cluster is a variant of [`NodeOp`] (served by
//! compute nodes) or [`BrokerOp`] (served by the broker). Servers mount
//! one route per variant and clients address calls by variant, so the set
//! of operations is closed at compile time.
//!
//! # Node operations
//!
//! | Op | Request | Response |
//! |----|---------|----------|
//! | [`NodeOp::Initialise`] | [`InitialiseRequest`] | [`PartialResult`] |
//! | [`NodeOp::HaloExchange`] | [`Empty`] | [`Empty`] |
//! | [`NodeOp::ProcessTurn`] | [`Empty`] | [`PartialResult`] |
//! | [`NodeOp::SendTopRow`] | [`Empty`] | [`HaloRow`] |
//! | [`NodeOp::SendBottomRow`] | [`Empty`] | [`HaloRow`] |
//! | [`NodeOp::CloseServer`] | [`Empty`] | [`Empty`] |
//!
//! # Broker operations
//!
//! | Op | Request | Response |
//! |----|---------|----------|
//! | [`BrokerOp::Register`] | [`RegisterRequest`] | [`RegisterResponse`] |
//! | [`BrokerOp::RunGol`] | [`RunGolRequest`] | [`RunGolResponse`] |
//! | [`BrokerOp::SaveWorld`] | [`Empty`] | [`ControlResponse`] |
//! | [`BrokerOp::ClientQuit`] | [`Empty`] | [`ControlResponse`] |
//! | [`BrokerOp::ShutDownService`] | [`Empty`] | [`ControlResponse`] |
//! | [`BrokerOp::PauseGame`] | [`Empty`] | [`ControlResponse`] |
//! | [`BrokerOp::ReportAliveCells`] | [`Empty`] | [`AliveCellsResponse`] |
//! | [`BrokerOp::CloseBroker`] | [`Empty`] | [`Empty`] |

use serde::{Deserialize, Serialize};

use crate::grid::{Cell, Grid};
use crate::ids::{NodeId, Peer};
use crate::params::Params;

/// Largest request body an RPC server accepts.
///
/// Grids travel as JSON byte arrays of up to four bytes per cell (`255,`),
/// so this admits an all-live 8192x8192 grid with room to spare.
pub const MAX_RPC_BODY_BYTES: usize = 512 * 1024 * 1024;

/// Operations served by a compute node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeOp {
    /// Hand the node its band and ring position for a new session.
    Initialise,
    /// Pull halo rows from both ring neighbours.
    HaloExchange,
    /// Advance the node's band by one generation.
    ProcessTurn,
    /// Return the node's current top row.
    SendTopRow,
    /// Return the node's current bottom row.
    SendBottomRow,
    /// Stop the node's server.
    CloseServer,
}

impl NodeOp {
    /// Every node operation.
    pub const ALL: [Self; 6] = [
        Self::Initialise,
        Self::HaloExchange,
        Self::ProcessTurn,
        Self::SendTopRow,
        Self::SendBottomRow,
        Self::CloseServer,
    ];

    /// Route path the operation is served on.
    pub const fn path(self) -> &'static str {
        match self {
            Self::Initialise => "/rpc/initialise",
            Self::HaloExchange => "/rpc/halo-exchange",
            Self::ProcessTurn => "/rpc/process-turn",
            Self::SendTopRow => "/rpc/top-row",
            Self::SendBottomRow => "/rpc/bottom-row",
            Self::CloseServer => "/rpc/close",
        }
    }

    /// Operation name for logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Initialise => "Initialise",
            Self::HaloExchange => "HaloExchange",
            Self::ProcessTurn => "ProcessTurn",
            Self::SendTopRow => "SendTopRow",
            Self::SendBottomRow => "SendBottomRow",
            Self::CloseServer => "CloseServer",
        }
    }
}

/// Operations served by the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BrokerOp {
    /// Add a compute node to the registry.
    Register,
    /// Run a session to completion, quit, or kill.
    RunGol,
    /// Read the current grid, turn, and alive cells.
    SaveWorld,
    /// Stop the active session, keeping a resume snapshot.
    ClientQuit,
    /// Stop the active session and shut every node down.
    ShutDownService,
    /// Toggle the paused flag.
    PauseGame,
    /// Read the current alive cells and turn.
    ReportAliveCells,
    /// Stop the broker's server.
    CloseBroker,
}

impl BrokerOp {
    /// Every broker operation.
    pub const ALL: [Self; 8] = [
        Self::Register,
        Self::RunGol,
        Self::SaveWorld,
        Self::ClientQuit,
        Self::ShutDownService,
        Self::PauseGame,
        Self::ReportAliveCells,
        Self::CloseBroker,
    ];

    /// Route path the operation is served on.
    pub const fn path(self) -> &'static str {
        match self {
            Self::Register => "/rpc/register",
            Self::RunGol => "/rpc/run-gol",
            Self::SaveWorld => "/rpc/save-world",
            Self::ClientQuit => "/rpc/client-quit",
            Self::ShutDownService => "/rpc/shut-down",
            Self::PauseGame => "/rpc/pause",
            Self::ReportAliveCells => "/rpc/alive-cells",
            Self::CloseBroker => "/rpc/close-broker",
        }
    }

    /// Operation name for logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Register => "Register",
            Self::RunGol => "RunGol",
            Self::SaveWorld => "SaveWorld",
            Self::ClientQuit => "ClientQuit",
            Self::ShutDownService => "ShutDownService",
            Self::PauseGame => "PauseGame",
            Self::ReportAliveCells => "ReportAliveCells",
            Self::CloseBroker => "CloseBroker",
        }
    }
}

/// Payload for operations that carry no data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

/// Error body returned by every server on a failed call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub error: String,
    /// HTTP status code.
    pub status: u16,
}

// ---------------------------------------------------------------------------
// Node payloads
// ---------------------------------------------------------------------------

/// Session setup for one compute node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialiseRequest {
    /// The node's band of the grid.
    pub partial_world: Grid,
    /// Session parameters.
    pub params: Params,
    /// Global row index of the band's first row.
    pub start_y: usize,
    /// The node itself: its id and advertised address.
    pub node: Peer,
    /// Previous ring neighbour (owner of the rows above).
    pub prev: Peer,
    /// Next ring neighbour (owner of the rows below).
    pub next: Peer,
    /// Number of nodes in the ring.
    pub node_count: usize,
}

/// A node's band and its live cells in global coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialResult {
    /// The band after the step.
    pub partial_world: Grid,
    /// Live cells of the band, with `y` in global grid rows.
    pub partial_alive_cells: Vec<Cell>,
}

/// One boundary row handed to a ring neighbour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HaloRow {
    /// Row cells.
    pub row: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Broker payloads
// ---------------------------------------------------------------------------

/// Node registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Address the node's RPC server listens on (`host:port`).
    pub address: String,
}

/// Registration acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// Id assigned to the node.
    pub node_id: NodeId,
    /// Human-readable acknowledgement.
    pub message: String,
}

/// Start (or resume) a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunGolRequest {
    /// Initial grid. Ignored when a resume snapshot exists.
    pub world: Grid,
    /// Session parameters.
    pub params: Params,
    /// Turn the initial grid corresponds to.
    pub turn: u64,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// All requested turns ran.
    Completed,
    /// The client quit; a resume snapshot was kept.
    Quit,
    /// The cluster was shut down.
    Killed,
}

/// Final state of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunGolResponse {
    /// Grid at the last committed turn.
    pub world: Grid,
    /// Last committed turn.
    pub turn: u64,
    /// Live cells at the last committed turn.
    pub alive_cells: Vec<Cell>,
    /// How the session ended.
    pub outcome: RunOutcome,
}

impl RunGolResponse {
    /// Whether the session ended with the whole cluster shut down.
    pub fn kill(&self) -> bool {
        self.outcome == RunOutcome::Killed
    }
}

/// Reply to a control-plane call.
///
/// Fields not relevant to a particular call are left empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlResponse {
    /// Current grid, for calls that export it.
    pub world: Option<Grid>,
    /// Current live cells, for calls that export them.
    pub alive_cells: Vec<Cell>,
    /// Current turn.
    pub turn: u64,
    /// Paused flag after the call.
    pub paused: bool,
    /// Human-readable status.
    pub message: String,
}

/// Live-cell poll result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliveCellsResponse {
    /// Current live cells.
    pub alive_cells: Vec<Cell>,
    /// Turn the cells belong to.
    pub turn: u64,
    /// Whether the next `RunGol` continues from this state.
    #[serde(default)]
    pub resume: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn node_paths_are_unique() {
        let paths: HashSet<_> = NodeOp::ALL.iter().map(|op| op.path()).collect();
        assert_eq!(paths.len(), NodeOp::ALL.len());
    }

    #[test]
    fn broker_paths_are_unique() {
        let paths: HashSet<_> = BrokerOp::ALL.iter().map(|op| op.path()).collect();
        assert_eq!(paths.len(), BrokerOp::ALL.len());
    }

    #[test]
    fn empty_is_an_empty_object() {
        assert_eq!(serde_json::to_string(&Empty {}).unwrap(), "{}");
    }

    #[test]
    fn kill_flag_follows_outcome() {
        let mut response = RunGolResponse {
            world: Grid::new(1, 1),
            turn: 3,
            alive_cells: Vec::new(),
            outcome: RunOutcome::Killed,
        };
        assert!(response.kill());
        response.outcome = RunOutcome::Quit;
        assert!(!response.kill());
    }
}
