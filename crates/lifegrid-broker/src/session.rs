//! Session state owned by the coordinator.

use chrono::{DateTime, Utc};
use lifegrid_types::{Cell, Grid};
use serde::{Deserialize, Serialize};

/// Where the broker's session is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No session has run yet.
    #[default]
    Idle,
    /// Bands are being handed to the nodes.
    Initialising,
    /// Turns are advancing.
    Running,
    /// Turns are frozen until the next pause toggle.
    Paused,
    /// The client quit; the state is kept for resume.
    Quitting,
    /// The cluster was shut down.
    Killed,
    /// Every requested turn ran.
    Finished,
    /// A node call failed; the state is kept for resume.
    Failed,
}

impl Phase {
    /// Whether a session is in progress.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Initialising | Self::Running | Self::Paused)
    }
}

/// The authoritative state of the current (or last) session.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Grid at `turn`.
    pub world: Grid,
    /// Live cells of `world`.
    pub alive_cells: Vec<Cell>,
    /// Last committed turn.
    pub turn: u64,
    /// Whether turn advancement is frozen.
    pub paused: bool,
    /// Whether the next `RunGol` continues from this state.
    pub resume: bool,
    /// Lifecycle phase.
    pub phase: Phase,
    /// When the current (or last) session started.
    pub started_at: Option<DateTime<Utc>>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            world: Grid::new(0, 0),
            alive_cells: Vec::new(),
            turn: 0,
            paused: false,
            resume: false,
            phase: Phase::Idle,
            started_at: None,
        }
    }
}

/// Broker summary served on `GET /api/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerStatus {
    /// Lifecycle phase.
    pub phase: Phase,
    /// Last committed turn.
    pub turn: u64,
    /// Whether turn advancement is frozen.
    pub paused: bool,
    /// Whether a resume snapshot is held.
    pub resume: bool,
    /// Registered compute nodes.
    pub nodes: usize,
    /// Live cells at `turn`.
    pub alive_cells: usize,
    /// Grid width.
    pub width: usize,
    /// Grid height.
    pub height: usize,
    /// When the current (or last) session started.
    pub started_at: Option<DateTime<Utc>>,
}
