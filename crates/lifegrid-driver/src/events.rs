//! Events the driver emits while a session runs.

use std::fmt;

use lifegrid_types::Cell;
use serde::Serialize;
use tokio::sync::mpsc;

/// Sending half of the event stream.
pub type EventSink = mpsc::UnboundedSender<Event>;

/// Execution state reported through [`Event::StateChange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Turns are advancing.
    Executing,
    /// The session is frozen.
    Paused,
    /// The session has ended.
    Quitting,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Executing => "Executing",
            Self::Paused => "Paused",
            Self::Quitting => "Quitting",
        })
    }
}

/// One notification on the event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Cells whose state changed since the previous report.
    CellsFlipped {
        /// Turn the change was observed at.
        completed_turns: u64,
        /// Flipped cells.
        cells: Vec<Cell>,
    },
    /// The session reached its last turn.
    TurnComplete {
        /// Last completed turn.
        completed_turns: u64,
    },
    /// Periodic live-cell count.
    AliveCellsCount {
        /// Turn the count belongs to.
        completed_turns: u64,
        /// Number of live cells.
        cells_count: usize,
    },
    /// Execution state changed.
    StateChange {
        /// Turn of the change.
        completed_turns: u64,
        /// The new state.
        new_state: RunState,
    },
    /// A grid image was written.
    ImageOutputComplete {
        /// Turn of the exported grid.
        completed_turns: u64,
        /// Name of the written image.
        filename: String,
    },
    /// The session ended.
    FinalTurnComplete {
        /// Last completed turn.
        completed_turns: u64,
        /// Live cells at that turn.
        alive: Vec<Cell>,
    },
}

impl Event {
    /// Turn the event refers to.
    pub const fn completed_turns(&self) -> u64 {
        match self {
            Self::CellsFlipped { completed_turns, .. }
            | Self::TurnComplete { completed_turns }
            | Self::AliveCellsCount { completed_turns, .. }
            | Self::StateChange { completed_turns, .. }
            | Self::ImageOutputComplete { completed_turns, .. }
            | Self::FinalTurnComplete { completed_turns, .. } => *completed_turns,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CellsFlipped { completed_turns, cells } => {
                write!(f, "turn {completed_turns}: {} cells flipped", cells.len())
            }
            Self::TurnComplete { completed_turns } => {
                write!(f, "turn {completed_turns}: complete")
            }
            Self::AliveCellsCount {
                completed_turns,
                cells_count,
            } => write!(f, "turn {completed_turns}: {cells_count} cells alive"),
            Self::StateChange {
                completed_turns,
                new_state,
            } => write!(f, "turn {completed_turns}: {new_state}"),
            Self::ImageOutputComplete {
                completed_turns,
                filename,
            } => write!(f, "turn {completed_turns}: wrote {filename}"),
            Self::FinalTurnComplete {
                completed_turns,
                alive,
            } => write!(f, "turn {completed_turns}: finished with {} cells alive", alive.len()),
        }
    }
}
