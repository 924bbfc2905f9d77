//! Run configuration shared by every participant of a session.

use serde::{Deserialize, Serialize};

/// Reasons a [`Params`] value is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamsError {
    /// Each node needs at least one local worker.
    #[error("threads must be at least 1")]
    ZeroThreads,

    /// The grid must have at least one column.
    #[error("image width must be at least 1")]
    ZeroWidth,

    /// The grid must have at least one row.
    #[error("image height must be at least 1")]
    ZeroHeight,
}

/// Run configuration: turn count, local workers per node, grid dimensions.
///
/// Immutable for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Number of turns to simulate.
    pub turns: u64,
    /// Local worker tasks per compute node.
    pub threads: usize,
    /// Grid width in cells.
    pub image_width: usize,
    /// Grid height in cells.
    pub image_height: usize,
}

impl Params {
    /// Check that the parameters describe a runnable session.
    pub const fn validate(&self) -> Result<(), ParamsError> {
        if self.threads == 0 {
            return Err(ParamsError::ZeroThreads);
        }
        if self.image_width == 0 {
            return Err(ParamsError::ZeroWidth);
        }
        if self.image_height == 0 {
            return Err(ParamsError::ZeroHeight);
        }
        Ok(())
    }
}
