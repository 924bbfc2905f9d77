//! Local worker pool: one generation step split across blocking tasks.
//!
//! A node splits its row range into `threads` sub-ranges with the same
//! remainder rule as the band split, runs each sub-range on the blocking
//! thread pool against a shared read-only snapshot, and joins the results
//! in sub-range order. Workers never touch each other's output.

use std::ops::Range;
use std::sync::Arc;

use futures::future::try_join_all;
use lifegrid_types::{Cell, Grid, GridError};
use tokio::task::{JoinError, spawn_blocking};
use tracing::debug;

use crate::engine;
use crate::partition::{offset_ranges, partition_rows};

/// Errors from a pool step.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// A worker task panicked or was cancelled.
    #[error("worker task failed: {0}")]
    Join(#[from] JoinError),

    /// Worker outputs could not be reassembled.
    #[error("worker output could not be joined: {0}")]
    Grid(#[from] GridError),
}

/// Fixed-width fan-out over the blocking thread pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPool {
    threads: usize,
}

impl WorkerPool {
    /// Create a pool that splits work `threads` ways. Zero is treated as one.
    pub fn new(threads: usize) -> Self {
        Self {
            threads: threads.max(1),
        }
    }

    /// Number of sub-ranges each step is split into.
    pub const fn threads(&self) -> usize {
        self.threads
    }

    fn sub_ranges(&self, rows: &Range<usize>) -> Vec<Range<usize>> {
        offset_ranges(partition_rows(rows.len(), self.threads), rows.start)
            .into_iter()
            .filter(|r| !r.is_empty())
            .collect()
    }

    /// Next generation of `rows` of `snapshot`, as a grid of `rows.len()` rows.
    pub async fn next_state(&self, snapshot: Arc<Grid>, rows: Range<usize>) -> Result<Grid, PoolError> {
        let width = snapshot.width();
        let ranges = self.sub_ranges(&rows);
        debug!(rows = rows.len(), workers = ranges.len(), "Step fanned out");
        let tasks = ranges.into_iter().map(|range| {
            let snapshot = Arc::clone(&snapshot);
            spawn_blocking(move || engine::next_state(&snapshot, range))
        });
        let parts = try_join_all(tasks).await?;
        Ok(Grid::stack(width, &parts)?)
    }

    /// Live cells in `rows` of `snapshot`, row-major, with `y` shifted by `y_offset`.
    pub async fn alive_cells(
        &self,
        snapshot: Arc<Grid>,
        rows: Range<usize>,
        y_offset: usize,
    ) -> Result<Vec<Cell>, PoolError> {
        let tasks = self.sub_ranges(&rows).into_iter().map(|range| {
            let snapshot = Arc::clone(&snapshot);
            spawn_blocking(move || engine::alive_cells(&snapshot, range, y_offset))
        });
        let parts = try_join_all(tasks).await?;
        Ok(parts.into_iter().flatten().collect())
    }
}
