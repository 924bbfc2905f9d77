//! Per-turn protocol against the ring of compute nodes.
//!
//! [`SessionLoop`] holds the ring captured at session start and the
//! working copy of the grid. It knows nothing about control commands:
//! the coordinator decides when to call [`SessionLoop::run_turn`] and
//! when to stop.

use futures::future::try_join_all;
use lifegrid_core::partition_rows;
use lifegrid_types::{Cell, Grid, InitialiseRequest, NodeOp, Params, PartialResult, Peer};
use tracing::{debug, info, warn};

use crate::error::CoordinatorError;
use crate::registry::RegistryEntry;

/// The ring and the grid of one running session.
#[derive(Debug)]
pub struct SessionLoop {
    ring: Vec<RegistryEntry>,
    params: Params,
    world: Grid,
    alive_cells: Vec<Cell>,
    turn: u64,
}

impl SessionLoop {
    /// Session over `ring` starting from `world` at `turn`.
    pub const fn new(ring: Vec<RegistryEntry>, params: Params, world: Grid, turn: u64) -> Self {
        Self {
            ring,
            params,
            world,
            alive_cells: Vec::new(),
            turn,
        }
    }

    /// Last committed turn.
    pub const fn turn(&self) -> u64 {
        self.turn
    }

    /// Grid at the last committed turn.
    pub const fn world(&self) -> &Grid {
        &self.world
    }

    /// Live cells at the last committed turn.
    pub fn alive_cells(&self) -> &[Cell] {
        &self.alive_cells
    }

    /// Whether every requested turn has run.
    pub const fn finished(&self) -> bool {
        self.turn >= self.params.turns
    }

    /// Split the grid into bands and hand one to each node.
    pub async fn initialise(&mut self) -> Result<(), CoordinatorError> {
        let count = self.ring.len();
        let bands = partition_rows(self.world.height(), count);
        let peers: Vec<Peer> = self.ring.iter().map(RegistryEntry::peer).collect();

        let mut requests = Vec::with_capacity(count);
        for (entry, rows) in self.ring.iter().zip(bands) {
            let prev = peers.get(entry.id.prev(count).index());
            let next = peers.get(entry.id.next(count).index());
            let (Some(prev), Some(next)) = (prev, next) else {
                continue;
            };
            requests.push(InitialiseRequest {
                partial_world: self.world.rows(rows.clone())?,
                params: self.params,
                start_y: rows.start,
                node: entry.peer(),
                prev: prev.clone(),
                next: next.clone(),
                node_count: count,
            });
        }

        let calls = self.ring.iter().zip(&requests).map(|(entry, req)| async move {
            entry
                .link
                .initialise(req)
                .await
                .map_err(|e| CoordinatorError::node(&entry.address, NodeOp::Initialise, e))
        });
        let results = try_join_all(calls).await?;
        self.commit(&results)?;

        info!(nodes = count, turn = self.turn, "Nodes initialised");
        Ok(())
    }

    /// Run one turn: halo round, then process round, then aggregate.
    ///
    /// On error nothing is committed and the previous turn stays current.
    pub async fn run_turn(&mut self) -> Result<(), CoordinatorError> {
        if self.ring.len() > 1 {
            for entry in &self.ring {
                entry
                    .link
                    .halo_exchange()
                    .await
                    .map_err(|e| CoordinatorError::node(&entry.address, NodeOp::HaloExchange, e))?;
            }
        }

        let calls = self.ring.iter().map(|entry| async move {
            entry
                .link
                .process_turn()
                .await
                .map_err(|e| CoordinatorError::node(&entry.address, NodeOp::ProcessTurn, e))
        });
        let results = try_join_all(calls).await?;
        self.commit(&results)?;
        self.turn = self.turn.saturating_add(1);

        debug!(turn = self.turn, alive = self.alive_cells.len(), "Turn complete");
        Ok(())
    }

    fn commit(&mut self, results: &[PartialResult]) -> Result<(), CoordinatorError> {
        let world = Grid::stack(self.world.width(), results.iter().map(|r| &r.partial_world))?;
        if world.height() != self.world.height() {
            return Err(CoordinatorError::GridShape {
                width: self.world.width(),
                height: self.world.height(),
                actual_width: world.width(),
                actual_height: world.height(),
            });
        }
        self.world = world;
        self.alive_cells = results
            .iter()
            .flat_map(|r| r.partial_alive_cells.iter().copied())
            .collect();
        Ok(())
    }
}

/// Tell every node to shut down. Failures are logged and skipped.
pub async fn close_nodes(entries: &[RegistryEntry]) {
    for entry in entries {
        match entry.link.close().await {
            Ok(()) => debug!(node = %entry.id, address = entry.address, "Node closed"),
            Err(e) => warn!(node = %entry.id, address = entry.address, error = %e, "Node close failed"),
        }
    }
}
