//! Compute node state and the operations the broker drives each turn.
//!
//! A node owns one horizontal band of the grid for the length of a
//! session. Each turn the broker calls [`ComputeNode::halo_exchange`] on
//! every node, then [`ComputeNode::process_turn`] on every node. During the
//! exchange a node pulls the bottom row of its previous ring neighbour and
//! the top row of its next one; during processing it steps its band framed
//! by those two rows.
//!
//! The band is only ever replaced by `initialise` and `process_turn`, and
//! the broker never overlaps the two rounds, so a neighbour pulling an edge
//! row always reads the state from the end of the previous turn.

use std::sync::Arc;

use lifegrid_core::WorkerPool;
use lifegrid_types::{
    Cell, Grid, HaloRow, InitialiseRequest, NodeId, Params, PartialResult, Peer,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, watch};
use tracing::{debug, info};

use crate::error::NodeError;
use crate::link::Connector;

/// Rows pulled from the ring neighbours for the next step.
#[derive(Debug, Clone)]
struct Halo {
    top: Vec<u8>,
    bottom: Vec<u8>,
}

/// Everything a node holds between `Initialise` and the end of a session.
#[derive(Debug)]
struct BandState {
    node: Peer,
    prev: Peer,
    next: Peer,
    node_count: usize,
    start_y: usize,
    params: Params,
    band: Arc<Grid>,
    alive_cells: Vec<Cell>,
    halo: Option<Halo>,
    pool: WorkerPool,
}

impl BandState {
    fn top_row(&self) -> Vec<u8> {
        self.band.row(0).map(<[u8]>::to_vec).unwrap_or_default()
    }

    fn bottom_row(&self) -> Vec<u8> {
        self.band
            .row(self.band.height().saturating_sub(1))
            .map(<[u8]>::to_vec)
            .unwrap_or_default()
    }
}

/// Snapshot of a node's state, served on `GET /api/status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    /// Id assigned by the broker for the current session.
    pub node_id: Option<NodeId>,
    /// Whether `Initialise` has run.
    pub initialised: bool,
    /// Global row of the band's first row.
    pub start_y: usize,
    /// Band height.
    pub rows: usize,
    /// Number of nodes in the ring.
    pub node_count: usize,
    /// Turns configured for the session.
    pub turns: u64,
    /// Whether halo rows are held for the next step.
    pub halo_ready: bool,
    /// Live cells in the band.
    pub alive_cells: usize,
}

/// A compute node.
#[derive(Debug)]
pub struct ComputeNode {
    state: RwLock<Option<BandState>>,
    connector: Connector,
    shutdown: watch::Sender<bool>,
}

impl ComputeNode {
    /// Create an uninitialised node that reaches its peers through `connector`.
    pub fn new(connector: Connector) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            state: RwLock::new(None),
            connector,
            shutdown,
        }
    }

    /// Receiver that flips to `true` once `CloseServer` has been called.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Whether `CloseServer` has been called.
    pub fn is_closed(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Store the node's band and ring position, replacing any earlier session.
    ///
    /// Returns the band with its live cells in global coordinates.
    pub async fn initialise(&self, req: InitialiseRequest) -> Result<PartialResult, NodeError> {
        req.params.validate()?;
        if req.partial_world.height() == 0 {
            return Err(NodeError::InvalidBand("band has no rows".to_owned()));
        }
        if req.partial_world.width() != req.params.image_width {
            return Err(NodeError::InvalidBand(format!(
                "band width {} does not match image width {}",
                req.partial_world.width(),
                req.params.image_width
            )));
        }
        if req.node_count == 0 {
            return Err(NodeError::InvalidBand("ring has no nodes".to_owned()));
        }

        let pool = WorkerPool::new(req.params.threads);
        let band = Arc::new(req.partial_world);
        let rows = 0..band.height();
        let alive_cells = pool.alive_cells(Arc::clone(&band), rows, req.start_y).await?;

        info!(
            node = %req.node.id,
            start_y = req.start_y,
            rows = band.height(),
            prev = %req.prev.id,
            next = %req.next.id,
            node_count = req.node_count,
            "Band initialised"
        );

        let result = PartialResult {
            partial_world: Grid::clone(&band),
            partial_alive_cells: alive_cells.clone(),
        };

        *self.state.write().await = Some(BandState {
            node: req.node,
            prev: req.prev,
            next: req.next,
            node_count: req.node_count,
            start_y: req.start_y,
            params: req.params,
            band,
            alive_cells,
            halo: None,
            pool,
        });

        Ok(result)
    }

    /// Current first row of the band.
    pub async fn top_row(&self) -> Result<HaloRow, NodeError> {
        let guard = self.state.read().await;
        let state = guard.as_ref().ok_or(NodeError::NotInitialised)?;
        Ok(HaloRow {
            row: state.top_row(),
        })
    }

    /// Current last row of the band.
    pub async fn bottom_row(&self) -> Result<HaloRow, NodeError> {
        let guard = self.state.read().await;
        let state = guard.as_ref().ok_or(NodeError::NotInitialised)?;
        Ok(HaloRow {
            row: state.bottom_row(),
        })
    }

    /// Pull the previous neighbour's bottom row and the next neighbour's top row.
    ///
    /// A neighbour that is this node itself is served from the local band.
    /// The state lock is not held while peers are called, so two nodes may
    /// pull from each other at the same time.
    pub async fn halo_exchange(&self) -> Result<(), NodeError> {
        let (node, prev, next, width, own_top, own_bottom) = {
            let guard = self.state.read().await;
            let state = guard.as_ref().ok_or(NodeError::NotInitialised)?;
            (
                state.node.clone(),
                state.prev.clone(),
                state.next.clone(),
                state.band.width(),
                state.top_row(),
                state.bottom_row(),
            )
        };

        let top = if prev.id == node.id {
            own_bottom
        } else {
            self.connector.link(&prev.address)?.bottom_row().await?.row
        };
        let bottom = if next.id == node.id {
            own_top
        } else {
            self.connector.link(&next.address)?.top_row().await?.row
        };

        for (peer, row) in [(&prev, &top), (&next, &bottom)] {
            if row.len() != width {
                return Err(NodeError::BadHaloRow {
                    peer: peer.address.clone(),
                    expected: width,
                    actual: row.len(),
                });
            }
        }

        let mut guard = self.state.write().await;
        let state = guard.as_mut().ok_or(NodeError::NotInitialised)?;
        state.halo = Some(Halo { top, bottom });
        debug!(node = %node.id, "Halo rows received");
        Ok(())
    }

    /// Advance the band by one generation.
    ///
    /// A node alone in the ring steps its band directly, wrapping onto
    /// itself. Otherwise the band is framed by the halo rows from the last
    /// exchange, which are consumed.
    pub async fn process_turn(&self) -> Result<PartialResult, NodeError> {
        let (band, halo, pool, start_y, node_count) = {
            let mut guard = self.state.write().await;
            let state = guard.as_mut().ok_or(NodeError::NotInitialised)?;
            (
                Arc::clone(&state.band),
                state.halo.take(),
                state.pool,
                state.start_y,
                state.node_count,
            )
        };
        let rows = band.height();

        let next = if node_count == 1 {
            pool.next_state(band, 0..rows).await?
        } else {
            let halo = halo.ok_or(NodeError::HaloMissing)?;
            let framed = Arc::new(band.with_halo(&halo.top, &halo.bottom)?);
            pool.next_state(framed, 1..rows.saturating_add(1)).await?
        };

        let next = Arc::new(next);
        let alive_cells = pool.alive_cells(Arc::clone(&next), 0..rows, start_y).await?;
        let result = PartialResult {
            partial_world: Grid::clone(&next),
            partial_alive_cells: alive_cells.clone(),
        };

        let mut guard = self.state.write().await;
        let state = guard.as_mut().ok_or(NodeError::NotInitialised)?;
        state.band = next;
        state.alive_cells = alive_cells;
        Ok(result)
    }

    /// Stop serving. The node's server shuts down after this reply.
    pub fn close(&self) {
        info!("Close requested");
        self.shutdown.send_replace(true);
    }

    /// Current state summary.
    pub async fn status(&self) -> NodeStatus {
        let guard = self.state.read().await;
        guard.as_ref().map_or_else(NodeStatus::default, |state| NodeStatus {
            node_id: Some(state.node.id),
            initialised: true,
            start_y: state.start_y,
            rows: state.band.height(),
            node_count: state.node_count,
            turns: state.params.turns,
            halo_ready: state.halo.is_some(),
            alive_cells: state.alive_cells.len(),
        })
    }
}
