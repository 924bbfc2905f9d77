//! Route handlers for the node RPC server.
//!
//! # Endpoints
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | `POST` | `/rpc/initialise` | `Initialise` |
//! | `POST` | `/rpc/halo-exchange` | `HaloExchange` |
//! | `POST` | `/rpc/process-turn` | `ProcessTurn` |
//! | `POST` | `/rpc/top-row` | `SendTopRow` |
//! | `POST` | `/rpc/bottom-row` | `SendBottomRow` |
//! | `POST` | `/rpc/close` | `CloseServer` |
//! | `GET` | `/api/status` | Node state summary |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use lifegrid_types::{Empty, HaloRow, InitialiseRequest, PartialResult};
use tracing::warn;

use crate::error::NodeError;
use crate::node::{ComputeNode, NodeStatus};

fn log_failure(op: &str, err: &NodeError) {
    warn!(op, error = %err, "Node operation failed");
}

/// `POST /rpc/initialise`
pub async fn initialise(
    State(node): State<Arc<ComputeNode>>,
    Json(req): Json<InitialiseRequest>,
) -> Result<Json<PartialResult>, NodeError> {
    node.initialise(req)
        .await
        .map(Json)
        .inspect_err(|e| log_failure("Initialise", e))
}

/// `POST /rpc/halo-exchange`
pub async fn halo_exchange(
    State(node): State<Arc<ComputeNode>>,
    Json(_): Json<Empty>,
) -> Result<Json<Empty>, NodeError> {
    node.halo_exchange()
        .await
        .map(|()| Json(Empty {}))
        .inspect_err(|e| log_failure("HaloExchange", e))
}

/// `POST /rpc/process-turn`
pub async fn process_turn(
    State(node): State<Arc<ComputeNode>>,
    Json(_): Json<Empty>,
) -> Result<Json<PartialResult>, NodeError> {
    node.process_turn()
        .await
        .map(Json)
        .inspect_err(|e| log_failure("ProcessTurn", e))
}

/// `POST /rpc/top-row`
pub async fn top_row(
    State(node): State<Arc<ComputeNode>>,
    Json(_): Json<Empty>,
) -> Result<Json<HaloRow>, NodeError> {
    node.top_row().await.map(Json)
}

/// `POST /rpc/bottom-row`
pub async fn bottom_row(
    State(node): State<Arc<ComputeNode>>,
    Json(_): Json<Empty>,
) -> Result<Json<HaloRow>, NodeError> {
    node.bottom_row().await.map(Json)
}

/// `POST /rpc/close`
pub async fn close(State(node): State<Arc<ComputeNode>>, Json(_): Json<Empty>) -> Json<Empty> {
    node.close();
    Json(Empty {})
}

/// `GET /api/status`
pub async fn status(State(node): State<Arc<ComputeNode>>) -> Json<NodeStatus> {
    Json(node.status().await)
}
