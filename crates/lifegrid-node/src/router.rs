//! Axum router for the node RPC server.

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{MethodRouter, get, post};
use lifegrid_types::{MAX_RPC_BODY_BYTES, NodeOp};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::node::ComputeNode;

fn route_for(op: NodeOp) -> MethodRouter<Arc<ComputeNode>> {
    match op {
        NodeOp::Initialise => post(handlers::initialise),
        NodeOp::HaloExchange => post(handlers::halo_exchange),
        NodeOp::ProcessTurn => post(handlers::process_turn),
        NodeOp::SendTopRow => post(handlers::top_row),
        NodeOp::SendBottomRow => post(handlers::bottom_row),
        NodeOp::CloseServer => post(handlers::close),
    }
}

/// Build the router serving every [`NodeOp`] plus `GET /api/status`.
///
/// Bodies up to [`MAX_RPC_BODY_BYTES`] are accepted, since `Initialise`
/// carries a whole band.
pub fn build_router(node: Arc<ComputeNode>) -> Router {
    NodeOp::ALL
        .into_iter()
        .fold(Router::new(), |router, op| router.route(op.path(), route_for(op)))
        .route("/api/status", get(handlers::status))
        .layer(DefaultBodyLimit::max(MAX_RPC_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(node)
}
