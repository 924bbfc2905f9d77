//! Axum router for the broker RPC server.

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{MethodRouter, get, post};
use lifegrid_types::{BrokerOp, MAX_RPC_BODY_BYTES};
use tower_http::trace::TraceLayer;

use crate::coordinator::Coordinator;
use crate::handlers;

fn route_for(op: BrokerOp) -> MethodRouter<Arc<Coordinator>> {
    match op {
        BrokerOp::Register => post(handlers::register),
        BrokerOp::RunGol => post(handlers::run_gol),
        BrokerOp::SaveWorld => post(handlers::save_world),
        BrokerOp::ClientQuit => post(handlers::client_quit),
        BrokerOp::ShutDownService => post(handlers::shut_down_service),
        BrokerOp::PauseGame => post(handlers::pause_game),
        BrokerOp::ReportAliveCells => post(handlers::report_alive_cells),
        BrokerOp::CloseBroker => post(handlers::close_broker),
    }
}

/// Build the router serving every [`BrokerOp`] plus `GET /api/status`.
///
/// Bodies up to [`MAX_RPC_BODY_BYTES`] are accepted, since `RunGol`
/// carries the whole grid.
pub fn build_router(coordinator: Arc<Coordinator>) -> Router {
    BrokerOp::ALL
        .into_iter()
        .fold(Router::new(), |router, op| router.route(op.path(), route_for(op)))
        .route("/api/status", get(handlers::status))
        .layer(DefaultBodyLimit::max(MAX_RPC_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(coordinator)
}
