//! Route handlers for the broker RPC server.
//!
//! # Endpoints
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | `POST` | `/rpc/register` | `Register` |
//! | `POST` | `/rpc/run-gol` | `RunGol` (long-lived) |
//! | `POST` | `/rpc/save-world` | `SaveWorld` |
//! | `POST` | `/rpc/client-quit` | `ClientQuit` |
//! | `POST` | `/rpc/shut-down` | `ShutDownService` |
//! | `POST` | `/rpc/pause` | `PauseGame` |
//! | `POST` | `/rpc/alive-cells` | `ReportAliveCells` |
//! | `POST` | `/rpc/close-broker` | `CloseBroker` |
//! | `GET` | `/api/status` | Broker state summary |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use lifegrid_types::{
    AliveCellsResponse, ControlResponse, Empty, RegisterRequest, RegisterResponse, RunGolRequest,
    RunGolResponse,
};
use tracing::warn;

use crate::coordinator::Coordinator;
use crate::error::CoordinatorError;
use crate::session::BrokerStatus;

fn log_failure(op: &str, err: &CoordinatorError) {
    warn!(op, error = %err, "Broker operation failed");
}

/// `POST /rpc/register`
pub async fn register(
    State(coordinator): State<Arc<Coordinator>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, CoordinatorError> {
    coordinator
        .register(req.address)
        .await
        .map(Json)
        .inspect_err(|e| log_failure("Register", e))
}

/// `POST /rpc/run-gol`
pub async fn run_gol(
    State(coordinator): State<Arc<Coordinator>>,
    Json(req): Json<RunGolRequest>,
) -> Result<Json<RunGolResponse>, CoordinatorError> {
    coordinator
        .run_gol(req)
        .await
        .map(Json)
        .inspect_err(|e| log_failure("RunGol", e))
}

/// `POST /rpc/save-world`
pub async fn save_world(
    State(coordinator): State<Arc<Coordinator>>,
    Json(_): Json<Empty>,
) -> Json<ControlResponse> {
    Json(coordinator.save_world().await)
}

/// `POST /rpc/client-quit`
pub async fn client_quit(
    State(coordinator): State<Arc<Coordinator>>,
    Json(_): Json<Empty>,
) -> Result<Json<ControlResponse>, CoordinatorError> {
    coordinator
        .client_quit()
        .await
        .map(Json)
        .inspect_err(|e| log_failure("ClientQuit", e))
}

/// `POST /rpc/shut-down`
pub async fn shut_down_service(
    State(coordinator): State<Arc<Coordinator>>,
    Json(_): Json<Empty>,
) -> Json<ControlResponse> {
    Json(coordinator.shut_down_service().await)
}

/// `POST /rpc/pause`
pub async fn pause_game(
    State(coordinator): State<Arc<Coordinator>>,
    Json(_): Json<Empty>,
) -> Json<ControlResponse> {
    Json(coordinator.pause_game().await)
}

/// `POST /rpc/alive-cells`
pub async fn report_alive_cells(
    State(coordinator): State<Arc<Coordinator>>,
    Json(_): Json<Empty>,
) -> Json<AliveCellsResponse> {
    Json(coordinator.report_alive_cells().await)
}

/// `POST /rpc/close-broker`
pub async fn close_broker(
    State(coordinator): State<Arc<Coordinator>>,
    Json(_): Json<Empty>,
) -> Json<Empty> {
    coordinator.close_broker().await;
    Json(Empty {})
}

/// `GET /api/status`
pub async fn status(State(coordinator): State<Arc<Coordinator>>) -> Json<BrokerStatus> {
    Json(coordinator.status().await)
}
