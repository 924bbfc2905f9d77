//! Integration tests for the broker RPC routes.
//!
//! Tests drive the Axum `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. Nodes live in an in-process `LocalNetwork`.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use lifegrid_broker::{BrokerStatus, Coordinator, Phase, build_router};
use lifegrid_node::{Connector, LocalNetwork};
use lifegrid_types::{
    BrokerOp, Cell, ControlResponse, Grid, Params, RegisterRequest, RegisterResponse,
    RunGolRequest, RunGolResponse, RunOutcome,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower::ServiceExt;

fn post<T: Serialize>(op: BrokerOp, body: &T) -> Request<Body> {
    Request::post(op.path())
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

fn empty(op: BrokerOp) -> Request<Body> {
    post(op, &serde_json::json!({}))
}

async fn body_to<T: DeserializeOwned>(body: Body) -> T {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn setup() -> (LocalNetwork, Arc<Coordinator>) {
    let network = LocalNetwork::default();
    let coordinator = Coordinator::new(Connector::Local(network.clone()));
    (network, coordinator)
}

fn block_request(turns: u64) -> RunGolRequest {
    let block = [Cell::new(3, 3), Cell::new(4, 3), Cell::new(3, 4), Cell::new(4, 4)];
    RunGolRequest {
        world: Grid::from_live_cells(8, 8, &block).unwrap(),
        params: Params {
            turns,
            threads: 2,
            image_width: 8,
            image_height: 8,
        },
        turn: 0,
    }
}

#[tokio::test]
async fn test_register_assigns_ids() {
    let (network, coordinator) = setup();
    let _a = network.add_node("a");
    let _b = network.add_node("b");

    for (address, expected) in [("a", 0), ("b", 1)] {
        let req = RegisterRequest {
            address: address.to_owned(),
        };
        let response = build_router(Arc::clone(&coordinator))
            .oneshot(post(BrokerOp::Register, &req))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let reply: RegisterResponse = body_to(response.into_body()).await;
        assert_eq!(reply.node_id.index(), expected);
        assert_eq!(reply.message, "Registered Successfully");
    }
    assert_eq!(coordinator.node_count().await, 2);
}

#[tokio::test]
async fn test_register_unknown_local_node_fails() {
    let (_network, coordinator) = setup();
    let req = RegisterRequest {
        address: "nowhere".to_owned(),
    };

    let response = build_router(coordinator)
        .oneshot(post(BrokerOp::Register, &req))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_run_gol_without_nodes() {
    let (_network, coordinator) = setup();

    let response = build_router(coordinator)
        .oneshot(post(BrokerOp::RunGol, &block_request(4)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json: Value = body_to(response.into_body()).await;
    assert_eq!(json["status"], 503);
}

#[tokio::test]
async fn test_run_gol_rejects_mismatched_grid() {
    let (network, coordinator) = setup();
    let _a = network.add_node("a");
    coordinator.register("a".to_owned()).await.unwrap();

    let mut req = block_request(4);
    req.params.image_height = 9;
    let response = build_router(coordinator)
        .oneshot(post(BrokerOp::RunGol, &req))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_run_gol_block_still_life() {
    let (network, coordinator) = setup();
    let _a = network.add_node("a");
    coordinator.register("a".to_owned()).await.unwrap();

    let response = build_router(Arc::clone(&coordinator))
        .oneshot(post(BrokerOp::RunGol, &block_request(4)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let result: RunGolResponse = body_to(response.into_body()).await;
    assert_eq!(result.outcome, RunOutcome::Completed);
    assert_eq!(result.turn, 4);
    assert_eq!(result.alive_cells.len(), 4);
    assert_eq!(result.world, block_request(4).world);

    let response = build_router(coordinator)
        .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status: BrokerStatus = body_to(response.into_body()).await;
    assert_eq!(status.phase, Phase::Finished);
    assert_eq!(status.turn, 4);
    assert_eq!(status.nodes, 1);
    assert!(!status.resume);
    assert!(status.started_at.is_some());
}

#[tokio::test]
async fn test_run_gol_accepts_a_megacell_grid() {
    let (network, coordinator) = setup();
    let _a = network.add_node("a");
    coordinator.register("a".to_owned()).await.unwrap();

    let block = [Cell::new(10, 10), Cell::new(11, 10), Cell::new(10, 11), Cell::new(11, 11)];
    let req = RunGolRequest {
        world: Grid::from_live_cells(1024, 1024, &block).unwrap(),
        params: Params {
            turns: 1,
            threads: 8,
            image_width: 1024,
            image_height: 1024,
        },
        turn: 0,
    };
    let request = post(BrokerOp::RunGol, &req);

    let response = build_router(coordinator).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let result: RunGolResponse = body_to(response.into_body()).await;
    assert_eq!(result.turn, 1);
    assert_eq!(result.world, req.world);
}

#[tokio::test]
async fn test_pause_messages() {
    let (_network, coordinator) = setup();

    let response = build_router(Arc::clone(&coordinator))
        .oneshot(empty(BrokerOp::PauseGame))
        .await
        .unwrap();
    let paused: ControlResponse = body_to(response.into_body()).await;
    assert!(paused.paused);
    assert_eq!(paused.message, "Current Turn: 0");

    let response = build_router(coordinator)
        .oneshot(empty(BrokerOp::PauseGame))
        .await
        .unwrap();
    let resumed: ControlResponse = body_to(response.into_body()).await;
    assert!(!resumed.paused);
    assert_eq!(resumed.message, "Continuing");
}

#[tokio::test]
async fn test_client_quit_without_session() {
    let (_network, coordinator) = setup();

    let response = build_router(coordinator)
        .oneshot(empty(BrokerOp::ClientQuit))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_save_world_and_alive_cells_after_run() {
    let (network, coordinator) = setup();
    let _a = network.add_node("a");
    coordinator.register("a".to_owned()).await.unwrap();
    coordinator.run_gol(block_request(2)).await.unwrap();

    let response = build_router(Arc::clone(&coordinator))
        .oneshot(empty(BrokerOp::SaveWorld))
        .await
        .unwrap();
    let saved: ControlResponse = body_to(response.into_body()).await;
    assert_eq!(saved.turn, 2);
    assert_eq!(saved.world.unwrap().alive_count(), 4);

    let response = build_router(coordinator)
        .oneshot(empty(BrokerOp::ReportAliveCells))
        .await
        .unwrap();
    let json: Value = body_to(response.into_body()).await;
    assert_eq!(json["turn"], 2);
    assert_eq!(json["alive_cells"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_shut_down_without_session_closes_nodes() {
    let (network, coordinator) = setup();
    let node = network.add_node("a");
    coordinator.register("a".to_owned()).await.unwrap();

    let response = build_router(Arc::clone(&coordinator))
        .oneshot(empty(BrokerOp::ShutDownService))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(node.is_closed());
    assert_eq!(coordinator.node_count().await, 0);
}

#[tokio::test]
async fn test_close_broker_trips_shutdown() {
    let (network, coordinator) = setup();
    let node = network.add_node("a");
    coordinator.register("a".to_owned()).await.unwrap();

    let response = build_router(Arc::clone(&coordinator))
        .oneshot(empty(BrokerOp::CloseBroker))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(coordinator.is_closed());
    assert!(node.is_closed());
}
