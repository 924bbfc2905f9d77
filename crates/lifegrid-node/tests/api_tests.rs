//! Integration tests for the node RPC routes.
//!
//! Tests drive the Axum `Router` directly via `tower::ServiceExt` without
//! starting a TCP server.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use lifegrid_node::{ComputeNode, LocalNetwork, NodeStatus, build_router};
use lifegrid_types::{
    Cell, Grid, HaloRow, InitialiseRequest, NodeId, NodeOp, Params, PartialResult, Peer,
};
use serde::Serialize;
use serde_json::Value;
use tower::ServiceExt;

fn post<T: Serialize>(op: NodeOp, body: &T) -> Request<Body> {
    Request::post(op.path())
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

fn empty(op: NodeOp) -> Request<Body> {
    post(op, &serde_json::json!({}))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn solo_request() -> InitialiseRequest {
    let me = Peer {
        id: NodeId(0),
        address: "solo".to_owned(),
    };
    let world =
        Grid::from_live_cells(4, 4, &[Cell::new(1, 1), Cell::new(2, 1), Cell::new(1, 2), Cell::new(2, 2)])
            .unwrap();
    InitialiseRequest {
        partial_world: world,
        params: Params {
            turns: 5,
            threads: 2,
            image_width: 4,
            image_height: 4,
        },
        start_y: 0,
        node: me.clone(),
        prev: me.clone(),
        next: me,
        node_count: 1,
    }
}

fn node() -> Arc<ComputeNode> {
    LocalNetwork::default().add_node("solo")
}

#[tokio::test]
async fn test_rows_before_initialise_conflict() {
    let router = build_router(node());

    let response = router.oneshot(empty(NodeOp::SendTopRow)).await.unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 409);
    assert!(json["error"].as_str().unwrap().contains("not been initialised"));
}

#[tokio::test]
async fn test_initialise_then_process() {
    let node = node();

    let response = build_router(Arc::clone(&node))
        .oneshot(post(NodeOp::Initialise, &solo_request()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let initial: PartialResult = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(initial.partial_alive_cells.len(), 4);

    let response = build_router(Arc::clone(&node))
        .oneshot(empty(NodeOp::ProcessTurn))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let stepped: PartialResult = serde_json::from_slice(&bytes).unwrap();

    // A block is a still life.
    assert_eq!(stepped, initial);
}

#[tokio::test]
async fn test_initialise_accepts_a_megacell_band() {
    let mut req = solo_request();
    req.partial_world = Grid::new(1024, 1024);
    req.params.image_width = 1024;
    req.params.image_height = 1024;

    let response = build_router(node())
        .oneshot(post(NodeOp::Initialise, &req))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let initial: PartialResult = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(initial.partial_world.height(), 1024);
    assert!(initial.partial_alive_cells.is_empty());
}

#[tokio::test]
async fn test_edge_rows() {
    let node = node();
    node.initialise(solo_request()).await.unwrap();

    let response = build_router(Arc::clone(&node))
        .oneshot(empty(NodeOp::SendBottomRow))
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let bottom: HaloRow = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(bottom.row, vec![0, 0, 0, 0]);

    let response = build_router(node).oneshot(empty(NodeOp::SendTopRow)).await.unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let top: HaloRow = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(top.row.len(), 4);
}

#[tokio::test]
async fn test_initialise_rejects_invalid_params() {
    let mut req = solo_request();
    req.params.threads = 0;

    let response = build_router(node())
        .oneshot(post(NodeOp::Initialise, &req))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_status_reports_band() {
    let node = node();
    node.initialise(solo_request()).await.unwrap();

    let response = build_router(node)
        .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let status: NodeStatus = serde_json::from_slice(&bytes).unwrap();
    assert!(status.initialised);
    assert_eq!(status.node_id, Some(NodeId(0)));
    assert_eq!(status.rows, 4);
    assert_eq!(status.alive_cells, 4);
}

#[tokio::test]
async fn test_close_trips_shutdown() {
    let node = node();

    let response = build_router(Arc::clone(&node))
        .oneshot(empty(NodeOp::CloseServer))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(node.is_closed());
}
