//! HTTP client for the broker.

use lifegrid_node::rpc::{self, RpcError};
use lifegrid_types::{
    AliveCellsResponse, BrokerOp, ControlResponse, Empty, RunGolRequest, RunGolResponse,
};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Client for the broker's RPC server.
#[derive(Debug, Clone)]
pub struct BrokerClient {
    http: reqwest::Client,
    address: String,
}

impl BrokerClient {
    /// Client for the broker at `address` (`host:port`).
    pub fn new(http: reqwest::Client, address: impl Into<String>) -> Self {
        Self {
            http,
            address: address.into(),
        }
    }

    /// Address the client dials.
    pub fn address(&self) -> &str {
        &self.address
    }

    async fn call<Req, Resp>(&self, op: BrokerOp, body: &Req) -> Result<Resp, RpcError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        rpc::post(&self.http, &self.address, op.path(), body).await
    }

    /// `RunGol`. Returns when the session completes, quits, or is killed.
    pub async fn run_gol(&self, req: &RunGolRequest) -> Result<RunGolResponse, RpcError> {
        self.call(BrokerOp::RunGol, req).await
    }

    /// `SaveWorld`.
    pub async fn save_world(&self) -> Result<ControlResponse, RpcError> {
        self.call(BrokerOp::SaveWorld, &Empty {}).await
    }

    /// `ClientQuit`.
    pub async fn client_quit(&self) -> Result<ControlResponse, RpcError> {
        self.call(BrokerOp::ClientQuit, &Empty {}).await
    }

    /// `ShutDownService`.
    pub async fn shut_down_service(&self) -> Result<ControlResponse, RpcError> {
        self.call(BrokerOp::ShutDownService, &Empty {}).await
    }

    /// `PauseGame`.
    pub async fn pause_game(&self) -> Result<ControlResponse, RpcError> {
        self.call(BrokerOp::PauseGame, &Empty {}).await
    }

    /// `ReportAliveCells`.
    pub async fn report_alive_cells(&self) -> Result<AliveCellsResponse, RpcError> {
        self.call(BrokerOp::ReportAliveCells, &Empty {}).await
    }

    /// `CloseBroker`.
    pub async fn close_broker(&self) -> Result<(), RpcError> {
        let _: Empty = self.call(BrokerOp::CloseBroker, &Empty {}).await?;
        Ok(())
    }
}
