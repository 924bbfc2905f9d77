//! HTTP client for a remote compute node, and node self-registration.

use lifegrid_types::{
    BrokerOp, Empty, HaloRow, InitialiseRequest, NodeOp, PartialResult, RegisterRequest,
    RegisterResponse,
};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::rpc::{self, RpcError};

/// Client for one compute node's RPC server.
#[derive(Debug, Clone)]
pub struct NodeClient {
    http: reqwest::Client,
    address: String,
}

impl NodeClient {
    /// Client for the node at `address` (`host:port`).
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

    async fn call<Req, Resp>(&self, op: NodeOp, body: &Req) -> Result<Resp, RpcError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        rpc::post(&self.http, &self.address, op.path(), body).await
    }

    /// `Initialise`.
    pub async fn initialise(&self, req: &InitialiseRequest) -> Result<PartialResult, RpcError> {
        self.call(NodeOp::Initialise, req).await
    }

    /// `HaloExchange`.
    pub async fn halo_exchange(&self) -> Result<(), RpcError> {
        let _: Empty = self.call(NodeOp::HaloExchange, &Empty {}).await?;
        Ok(())
    }

    /// `ProcessTurn`.
    pub async fn process_turn(&self) -> Result<PartialResult, RpcError> {
        self.call(NodeOp::ProcessTurn, &Empty {}).await
    }

    /// `SendTopRow`.
    pub async fn top_row(&self) -> Result<HaloRow, RpcError> {
        self.call(NodeOp::SendTopRow, &Empty {}).await
    }

    /// `SendBottomRow`.
    pub async fn bottom_row(&self) -> Result<HaloRow, RpcError> {
        self.call(NodeOp::SendBottomRow, &Empty {}).await
    }

    /// `CloseServer`.
    pub async fn close(&self) -> Result<(), RpcError> {
        let _: Empty = self.call(NodeOp::CloseServer, &Empty {}).await?;
        Ok(())
    }
}

/// Register the node advertised at `address` with the broker at `broker_addr`.
pub async fn register_with_broker(
    http: &reqwest::Client,
    broker_addr: &str,
    address: &str,
) -> Result<RegisterResponse, RpcError> {
    let req = RegisterRequest {
        address: address.to_owned(),
    };
    rpc::post(http, broker_addr, BrokerOp::Register.path(), &req).await
}
