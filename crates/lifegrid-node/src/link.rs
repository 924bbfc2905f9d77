//! How nodes and the broker reach a compute node.
//!
//! A [`NodeLink`] is either an HTTP client for a node in another process
//! or a direct handle to a node in this process. Both expose the same
//! operations, so the broker's session loop and a node's halo exchange
//! are written once. Enum dispatch is used because the operations are
//! `async`.
//!
//! A [`LocalNetwork`] is an in-process address book: nodes added to it
//! resolve each other by address without any sockets, which lets a whole
//! cluster run inside one test.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, Weak};

use lifegrid_types::{HaloRow, InitialiseRequest, PartialResult};

use crate::client::NodeClient;
use crate::error::NodeError;
use crate::node::ComputeNode;

/// Handle on one compute node.
#[derive(Debug, Clone)]
pub enum NodeLink {
    /// Node in another process, reached over HTTP.
    Remote(NodeClient),
    /// Node in this process.
    Local(Arc<ComputeNode>),
}

impl NodeLink {
    /// `Initialise`.
    pub async fn initialise(&self, req: &InitialiseRequest) -> Result<PartialResult, NodeError> {
        match self {
            Self::Remote(client) => Ok(client.initialise(req).await?),
            Self::Local(node) => node.initialise(req.clone()).await,
        }
    }

    /// `HaloExchange`.
    pub async fn halo_exchange(&self) -> Result<(), NodeError> {
        match self {
            Self::Remote(client) => Ok(client.halo_exchange().await?),
            Self::Local(node) => node.halo_exchange().await,
        }
    }

    /// `ProcessTurn`.
    pub async fn process_turn(&self) -> Result<PartialResult, NodeError> {
        match self {
            Self::Remote(client) => Ok(client.process_turn().await?),
            Self::Local(node) => node.process_turn().await,
        }
    }

    /// `SendTopRow`.
    pub async fn top_row(&self) -> Result<HaloRow, NodeError> {
        match self {
            Self::Remote(client) => Ok(client.top_row().await?),
            Self::Local(node) => node.top_row().await,
        }
    }

    /// `SendBottomRow`.
    pub async fn bottom_row(&self) -> Result<HaloRow, NodeError> {
        match self {
            Self::Remote(client) => Ok(client.bottom_row().await?),
            Self::Local(node) => node.bottom_row().await,
        }
    }

    /// `CloseServer`.
    pub async fn close(&self) -> Result<(), NodeError> {
        match self {
            Self::Remote(client) => Ok(client.close().await?),
            Self::Local(node) => {
                node.close();
                Ok(())
            }
        }
    }

    /// Human-readable transport name for logging.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Remote(_) => "http",
            Self::Local(_) => "local",
        }
    }
}

/// In-process address book of compute nodes.
#[derive(Debug, Clone, Default)]
pub struct LocalNetwork {
    nodes: Arc<RwLock<HashMap<String, Weak<ComputeNode>>>>,
}

impl LocalNetwork {
    /// Create a node reachable at `address` within this network.
    pub fn add_node(&self, address: impl Into<String>) -> Arc<ComputeNode> {
        let node = Arc::new(ComputeNode::new(Connector::Local(self.clone())));
        self.nodes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(address.into(), Arc::downgrade(&node));
        node
    }

    /// The live node at `address`, if any.
    pub fn resolve(&self, address: &str) -> Option<Arc<ComputeNode>> {
        self.nodes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(address)
            .and_then(Weak::upgrade)
    }
}

/// How a component turns a peer address into a [`NodeLink`].
#[derive(Debug, Clone)]
pub enum Connector {
    /// Dial peers over HTTP.
    Http(reqwest::Client),
    /// Look peers up in an in-process network.
    Local(LocalNetwork),
}

impl Connector {
    /// Link to the node at `address`.
    pub fn link(&self, address: &str) -> Result<NodeLink, NodeError> {
        match self {
            Self::Http(http) => Ok(NodeLink::Remote(NodeClient::new(http.clone(), address))),
            Self::Local(network) => network
                .resolve(address)
                .map(NodeLink::Local)
                .ok_or_else(|| NodeError::UnknownPeer(address.to_owned())),
        }
    }
}
