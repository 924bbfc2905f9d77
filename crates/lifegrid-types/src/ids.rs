//! Node identity and ring addressing.
//!
//! Nodes are named by a [`NodeId`] (their index in the broker's registry)
//! so ring topology never depends on transport addresses. A [`Peer`] pairs
//! the id with the address a link should dial.

use serde::{Deserialize, Serialize};

/// Registry index of a compute node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    /// Return the raw registry index.
    pub const fn index(self) -> usize {
        self.0
    }

    /// Previous node on a ring of `count` nodes.
    pub const fn prev(self, count: usize) -> Self {
        if count == 0 {
            return self;
        }
        Self(self.0.wrapping_add(count).wrapping_sub(1) % count)
    }

    /// Next node on a ring of `count` nodes.
    pub const fn next(self, count: usize) -> Self {
        if count == 0 {
            return self;
        }
        Self(self.0.wrapping_add(1) % count)
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// A ring member as seen by another node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    /// The member's registry id.
    pub id: NodeId,
    /// Address the member's RPC server listens on (`host:port`).
    pub address: String,
}
