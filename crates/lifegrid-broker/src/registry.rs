//! Node registry: the ordered ring of compute nodes.
//!
//! A node's [`NodeId`] is its index in the registry, and ring adjacency
//! follows registry order with wrap-around.

use lifegrid_node::NodeLink;
use lifegrid_types::{NodeId, Peer};

/// One registered compute node.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    /// Ring position.
    pub id: NodeId,
    /// Address the node registered with.
    pub address: String,
    /// Handle used to call the node.
    pub link: NodeLink,
}

impl RegistryEntry {
    /// The node as its ring neighbours see it.
    pub fn peer(&self) -> Peer {
        Peer {
            id: self.id,
            address: self.address.clone(),
        }
    }
}

/// Ordered list of registered compute nodes.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    entries: Vec<RegistryEntry>,
}

impl NodeRegistry {
    /// Append a node and return its id.
    pub fn register(&mut self, address: String, link: NodeLink) -> NodeId {
        let id = NodeId(self.entries.len());
        self.entries.push(RegistryEntry { id, address, link });
        id
    }

    /// Registered nodes in ring order.
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no node has registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every node.
    pub fn clear(&mut self) -> Vec<RegistryEntry> {
        std::mem::take(&mut self.entries)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use lifegrid_node::LocalNetwork;

    use super::*;

    #[test]
    fn ids_follow_registration_order() {
        let network = LocalNetwork::default();
        let mut registry = NodeRegistry::default();
        for address in ["a", "b", "c"] {
            let link = NodeLink::Local(network.add_node(address));
            registry.register(address.to_owned(), link);
        }

        let ids: Vec<NodeId> = registry.entries().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![NodeId(0), NodeId(1), NodeId(2)]);
        assert_eq!(registry.entries()[2].peer().address, "c");

        let removed = registry.clear();
        assert_eq!(removed.len(), 3);
        assert!(registry.is_empty());
    }
}
