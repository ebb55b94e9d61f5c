//! Topology store for the network graph
//!
//! Nodes are kept in a [`NodeStore`] keyed by id, and adjacency is read
//! from each node's own neighbor set. Edges are directed: `A -> B` says
//! nothing about `B -> A`.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::error::StorageError;
use crate::store::{InMemoryNodeStore, NodeStore};
use crate::types::{Node, NodeId};

/// The network graph
#[derive(Debug)]
pub struct Topology<N: NodeStore = InMemoryNodeStore> {
    store: N,
}

impl Topology<InMemoryNodeStore> {
    /// Create an empty in-memory topology
    pub fn in_memory() -> Self {
        Self::new(InMemoryNodeStore::new())
    }
}

impl<N: NodeStore> Topology<N> {
    pub fn new(store: N) -> Self {
        Self { store }
    }

    /// Get a node by id
    pub fn get_node(&self, id: &NodeId) -> Result<Option<Node>, StorageError> {
        self.store.get(id)
    }

    /// All nodes without neighbors, sorted by id
    pub fn list_public_nodes(&self) -> Result<Vec<Node>, StorageError> {
        let mut public: Vec<Node> = self
            .store
            .list()?
            .into_iter()
            .filter(Node::is_public)
            .collect();
        public.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(public)
    }

    /// Insert a node unless its id is already taken
    ///
    /// Returns `true` if the node is new.
    pub fn insert_node_if_absent(&self, node: Node) -> Result<bool, StorageError> {
        let id = node.id.clone();
        let inserted = self.store.insert_if_absent(node)?;
        if inserted {
            info!(node = %id, "Node added to topology");
        } else {
            debug!(node = %id, "Node already in topology");
        }
        Ok(inserted)
    }

    /// Outgoing neighbors of a node, or `None` if the node is unknown
    pub fn neighbors_of(&self, id: &NodeId) -> Result<Option<BTreeSet<NodeId>>, StorageError> {
        Ok(self.store.get(id)?.map(|node| node.neighbors))
    }

    /// Number of nodes
    pub fn node_count(&self) -> Result<usize, StorageError> {
        Ok(self.store.list()?.len())
    }

    /// Direct access to the backing store
    pub fn store(&self) -> &N {
        &self.store
    }

    /// Render a simple ASCII view of the graph
    pub fn visualize(&self) -> Result<String, StorageError> {
        let mut nodes = self.store.list()?;
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        let edge_count: usize = nodes.iter().map(|n| n.neighbors.len()).sum();
        let mut output = String::new();
        output.push_str("Network Topology:\n");
        output.push_str(&format!("  Nodes: {}\n", nodes.len()));
        output.push_str(&format!("  Edges: {}\n\n", edge_count));

        for node in &nodes {
            let kind = if node.is_public() { "public" } else { "private" };
            let neighbor_str: Vec<String> = node.neighbors.iter().map(|n| n.to_string()).collect();
            output.push_str(&format!(
                "  {} ({}, {}) -> [{}]\n",
                node.id,
                node.display_name,
                kind,
                neighbor_str.join(", ")
            ));
        }
        Ok(output)
    }
}

impl Default for Topology<InMemoryNodeStore> {
    fn default() -> Self {
        Self::in_memory()
    }
}
