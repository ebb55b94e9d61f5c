//! Core types for the Infiltr8 engine
//!
//! Models a directed graph of network nodes keyed by opaque ids, and the
//! per-player session state that moves across it.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Opaque identifier for a node (rendered like an IP address, never resolved)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Unique identifier for a player, stable for the session's lifetime
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

fn default_display_name() -> String {
    "unknown".to_string()
}

fn default_security_level() -> u32 {
    1
}

/// A reachable system in the network graph
///
/// A node with no neighbors is *public* and can be connected to from
/// anywhere. A node with neighbors is *private* and can only be entered
/// from a node whose own neighbor set lists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(default = "default_display_name", alias = "hostname")]
    pub display_name: String,
    /// Descriptive port listing, never interpreted by the engine
    #[serde(default)]
    pub ports: String,
    /// Filenames present on the node, in listing order
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default, alias = "file_data")]
    pub file_contents: BTreeMap<String, String>,
    /// Outgoing adjacency; not required to be symmetric
    #[serde(default)]
    pub neighbors: BTreeSet<NodeId>,
    #[serde(default = "default_security_level")]
    pub security_level: u32,
}

impl Node {
    /// Start building a node with the given id and display name
    pub fn builder(id: impl Into<NodeId>, display_name: impl Into<String>) -> NodeBuilder {
        NodeBuilder::new(id, display_name)
    }

    pub fn is_public(&self) -> bool {
        self.neighbors.is_empty()
    }

    pub fn has_neighbor(&self, id: &NodeId) -> bool {
        self.neighbors.contains(id)
    }

    pub fn has_file(&self, filename: &str) -> bool {
        self.files.iter().any(|f| f == filename)
    }

    /// Content of a file present on this node
    ///
    /// A listed file without recorded content reads as empty.
    pub fn file_content(&self, filename: &str) -> Option<&str> {
        if !self.has_file(filename) {
            return None;
        }
        Some(self.file_contents.get(filename).map(String::as_str).unwrap_or(""))
    }

    pub fn summary(&self) -> NodeSummary {
        NodeSummary {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

/// Builder for [`Node`]
#[derive(Debug, Clone)]
pub struct NodeBuilder {
    node: Node,
}

impl NodeBuilder {
    pub fn new(id: impl Into<NodeId>, display_name: impl Into<String>) -> Self {
        Self {
            node: Node {
                id: id.into(),
                display_name: display_name.into(),
                ports: String::new(),
                files: Vec::new(),
                file_contents: BTreeMap::new(),
                neighbors: BTreeSet::new(),
                security_level: default_security_level(),
            },
        }
    }

    pub fn ports(mut self, ports: impl Into<String>) -> Self {
        self.node.ports = ports.into();
        self
    }

    /// Add a file and its content; re-adding a name replaces the content
    pub fn with_file(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        let name = name.into();
        if !self.node.files.contains(&name) {
            self.node.files.push(name.clone());
        }
        self.node.file_contents.insert(name, content.into());
        self
    }

    pub fn neighbor(mut self, id: impl Into<NodeId>) -> Self {
        self.node.neighbors.insert(id.into());
        self
    }

    pub fn security_level(mut self, level: u32) -> Self {
        self.node.security_level = level;
        self
    }

    pub fn build(self) -> Node {
        self.node
    }
}

/// The only view of a node that `scan` reveals
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeSummary {
    pub id: NodeId,
    pub display_name: String,
}

impl std::fmt::Display for NodeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:<16} {}", self.id, self.display_name)
    }
}

/// A file copied into a player's inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub filename: String,
    /// Node the file was downloaded from
    #[serde(alias = "from")]
    pub source: NodeId,
    pub content: String,
}

/// Per-player session state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    /// `None` means not connected to any node
    pub current_node: Option<NodeId>,
    /// Downloaded files, in download order, duplicates kept
    pub inventory: Vec<InventoryItem>,
    pub trace_level: u64,
    pub cloaked: bool,
    /// Another player this session impersonates in lookups
    pub spoofed_as: Option<UserId>,
}

impl Session {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            current_node: None,
            inventory: Vec::new(),
            trace_level: 0,
            cloaked: false,
            spoofed_as: None,
        }
    }

    /// Apply a signed trace adjustment, saturating at zero
    pub fn adjust_trace(&mut self, delta: i64) {
        self.trace_level = self.trace_level.saturating_add_signed(delta);
    }

    /// Find the first inventory entry with the given filename
    pub fn inventory_item(&self, filename: &str) -> Option<&InventoryItem> {
        self.inventory.iter().find(|item| item.filename == filename)
    }
}
