//! Access control for movement and file actions
//!
//! Decides whether a player may see, enter or read from a node.
//!
//! ## Reachability
//!
//! 1. **Public**: a node with no neighbors accepts `connect` from anywhere,
//!    including from a player who is not connected at all
//! 2. **Private**: a node with neighbors accepts `connect` or `pivot` only
//!    when the player's current node lists it as a neighbor
//! 3. **Directed**: `A -> B` is never read as `B -> A`
//!
//! `pivot` is the stricter form of movement. It requires a current
//! location with a non-empty neighbor set even when the target is public.
//!
//! A current location that no longer exists in the topology is treated
//! as "not connected".
//!
//! Every movement decision runs inside one session update, so two
//! commands from the same player cannot interleave their read of the
//! current location with the write of the new one.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult, StorageError};
use crate::session::SessionRegistry;
use crate::store::{NodeStore, SessionStore};
use crate::topology::Topology;
use crate::trigger::{EventKind, TriggerEngine};
use crate::types::{InventoryItem, Node, NodeId, NodeSummary, Session, UserId};

/// Result of a `connect` request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ConnectOutcome {
    /// Target was public
    Connected(NodeId),
    /// Target was private but listed by the player's current node
    PivotedVia(NodeId),
    /// Target was private and not reachable from where the player stands
    AccessDenied(NodeId),
}

impl ConnectOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::AccessDenied(_))
    }
}

impl std::fmt::Display for ConnectOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connected(id) => write!(f, "Connected to {}", id),
            Self::PivotedVia(id) => write!(
                f,
                "Pivoted to {} via connect (allowed because it's a neighbor)",
                id
            ),
            Self::AccessDenied(id) => write!(
                f,
                "Access to {} denied. You must pivot from an allowed node.",
                id
            ),
        }
    }
}

/// Result of a `pivot` request that did not fail structurally
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PivotOutcome {
    Pivoted(NodeId),
    /// The current node has no neighbors to pivot through
    Unsupported(NodeId),
}

impl std::fmt::Display for PivotOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pivoted(id) => write!(f, "Pivoted to {}.", id),
            Self::Unsupported(id) => write!(f, "{} does not support pivoting.", id),
        }
    }
}

/// Confirmation of a download
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadReceipt {
    pub filename: String,
    pub source: NodeId,
    /// Inventory size after the download
    pub inventory_size: usize,
}

impl std::fmt::Display for DownloadReceipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Downloaded {}", self.filename)
    }
}

/// Result of reading a file (`cat`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ReadOutcome {
    FromNode {
        node: NodeId,
        filename: String,
        content: String,
    },
    FromInventory {
        filename: String,
        content: String,
    },
    /// Neither the current node nor the inventory has the file
    NotFound { filename: String, node: NodeId },
}

impl ReadOutcome {
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::FromNode { content, .. } | Self::FromInventory { content, .. } => Some(content),
            Self::NotFound { .. } => None,
        }
    }
}

impl std::fmt::Display for ReadOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FromNode {
                node,
                filename,
                content,
            } => write!(f, "[{}] {}:\n{}", node, filename, content),
            Self::FromInventory { filename, content } => {
                write!(f, "[inventory] {}:\n{}", filename, content)
            }
            Self::NotFound { filename, node } => write!(
                f,
                "File '{}' not found on {} or in inventory.",
                filename, node
            ),
        }
    }
}

/// Access decisions over a topology, its sessions and triggers
pub struct AccessController<'a, N: NodeStore, S: SessionStore> {
    topology: &'a Topology<N>,
    sessions: &'a SessionRegistry<S>,
    triggers: &'a TriggerEngine,
}

impl<'a, N: NodeStore, S: SessionStore> AccessController<'a, N, S> {
    pub fn new(
        topology: &'a Topology<N>,
        sessions: &'a SessionRegistry<S>,
        triggers: &'a TriggerEngine,
    ) -> Self {
        Self {
            topology,
            sessions,
            triggers,
        }
    }

    /// Resolve the player's current node, treating a dangling id as absent
    pub fn current_node(&self, session: &Session) -> Result<Option<Node>, StorageError> {
        let Some(id) = &session.current_node else {
            return Ok(None);
        };
        let node = self.topology.get_node(id)?;
        if node.is_none() {
            warn!(user = %session.user_id, node = %id, "Current node no longer exists");
        }
        Ok(node)
    }

    /// Nodes visible to the player
    ///
    /// Not connected: every public node. Connected: the current node
    /// followed by each of its neighbors that exists.
    pub fn scan(&self, user: &UserId) -> EngineResult<Vec<NodeSummary>> {
        let session = self.sessions.get_or_create(user)?;

        let Some(current) = self.current_node(&session)? else {
            let public = self.topology.list_public_nodes()?;
            debug!(user = %user, visible = public.len(), "Scan from outside the network");
            return Ok(public.iter().map(Node::summary).collect());
        };

        let mut visible = vec![current.summary()];
        for neighbor in &current.neighbors {
            if let Some(node) = self.topology.get_node(neighbor)? {
                visible.push(node.summary());
            }
        }
        debug!(user = %user, from = %current.id, visible = visible.len(), "Scan");
        Ok(visible)
    }

    /// Move to a public node, or to a private neighbor of the current node
    pub fn connect(&self, user: &UserId, target: &NodeId) -> EngineResult<ConnectOutcome> {
        self.sessions.get_or_create(user)?;

        let target_node = self
            .topology
            .get_node(target)?
            .ok_or_else(|| EngineError::NodeNotFound(target.clone()))?;

        let outcome = self.sessions.mutate(user, |session| -> EngineResult<ConnectOutcome> {
            if target_node.is_public() {
                session.current_node = Some(target.clone());
                return Ok(ConnectOutcome::Connected(target.clone()));
            }

            let reachable = self
                .current_node(session)?
                .is_some_and(|current| current.has_neighbor(target));
            if reachable {
                session.current_node = Some(target.clone());
                Ok(ConnectOutcome::PivotedVia(target.clone()))
            } else {
                Ok(ConnectOutcome::AccessDenied(target.clone()))
            }
        })??;

        match &outcome {
            ConnectOutcome::AccessDenied(_) => {
                warn!(user = %user, target = %target, "Connection to private node denied")
            }
            _ => info!(user = %user, target = %target, "Connected"),
        }
        Ok(outcome)
    }

    /// Move along an edge of the current node
    ///
    /// Checks, in order: connected, current node has neighbors, target is
    /// a neighbor, target exists.
    pub fn pivot(&self, user: &UserId, target: &NodeId) -> EngineResult<PivotOutcome> {
        let outcome = self.sessions.mutate(user, |session| -> EngineResult<PivotOutcome> {
            let current = self
                .current_node(session)?
                .ok_or(EngineError::NotConnected)?;

            if current.neighbors.is_empty() {
                return Ok(PivotOutcome::Unsupported(current.id));
            }
            if !current.has_neighbor(target) {
                return Err(EngineError::Unreachable {
                    target: target.clone(),
                    from: current.id,
                });
            }
            if self.topology.get_node(target)?.is_none() {
                return Err(EngineError::NodeNotFound(target.clone()));
            }

            session.current_node = Some(target.clone());
            Ok(PivotOutcome::Pivoted(target.clone()))
        })??;

        match &outcome {
            PivotOutcome::Pivoted(_) => info!(user = %user, target = %target, "Pivoted"),
            PivotOutcome::Unsupported(from) => {
                debug!(user = %user, from = %from, "Pivot attempted from a leaf node")
            }
        }
        Ok(outcome)
    }

    /// Filenames on the current node, in listing order
    pub fn list_files(&self, user: &UserId) -> EngineResult<Vec<String>> {
        let session = self.sessions.require(user)?;
        let current = self
            .current_node(&session)?
            .ok_or(EngineError::NotConnected)?;
        Ok(current.files)
    }

    /// Copy a file from the current node into the inventory
    ///
    /// Never de-duplicates; downloading twice yields two entries.
    pub fn download(&self, user: &UserId, filename: &str) -> EngineResult<DownloadReceipt> {
        let receipt = self.sessions.mutate(user, |session| -> EngineResult<DownloadReceipt> {
            let current = self
                .current_node(session)?
                .ok_or(EngineError::NotConnected)?;
            let content = current
                .file_content(filename)
                .ok_or_else(|| EngineError::FileNotFound {
                    filename: filename.to_string(),
                    node: current.id.clone(),
                })?
                .to_string();

            session.inventory.push(InventoryItem {
                filename: filename.to_string(),
                source: current.id.clone(),
                content,
            });
            Ok(DownloadReceipt {
                filename: filename.to_string(),
                source: current.id,
                inventory_size: session.inventory.len(),
            })
        })??;

        info!(user = %user, file = filename, source = %receipt.source, "Downloaded file");
        Ok(receipt)
    }

    /// Read a file from the current node, falling back to the inventory
    ///
    /// A hit on the node fires `read` triggers for the filename before the
    /// content is returned. An inventory hit fires nothing.
    pub fn read_file(&self, user: &UserId, filename: &str) -> EngineResult<ReadOutcome> {
        let session = self.sessions.require(user)?;
        let current = self
            .current_node(&session)?
            .ok_or(EngineError::NotConnected)?;

        if let Some(content) = current.file_content(filename) {
            let content = content.to_string();
            let report = self.triggers.fire(
                &EventKind::Read,
                filename,
                user,
                self.topology,
                self.sessions,
            )?;
            debug!(user = %user, file = filename, matched = report.matched, "Read file on node");
            return Ok(ReadOutcome::FromNode {
                node: current.id,
                filename: filename.to_string(),
                content,
            });
        }

        if let Some(item) = session.inventory_item(filename) {
            debug!(user = %user, file = filename, "Read file from inventory");
            return Ok(ReadOutcome::FromInventory {
                filename: filename.to_string(),
                content: item.content.clone(),
            });
        }

        Ok(ReadOutcome::NotFound {
            filename: filename.to_string(),
            node: current.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryNodeStore, InMemorySessionStore};

    struct Fixture {
        topology: Topology,
        sessions: SessionRegistry,
        triggers: TriggerEngine,
    }

    impl Fixture {
        /// gate (public), hub -> {vault, gate}, vault -> {hub}, leaf -> {ghost}
        fn new() -> Self {
            let topology = Topology::in_memory();
            for node in [
                Node::builder("gate", "gateway").with_file("motd", "welcome").build(),
                Node::builder("hub", "hub").neighbor("vault").neighbor("gate").build(),
                Node::builder("vault", "vault")
                    .neighbor("hub")
                    .with_file("secret", "42")
                    .build(),
                Node::builder("leaf", "leaf").neighbor("ghost").build(),
            ] {
                topology.insert_node_if_absent(node).unwrap();
            }
            Self {
                topology,
                sessions: SessionRegistry::in_memory(),
                triggers: TriggerEngine::new(),
            }
        }

        fn access(&self) -> AccessController<'_, InMemoryNodeStore, InMemorySessionStore> {
            AccessController::new(&self.topology, &self.sessions, &self.triggers)
        }

        fn place(&self, user: &UserId, node: &str) {
            self.sessions.get_or_create(user).unwrap();
            self.sessions
                .mutate(user, |s| s.current_node = Some(NodeId::from(node)))
                .unwrap();
        }
    }

    #[test]
    fn test_scan_outside_shows_public_only() {
        let fx = Fixture::new();
        let visible = fx.access().scan(&UserId::from("u")).unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, NodeId::from("gate"));
    }

    #[test]
    fn test_scan_connected_shows_current_and_neighbors() {
        let fx = Fixture::new();
        let user = UserId::from("u");
        fx.place(&user, "hub");

        let ids: Vec<_> = fx
            .access()
            .scan(&user)
            .unwrap()
            .into_iter()
            .map(|s| s.id.to_string())
            .collect();
        assert_eq!(ids, vec!["hub", "gate", "vault"]);
    }

    #[test]
    fn test_scan_skips_missing_neighbors() {
        let fx = Fixture::new();
        let user = UserId::from("u");
        fx.place(&user, "leaf");

        let visible = fx.access().scan(&user).unwrap();
        assert_eq!(visible.len(), 1);
    }

    #[test]
    fn test_connect_unknown_node() {
        let fx = Fixture::new();
        let err = fx
            .access()
            .connect(&UserId::from("u"), &NodeId::from("nowhere"))
            .unwrap_err();
        assert!(matches!(err, EngineError::NodeNotFound(_)));
    }

    #[test]
    fn test_connect_private_denied_from_outside() {
        let fx = Fixture::new();
        let user = UserId::from("u");
        let outcome = fx.access().connect(&user, &NodeId::from("vault")).unwrap();
        assert_eq!(outcome, ConnectOutcome::AccessDenied(NodeId::from("vault")));
        assert_eq!(fx.sessions.get(&user).unwrap().unwrap().current_node, None);
    }

    #[test]
    fn test_connect_private_via_neighbor() {
        let fx = Fixture::new();
        let user = UserId::from("u");
        fx.place(&user, "hub");

        let outcome = fx.access().connect(&user, &NodeId::from("vault")).unwrap();
        assert_eq!(outcome, ConnectOutcome::PivotedVia(NodeId::from("vault")));
        assert!(outcome.to_string().contains("via connect"));
    }

    #[test]
    fn test_connect_is_directional() {
        let fx = Fixture::new();
        let user = UserId::from("u");
        // leaf lists ghost, but hub is not listed by leaf
        fx.place(&user, "leaf");
        let outcome = fx.access().connect(&user, &NodeId::from("hub")).unwrap();
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_pivot_requires_connection() {
        let fx = Fixture::new();
        let user = UserId::from("u");
        fx.sessions.get_or_create(&user).unwrap();

        let err = fx.access().pivot(&user, &NodeId::from("gate")).unwrap_err();
        assert!(matches!(err, EngineError::NotConnected));
    }

    #[test]
    fn test_pivot_from_leaf_unsupported() {
        let fx = Fixture::new();
        let user = UserId::from("u");
        fx.place(&user, "gate");

        let outcome = fx.access().pivot(&user, &NodeId::from("hub")).unwrap();
        assert_eq!(outcome, PivotOutcome::Unsupported(NodeId::from("gate")));
        assert_eq!(outcome.to_string(), "gate does not support pivoting.");
    }

    #[test]
    fn test_pivot_unreachable_before_not_found() {
        let fx = Fixture::new();
        let user = UserId::from("u");
        fx.place(&user, "hub");

        let err = fx.access().pivot(&user, &NodeId::from("nowhere")).unwrap_err();
        assert!(matches!(err, EngineError::Unreachable { .. }));
    }

    #[test]
    fn test_pivot_to_listed_but_missing_node() {
        let fx = Fixture::new();
        let user = UserId::from("u");
        fx.place(&user, "leaf");

        let err = fx.access().pivot(&user, &NodeId::from("ghost")).unwrap_err();
        assert!(matches!(err, EngineError::NodeNotFound(_)));
    }

    #[test]
    fn test_pivot_success() {
        let fx = Fixture::new();
        let user = UserId::from("u");
        fx.place(&user, "hub");

        let outcome = fx.access().pivot(&user, &NodeId::from("vault")).unwrap();
        assert_eq!(outcome, PivotOutcome::Pivoted(NodeId::from("vault")));
        assert_eq!(
            fx.sessions.get(&user).unwrap().unwrap().current_node,
            Some(NodeId::from("vault"))
        );
    }

    #[test]
    fn test_dangling_location_is_not_connected() {
        let fx = Fixture::new();
        let user = UserId::from("u");
        fx.place(&user, "demolished");

        assert!(matches!(
            fx.access().list_files(&user).unwrap_err(),
            EngineError::NotConnected
        ));
        assert!(matches!(
            fx.access().pivot(&user, &NodeId::from("gate")).unwrap_err(),
            EngineError::NotConnected
        ));
        let visible = fx.access().scan(&user).unwrap();
        assert_eq!(visible[0].id, NodeId::from("gate"));
    }

    #[test]
    fn test_download_missing_file() {
        let fx = Fixture::new();
        let user = UserId::from("u");
        fx.place(&user, "gate");

        let err = fx.access().download(&user, "nope").unwrap_err();
        assert!(matches!(err, EngineError::FileNotFound { .. }));
        assert!(fx.sessions.get(&user).unwrap().unwrap().inventory.is_empty());
    }

    #[test]
    fn test_download_does_not_move_or_trace() {
        let fx = Fixture::new();
        let user = UserId::from("u");
        fx.place(&user, "gate");

        let receipt = fx.access().download(&user, "motd").unwrap();
        assert_eq!(receipt.inventory_size, 1);

        let session = fx.sessions.get(&user).unwrap().unwrap();
        assert_eq!(session.current_node, Some(NodeId::from("gate")));
        assert_eq!(session.trace_level, 0);
        assert_eq!(session.inventory[0].source, NodeId::from("gate"));
    }

    #[test]
    fn test_read_falls_back_to_inventory() {
        let fx = Fixture::new();
        let user = UserId::from("u");
        fx.place(&user, "vault");
        fx.access().download(&user, "secret").unwrap();
        fx.place(&user, "gate");

        let outcome = fx.access().read_file(&user, "secret").unwrap();
        assert_eq!(outcome.to_string(), "[inventory] secret:\n42");

        let missing = fx.access().read_file(&user, "nothing").unwrap();
        assert_eq!(
            missing.to_string(),
            "File 'nothing' not found on gate or in inventory."
        );
    }

    #[test]
    fn test_read_requires_connection() {
        let fx = Fixture::new();
        let user = UserId::from("u");
        fx.sessions.get_or_create(&user).unwrap();

        let err = fx.access().read_file(&user, "motd").unwrap_err();
        assert!(matches!(err, EngineError::NotConnected));
    }
}
