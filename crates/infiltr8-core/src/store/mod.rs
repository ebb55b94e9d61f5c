//! Storage seams for nodes and sessions
//!
//! The engine owns no persistence. It talks to two keyed stores through
//! the [`NodeStore`] and [`SessionStore`] traits; [`memory`] provides the
//! `DashMap`-backed implementations used by the simulation and tests.

pub mod memory;

pub use memory::{InMemoryNodeStore, InMemorySessionStore};

use crate::error::StorageError;
use crate::types::{Node, NodeId, Session, UserId};

/// Keyed storage of network nodes
pub trait NodeStore: Send + Sync {
    /// Get a node by id
    fn get(&self, id: &NodeId) -> Result<Option<Node>, StorageError>;

    /// All stored nodes, in no particular order
    fn list(&self) -> Result<Vec<Node>, StorageError>;

    /// Insert a node unless one with the same id exists
    ///
    /// Never overwrites. Returns `true` if the node was inserted. The
    /// existence check and the insert must be a single atomic step.
    fn insert_if_absent(&self, node: Node) -> Result<bool, StorageError>;

    /// Remove a node
    ///
    /// The engine itself never deletes nodes; this exists for world
    /// maintenance done outside of play.
    fn remove(&self, id: &NodeId) -> Result<Option<Node>, StorageError>;
}

/// Keyed storage of player sessions
pub trait SessionStore: Send + Sync {
    /// Get a copy of a session
    fn get(&self, user: &UserId) -> Result<Option<Session>, StorageError>;

    /// Copies of all sessions
    ///
    /// Each record must be copied whole; a concurrent update may or may
    /// not be visible but is never seen half-applied.
    fn list(&self) -> Result<Vec<Session>, StorageError>;

    /// Insert a session unless one exists for the same user
    ///
    /// Returns the stored session, whether pre-existing or new, and `true`
    /// only for the call that inserted it.
    fn insert_if_absent(&self, session: Session) -> Result<(Session, bool), StorageError>;

    /// Atomically read-modify-write a session
    ///
    /// Updates to the same user are serialized. Returns `None` when the
    /// user has no session.
    fn update<R>(
        &self,
        user: &UserId,
        f: impl FnOnce(&mut Session) -> R,
    ) -> Result<Option<R>, StorageError>;
}
