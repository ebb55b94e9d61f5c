//! In-memory store implementations
//!
//! Both stores use `DashMap`, whose per-shard locks give the per-key
//! atomicity the engine relies on. Closures passed to
//! [`SessionStore::update`] run while the shard is write-locked, so they
//! must not touch the same session store again.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::trace;

use super::{NodeStore, SessionStore};
use crate::error::StorageError;
use crate::types::{Node, NodeId, Session, UserId};

/// In-memory implementation of [`NodeStore`]
#[derive(Debug, Default)]
pub struct InMemoryNodeStore {
    nodes: DashMap<NodeId, Node>,
}

impl InMemoryNodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl NodeStore for InMemoryNodeStore {
    fn get(&self, id: &NodeId) -> Result<Option<Node>, StorageError> {
        Ok(self.nodes.get(id).map(|entry| entry.value().clone()))
    }

    fn list(&self) -> Result<Vec<Node>, StorageError> {
        Ok(self.nodes.iter().map(|entry| entry.value().clone()).collect())
    }

    fn insert_if_absent(&self, node: Node) -> Result<bool, StorageError> {
        match self.nodes.entry(node.id.clone()) {
            Entry::Occupied(_) => {
                trace!(node = %node.id, "Node already present, insert skipped");
                Ok(false)
            }
            Entry::Vacant(slot) => {
                trace!(node = %node.id, "Inserting node");
                slot.insert(node);
                Ok(true)
            }
        }
    }

    fn remove(&self, id: &NodeId) -> Result<Option<Node>, StorageError> {
        Ok(self.nodes.remove(id).map(|(_, node)| node))
    }
}

/// In-memory implementation of [`SessionStore`]
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<UserId, Session>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, user: &UserId) -> Result<Option<Session>, StorageError> {
        Ok(self.sessions.get(user).map(|entry| entry.value().clone()))
    }

    fn list(&self) -> Result<Vec<Session>, StorageError> {
        Ok(self
            .sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }

    fn insert_if_absent(&self, session: Session) -> Result<(Session, bool), StorageError> {
        match self.sessions.entry(session.user_id.clone()) {
            Entry::Occupied(existing) => Ok((existing.get().clone(), false)),
            Entry::Vacant(slot) => {
                trace!(user = %session.user_id, "Inserting session");
                Ok((slot.insert(session).value().clone(), true))
            }
        }
    }

    fn update<R>(
        &self,
        user: &UserId,
        f: impl FnOnce(&mut Session) -> R,
    ) -> Result<Option<R>, StorageError> {
        Ok(self.sessions.get_mut(user).map(|mut entry| f(entry.value_mut())))
    }
}
