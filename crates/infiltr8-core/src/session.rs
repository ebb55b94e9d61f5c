//! Session registry
//!
//! One [`Session`] per player, created on first reference and never
//! destroyed while the process lives.

use tracing::info;

use crate::error::{EngineError, EngineResult, StorageError};
use crate::store::{InMemorySessionStore, SessionStore};
use crate::types::{Session, UserId};

/// Owner of all player sessions
#[derive(Debug)]
pub struct SessionRegistry<S: SessionStore = InMemorySessionStore> {
    store: S,
}

impl SessionRegistry<InMemorySessionStore> {
    pub fn in_memory() -> Self {
        Self::new(InMemorySessionStore::new())
    }
}

impl<S: SessionStore> SessionRegistry<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Get the player's session, creating a blank one on first use
    pub fn get_or_create(&self, user: &UserId) -> Result<Session, StorageError> {
        if let Some(existing) = self.store.get(user)? {
            return Ok(existing);
        }
        let (session, inserted) = self.store.insert_if_absent(Session::new(user.clone()))?;
        if inserted {
            info!(user = %user, "Session created");
        }
        Ok(session)
    }

    /// Get a copy of the player's session
    pub fn get(&self, user: &UserId) -> Result<Option<Session>, StorageError> {
        self.store.get(user)
    }

    /// Get a copy of the player's session or fail with `UserNotFound`
    pub fn require(&self, user: &UserId) -> EngineResult<Session> {
        self.store
            .get(user)?
            .ok_or_else(|| EngineError::UserNotFound(user.clone()))
    }

    pub fn exists(&self, user: &UserId) -> Result<bool, StorageError> {
        Ok(self.store.get(user)?.is_some())
    }

    /// Atomically read-modify-write the player's session
    ///
    /// Fails with `UserNotFound` if the player has no session.
    pub fn mutate<R>(&self, user: &UserId, f: impl FnOnce(&mut Session) -> R) -> EngineResult<R> {
        self.store
            .update(user, f)?
            .ok_or_else(|| EngineError::UserNotFound(user.clone()))
    }

    /// Copies of all sessions, sorted by user id
    pub fn snapshot(&self) -> Result<Vec<Session>, StorageError> {
        let mut sessions = self.store.list()?;
        sessions.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(sessions)
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl Default for SessionRegistry<InMemorySessionStore> {
    fn default() -> Self {
        Self::in_memory()
    }
}
