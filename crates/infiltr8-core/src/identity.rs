//! Identity obfuscation and lookups
//!
//! `whois` does not simply read the named session:
//!
//! 1. If any session is spoofing the looked-up name, that session becomes
//!    the subject (the impersonator's data is shown under the name)
//! 2. Otherwise the session with that name is the subject
//! 3. A cloaked subject is reported exactly like a missing one
//!
//! Cloak and spoof each charge a fixed trace penalty per use.

use serde::Serialize;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::session::SessionRegistry;
use crate::store::{NodeStore, SessionStore};
use crate::topology::Topology;
use crate::types::{NodeId, Session, UserId};

/// What `whois` reveals about a player
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupSummary {
    /// The name that was looked up
    pub name: UserId,
    pub location: Option<NodeId>,
    pub trace_level: u64,
    pub inventory_size: usize,
}

impl std::fmt::Display for LookupSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Username: {}", self.name)?;
        match &self.location {
            Some(node) => writeln!(f, "Connected IP: {}", node)?,
            None => writeln!(f, "Connected IP: Not connected")?,
        }
        writeln!(f, "Trace Level: {}", self.trace_level)?;
        write!(f, "Inventory Size: {}", self.inventory_size)
    }
}

/// Result of a `whois` lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Lookup {
    Found(LookupSummary),
    /// Unknown, or cloaked; the two are indistinguishable
    NotFound(UserId),
}

impl Lookup {
    pub fn summary(&self) -> Option<&LookupSummary> {
        match self {
            Self::Found(summary) => Some(summary),
            Self::NotFound(_) => None,
        }
    }
}

impl std::fmt::Display for Lookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Found(summary) => summary.fmt(f),
            Self::NotFound(name) => write!(f, "User '{}' not found.", name),
        }
    }
}

/// Confirmation of a cloak/spoof state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum IdentityChange {
    Cloaked { user: UserId, penalty: u64 },
    Uncloaked { user: UserId },
    Spoofing { user: UserId, target: UserId },
    Unspoofed { user: UserId },
}

impl std::fmt::Display for IdentityChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cloaked { user, penalty } => write!(
                f,
                "{} is now cloaked. You are now hidden from whois and logs (+{} trace)",
                user, penalty
            ),
            Self::Uncloaked { user } => write!(
                f,
                "{} is now uncloaked. Your presence is visible again.",
                user
            ),
            Self::Spoofing { user, target } => {
                write!(f, "{} is now spoofing as '{}'.", user, target)
            }
            Self::Unspoofed { user } => write!(f, "{} is no longer spoofing.", user),
        }
    }
}

/// Computes externally visible identity and applies obfuscation
pub struct IdentityResolver<'a, N: NodeStore, S: SessionStore> {
    topology: &'a Topology<N>,
    sessions: &'a SessionRegistry<S>,
    config: &'a EngineConfig,
}

impl<'a, N: NodeStore, S: SessionStore> IdentityResolver<'a, N, S> {
    pub fn new(
        topology: &'a Topology<N>,
        sessions: &'a SessionRegistry<S>,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            topology,
            sessions,
            config,
        }
    }

    /// Resolve `target` the way a lookup command sees it
    ///
    /// With several sessions spoofing the same name, the one with the
    /// smallest user id wins.
    pub fn resolve_for_lookup(&self, target: &UserId) -> EngineResult<Lookup> {
        let snapshot = self.sessions.snapshot()?;

        let spoofer = snapshot
            .iter()
            .find(|s| s.spoofed_as.as_ref() == Some(target));
        let subject = match spoofer {
            Some(s) => {
                debug!(target = %target, subject = %s.user_id, "Lookup resolved to spoofer");
                Some(s)
            }
            None => snapshot.iter().find(|s| &s.user_id == target),
        };

        let Some(subject) = subject else {
            return Ok(Lookup::NotFound(target.clone()));
        };
        if subject.cloaked {
            debug!(target = %target, "Lookup hit a cloaked session");
            return Ok(Lookup::NotFound(target.clone()));
        }

        Ok(Lookup::Found(LookupSummary {
            name: target.clone(),
            location: self.visible_location(subject)?,
            trace_level: subject.trace_level,
            inventory_size: subject.inventory.len(),
        }))
    }

    /// Hide the player from lookups, at a trace cost on every call
    pub fn cloak(&self, user: &UserId) -> EngineResult<IdentityChange> {
        let penalty = self.config.cloak_penalty;
        let level = self.sessions.mutate(user, |session| {
            session.cloaked = true;
            session.trace_level = session.trace_level.saturating_add(penalty);
            session.trace_level
        })?;
        info!(user = %user, penalty, trace = level, "Cloaked");
        Ok(IdentityChange::Cloaked {
            user: user.clone(),
            penalty,
        })
    }

    /// Make the player visible again; free, and a no-op if not cloaked
    pub fn uncloak(&self, user: &UserId) -> EngineResult<IdentityChange> {
        let was_cloaked = self
            .sessions
            .mutate(user, |session| std::mem::replace(&mut session.cloaked, false))?;
        if was_cloaked {
            info!(user = %user, "Uncloaked");
        }
        Ok(IdentityChange::Uncloaked { user: user.clone() })
    }

    /// Impersonate `target` in lookups
    ///
    /// The penalty is charged for the attempt: it sticks even when the
    /// target turns out not to exist.
    pub fn spoof(&self, user: &UserId, target: &UserId) -> EngineResult<IdentityChange> {
        let penalty = self.config.spoof_penalty;
        self.sessions.mutate(user, |session| {
            session.trace_level = session.trace_level.saturating_add(penalty);
        })?;

        if !self.sessions.exists(target)? {
            debug!(user = %user, target = %target, penalty, "Spoof target does not exist");
            return Err(EngineError::UserNotFound(target.clone()));
        }

        self.sessions.mutate(user, |session| {
            session.spoofed_as = Some(target.clone());
        })?;
        info!(user = %user, target = %target, penalty, "Spoofing");
        Ok(IdentityChange::Spoofing {
            user: user.clone(),
            target: target.clone(),
        })
    }

    /// Stop impersonating
    pub fn unspoof(&self, user: &UserId) -> EngineResult<IdentityChange> {
        let previous = self
            .sessions
            .mutate(user, |session| session.spoofed_as.take())?;
        match previous {
            Some(target) => {
                info!(user = %user, target = %target, "Stopped spoofing");
                Ok(IdentityChange::Unspoofed { user: user.clone() })
            }
            None => Err(EngineError::NotSpoofing(user.clone())),
        }
    }

    /// The subject's location, or `None` if it points at a missing node
    fn visible_location(&self, session: &Session) -> EngineResult<Option<NodeId>> {
        match &session.current_node {
            Some(id) if self.topology.get_node(id)?.is_some() => Ok(Some(id.clone())),
            _ => Ok(None),
        }
    }
}
