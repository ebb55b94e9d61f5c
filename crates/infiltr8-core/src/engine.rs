//! The engine facade
//!
//! [`Engine`] owns the topology, the session registry, the trigger rules
//! and the configuration, and exposes one method per player operation.
//! It is `Sync`; share it behind an `Arc` to serve many players at once.
//!
//! ```
//! use infiltr8_core::{Engine, EngineConfig, Node, NodeId, UserId};
//!
//! let engine = Engine::new(EngineConfig::default());
//! engine
//!     .topology()
//!     .insert_node_if_absent(Node::builder("N1", "n1").with_file("a.txt", "hi").build())
//!     .unwrap();
//!
//! let user = UserId::from("U1");
//! engine.connect(&user, &NodeId::from("N1")).unwrap();
//! let read = engine.read_file(&user, "a.txt").unwrap();
//! assert_eq!(read.to_string(), "[N1] a.txt:\nhi");
//! ```

use serde::Serialize;
use tracing::{info, instrument};

use crate::access::{AccessController, ConnectOutcome, DownloadReceipt, PivotOutcome, ReadOutcome};
use crate::commands::{CommandHelp, available_commands};
use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::identity::{IdentityChange, IdentityResolver, Lookup};
use crate::session::SessionRegistry;
use crate::store::{InMemoryNodeStore, InMemorySessionStore, NodeStore, SessionStore};
use crate::topology::Topology;
use crate::trigger::{EventKind, FireReport, TriggerEngine, TriggerRule};
use crate::types::{InventoryItem, NodeId, NodeSummary, Session, UserId};
use crate::world::WorldSeed;

/// Full session state as shown by `status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub user: UserId,
    pub inventory: Vec<InventoryItem>,
    pub connected: Option<NodeId>,
    pub trace_level: u64,
    pub cloaked: bool,
}

impl std::fmt::Display for StatusReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Username: {}", self.user)?;
        match &self.connected {
            Some(node) => writeln!(f, "Connected IP: {}", node)?,
            None => writeln!(f, "Connected IP: Not connected")?,
        }
        writeln!(f, "Trace Level: {}", self.trace_level)?;
        writeln!(f, "Cloaked: {}", if self.cloaked { "Yes" } else { "No" })?;
        if self.inventory.is_empty() {
            write!(f, "Inventory: empty")
        } else {
            write!(f, "Inventory:")?;
            for item in &self.inventory {
                write!(f, "\n  {} (from {})", item.filename, item.source)?;
            }
            Ok(())
        }
    }
}

/// The short self-description shown by `whoami`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WhoamiReport {
    pub user: UserId,
    pub connected: Option<NodeId>,
    pub trace_level: u64,
}

impl std::fmt::Display for WhoamiReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Username: {}", self.user)?;
        match &self.connected {
            Some(node) => writeln!(f, "Connected IP: {}", node)?,
            None => writeln!(f, "Connected IP: Not connected")?,
        }
        write!(f, "Trace Level: {}", self.trace_level)
    }
}

/// Counts from loading a [`WorldSeed`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// Nodes newly inserted (already present ids are skipped)
    pub nodes: usize,
    pub triggers: usize,
    pub users: usize,
}

/// The hacking-simulation engine
pub struct Engine<N: NodeStore = InMemoryNodeStore, S: SessionStore = InMemorySessionStore> {
    config: EngineConfig,
    topology: Topology<N>,
    sessions: SessionRegistry<S>,
    triggers: TriggerEngine,
}

impl Engine<InMemoryNodeStore, InMemorySessionStore> {
    /// An empty world backed by in-memory stores
    pub fn new(config: EngineConfig) -> Self {
        Self::with_stores(
            config,
            InMemoryNodeStore::new(),
            InMemorySessionStore::new(),
            TriggerEngine::new(),
        )
    }

    /// An in-memory world loaded from `seed`
    pub fn from_seed(config: EngineConfig, seed: WorldSeed) -> EngineResult<Self> {
        let mut engine = Self::new(config);
        engine.load_seed(seed)?;
        Ok(engine)
    }

    /// The static help listing
    pub fn available_commands() -> &'static [CommandHelp] {
        available_commands()
    }
}

impl<N: NodeStore, S: SessionStore> Engine<N, S> {
    pub fn with_stores(
        config: EngineConfig,
        nodes: N,
        sessions: S,
        triggers: TriggerEngine,
    ) -> Self {
        Self {
            config,
            topology: Topology::new(nodes),
            sessions: SessionRegistry::new(sessions),
            triggers,
        }
    }

    /// Insert the seed's nodes, register its triggers and create its users
    pub fn load_seed(&mut self, seed: WorldSeed) -> EngineResult<SeedSummary> {
        let mut summary = SeedSummary::default();
        for node in seed.nodes {
            if self.topology.insert_node_if_absent(node)? {
                summary.nodes += 1;
            }
        }
        for rule in seed.triggers {
            self.triggers.register(rule);
            summary.triggers += 1;
        }
        for user in &seed.users {
            self.sessions.get_or_create(user)?;
            summary.users += 1;
        }
        info!(
            nodes = summary.nodes,
            triggers = summary.triggers,
            users = summary.users,
            "World seeded"
        );
        Ok(summary)
    }

    pub fn register_trigger(&mut self, rule: TriggerRule) {
        self.triggers.register(rule);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn topology(&self) -> &Topology<N> {
        &self.topology
    }

    pub fn sessions(&self) -> &SessionRegistry<S> {
        &self.sessions
    }

    pub fn triggers(&self) -> &TriggerEngine {
        &self.triggers
    }

    pub fn access(&self) -> AccessController<'_, N, S> {
        AccessController::new(&self.topology, &self.sessions, &self.triggers)
    }

    pub fn identity(&self) -> IdentityResolver<'_, N, S> {
        IdentityResolver::new(&self.topology, &self.sessions, &self.config)
    }

    #[instrument(skip_all, fields(user = %user))]
    pub fn create_or_get_session(&self, user: &UserId) -> EngineResult<Session> {
        Ok(self.sessions.get_or_create(user)?)
    }

    #[instrument(skip_all, fields(user = %user))]
    pub fn scan(&self, user: &UserId) -> EngineResult<Vec<NodeSummary>> {
        self.access().scan(user)
    }

    #[instrument(skip_all, fields(user = %user, target = %target))]
    pub fn connect(&self, user: &UserId, target: &NodeId) -> EngineResult<ConnectOutcome> {
        self.access().connect(user, target)
    }

    #[instrument(skip_all, fields(user = %user, target = %target))]
    pub fn pivot(&self, user: &UserId, target: &NodeId) -> EngineResult<PivotOutcome> {
        self.access().pivot(user, target)
    }

    #[instrument(skip_all, fields(user = %user))]
    pub fn list_files(&self, user: &UserId) -> EngineResult<Vec<String>> {
        self.access().list_files(user)
    }

    #[instrument(skip_all, fields(user = %user, file = filename))]
    pub fn download(&self, user: &UserId, filename: &str) -> EngineResult<DownloadReceipt> {
        self.access().download(user, filename)
    }

    #[instrument(skip_all, fields(user = %user, file = filename))]
    pub fn read_file(&self, user: &UserId, filename: &str) -> EngineResult<ReadOutcome> {
        self.access().read_file(user, filename)
    }

    #[instrument(skip_all, fields(user = %user))]
    pub fn status_of(&self, user: &UserId) -> EngineResult<StatusReport> {
        let session = self.sessions.require(user)?;
        let connected = self.visible_location(&session)?;
        Ok(StatusReport {
            user: session.user_id,
            inventory: session.inventory,
            connected,
            trace_level: session.trace_level,
            cloaked: session.cloaked,
        })
    }

    #[instrument(skip_all, fields(user = %user))]
    pub fn whoami_of(&self, user: &UserId) -> EngineResult<WhoamiReport> {
        let session = self.sessions.require(user)?;
        let connected = self.visible_location(&session)?;
        Ok(WhoamiReport {
            user: session.user_id,
            connected,
            trace_level: session.trace_level,
        })
    }

    #[instrument(skip_all, fields(target = %target))]
    pub fn whois_of(&self, target: &UserId) -> EngineResult<Lookup> {
        self.identity().resolve_for_lookup(target)
    }

    #[instrument(skip_all, fields(user = %user))]
    pub fn cloak(&self, user: &UserId) -> EngineResult<IdentityChange> {
        self.identity().cloak(user)
    }

    #[instrument(skip_all, fields(user = %user))]
    pub fn uncloak(&self, user: &UserId) -> EngineResult<IdentityChange> {
        self.identity().uncloak(user)
    }

    #[instrument(skip_all, fields(user = %user, target = %target))]
    pub fn spoof(&self, user: &UserId, target: &UserId) -> EngineResult<IdentityChange> {
        self.identity().spoof(user, target)
    }

    #[instrument(skip_all, fields(user = %user))]
    pub fn unspoof(&self, user: &UserId) -> EngineResult<IdentityChange> {
        self.identity().unspoof(user)
    }

    /// Raise an arbitrary event, as a world script would
    #[instrument(skip_all, fields(user = %user, value = value))]
    pub fn fire_event(
        &self,
        kind: impl Into<EventKind>,
        value: &str,
        user: &UserId,
    ) -> EngineResult<FireReport> {
        self.triggers
            .fire(&kind.into(), value, user, &self.topology, &self.sessions)
    }

    fn visible_location(&self, session: &Session) -> EngineResult<Option<NodeId>> {
        Ok(self
            .access()
            .current_node(session)?
            .map(|node| node.id))
    }
}

impl Default for Engine<InMemoryNodeStore, InMemorySessionStore> {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
