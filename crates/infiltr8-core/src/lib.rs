//! # Infiltr8 Core
//!
//! Network-traversal and session-state engine for the Infiltr8 text
//! hacking simulation.
//!
//! Players move through a directed graph of simulated hosts, read and
//! download files, trip triggers that reveal more of the network and
//! raise their trace level, and obscure their identity from other
//! players' lookups.
//!
//! ## Core Components
//!
//! - [`Topology`]: the node graph, keyed by [`NodeId`]
//! - [`SessionRegistry`]: per-player state with atomic updates
//! - [`TriggerEngine`]: event rules that unlock nodes and adjust trace
//! - [`AccessController`]: `scan`, `connect`, `pivot` and file actions
//! - [`IdentityResolver`]: `whois`, cloaking and spoofing
//! - [`Engine`]: the facade tying them together
//!
//! ## Outcomes
//!
//! Structural failures (unknown node, not connected, unknown user) are
//! returned as [`EngineError`]. In-world outcomes such as a denied
//! connection or a missing file are successful results that display as
//! game feedback.
//!
//! ## Storage
//!
//! Nodes and sessions live behind the [`NodeStore`] and [`SessionStore`]
//! traits. The in-memory implementations use sharded locks, so commands
//! from different players never wait on each other and one player's
//! commands never interleave.
//!
//! ## Example
//!
//! ```
//! use infiltr8_core::{ConnectOutcome, Engine, EngineConfig, NodeId, UserId, WorldSeed};
//!
//! let engine = Engine::from_seed(EngineConfig::default(), WorldSeed::demo()).unwrap();
//! let player = UserId::from("testuser");
//!
//! let visible = engine.scan(&player).unwrap();
//! assert_eq!(visible.len(), 3);
//!
//! let outcome = engine.connect(&player, &NodeId::from("192.168.0.10")).unwrap();
//! assert!(matches!(outcome, ConnectOutcome::Connected(_)));
//! ```

pub mod access;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod identity;
pub mod session;
pub mod store;
pub mod topology;
pub mod trigger;
pub mod types;
pub mod world;

// Re-export main types
pub use access::{AccessController, ConnectOutcome, DownloadReceipt, PivotOutcome, ReadOutcome};
pub use commands::{Command, CommandHelp, CommandParseError, available_commands};
pub use config::{ConfigError, EngineConfig};
pub use engine::{Engine, SeedSummary, StatusReport, WhoamiReport};
pub use error::{EngineError, EngineResult, StorageError};
pub use identity::{IdentityChange, IdentityResolver, Lookup, LookupSummary};
pub use session::SessionRegistry;
pub use store::{InMemoryNodeStore, InMemorySessionStore, NodeStore, SessionStore};
pub use topology::Topology;
pub use trigger::{EventKind, FireReport, TriggerEngine, TriggerRule};
pub use types::{InventoryItem, Node, NodeBuilder, NodeId, NodeSummary, Session, UserId};
pub use world::{SeedError, WorldSeed};
