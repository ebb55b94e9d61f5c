//! World triggers
//!
//! A [`TriggerRule`] reacts to a named event (reading a file is the only
//! event the engine raises itself) by unlocking a node and adjusting the
//! acting player's trace level.
//!
//! Unlocks are idempotent: a node that already exists is left alone. The
//! trace modifier is not: every firing applies it again, so re-reading a
//! tripwire file costs the player each time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::EngineResult;
use crate::session::SessionRegistry;
use crate::store::{NodeStore, SessionStore};
use crate::topology::Topology;
use crate::types::{Node, NodeId, UserId};

/// Kind of world event a trigger listens for
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    /// A file was read on the player's current node
    Read,
    /// Any event raised by an external world script
    Custom(String),
}

impl From<String> for EventKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "read" | "cat" => Self::Read,
            _ => Self::Custom(s),
        }
    }
}

impl From<&str> for EventKind {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Read => "read".to_string(),
            EventKind::Custom(s) => s,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Custom(s) => f.write_str(s),
        }
    }
}

/// A rule keyed on `(event, value)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRule {
    #[serde(alias = "trigger_type")]
    pub event: EventKind,
    #[serde(alias = "trigger_value")]
    pub value: String,
    /// Node inserted when the rule fires, if not already present
    #[serde(default, alias = "node_data")]
    pub unlock: Option<Node>,
    /// Added to the acting player's trace level on every firing
    #[serde(default)]
    pub trace_modifier: i64,
}

impl TriggerRule {
    pub fn new(event: impl Into<EventKind>, value: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            value: value.into(),
            unlock: None,
            trace_modifier: 0,
        }
    }

    /// Rule fired by reading `filename`
    pub fn on_read(filename: impl Into<String>) -> Self {
        Self::new(EventKind::Read, filename)
    }

    pub fn unlocks(mut self, node: Node) -> Self {
        self.unlock = Some(node);
        self
    }

    pub fn trace(mut self, modifier: i64) -> Self {
        self.trace_modifier = modifier;
        self
    }
}

/// What a single firing did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FireReport {
    /// Number of rules that matched
    pub matched: usize,
    /// Nodes that did not exist before this firing
    pub unlocked: Vec<NodeId>,
    /// Sum of the matched rules' trace modifiers
    pub trace_delta: i64,
}

impl FireReport {
    pub fn is_empty(&self) -> bool {
        self.matched == 0
    }
}

/// Evaluates trigger rules against world events
#[derive(Debug, Default)]
pub struct TriggerEngine {
    rules: BTreeMap<(EventKind, String), Vec<TriggerRule>>,
}

impl TriggerEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule; several rules may share a key
    pub fn register(&mut self, rule: TriggerRule) {
        debug!(event = %rule.event, value = %rule.value, "Registering trigger");
        self.rules
            .entry((rule.event.clone(), rule.value.clone()))
            .or_default()
            .push(rule);
    }

    /// Rules matching an event
    pub fn rules_for(&self, kind: &EventKind, value: &str) -> &[TriggerRule] {
        self.rules
            .get(&(kind.clone(), value.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total number of registered rules
    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Fire all rules matching `(kind, value)` on behalf of `user`
    ///
    /// Each matching unlock node is inserted if absent, then the summed
    /// trace modifier is applied to the player's session once. No match
    /// is a no-op. A player without a session gets no trace change, but
    /// unlocks still happen.
    pub fn fire<N: NodeStore, S: SessionStore>(
        &self,
        kind: &EventKind,
        value: &str,
        user: &UserId,
        topology: &Topology<N>,
        sessions: &SessionRegistry<S>,
    ) -> EngineResult<FireReport> {
        let rules = self.rules_for(kind, value);
        if rules.is_empty() {
            return Ok(FireReport::default());
        }

        let mut report = FireReport {
            matched: rules.len(),
            ..Default::default()
        };

        for rule in rules {
            if let Some(node) = &rule.unlock {
                if topology.insert_node_if_absent(node.clone())? {
                    info!(
                        user = %user,
                        node = %node.id,
                        event = %kind,
                        value,
                        "Trigger unlocked node"
                    );
                    report.unlocked.push(node.id.clone());
                }
            }
            report.trace_delta = report.trace_delta.saturating_add(rule.trace_modifier);
        }

        if report.trace_delta != 0 {
            let delta = report.trace_delta;
            let applied = sessions
                .store()
                .update(user, |session| {
                    session.adjust_trace(delta);
                    session.trace_level
                })?;
            match applied {
                Some(level) => debug!(user = %user, delta, level, "Trigger adjusted trace"),
                None => {
                    debug!(user = %user, delta, "Trigger fired for unknown user, trace untouched")
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Topology, SessionRegistry, UserId) {
        let topology = Topology::in_memory();
        let sessions = SessionRegistry::in_memory();
        let user = UserId::from("neo");
        sessions.get_or_create(&user).unwrap();
        (topology, sessions, user)
    }

    #[test]
    fn test_event_kind_strings() {
        assert_eq!(EventKind::from("read"), EventKind::Read);
        assert_eq!(EventKind::from("cat"), EventKind::Read);
        assert_eq!(EventKind::from("login"), EventKind::Custom("login".into()));
        assert_eq!(String::from(EventKind::Read), "read");
    }

    #[test]
    fn test_no_match_is_noop() {
        let (topology, sessions, user) = setup();
        let engine = TriggerEngine::new();

        let report = engine
            .fire(&EventKind::Read, "nothing.txt", &user, &topology, &sessions)
            .unwrap();
        assert!(report.is_empty());
        assert_eq!(sessions.get(&user).unwrap().unwrap().trace_level, 0);
    }

    #[test]
    fn test_fire_unlocks_and_sums_trace() {
        let (topology, sessions, user) = setup();
        let mut engine = TriggerEngine::new();
        engine.register(
            TriggerRule::on_read("creds.txt")
                .unlocks(Node::builder("10.1.0.1", "vpn").build())
                .trace(2),
        );
        engine.register(TriggerRule::on_read("creds.txt").trace(3));

        let report = engine
            .fire(&EventKind::Read, "creds.txt", &user, &topology, &sessions)
            .unwrap();
        assert_eq!(report.matched, 2);
        assert_eq!(report.unlocked, vec![NodeId::from("10.1.0.1")]);
        assert_eq!(report.trace_delta, 5);
        assert_eq!(sessions.get(&user).unwrap().unwrap().trace_level, 5);
    }

    #[test]
    fn test_extreme_modifiers_saturate() {
        let (topology, sessions, user) = setup();
        let mut engine = TriggerEngine::new();
        engine.register(TriggerRule::on_read("bomb.txt").trace(i64::MAX));
        engine.register(TriggerRule::on_read("bomb.txt").trace(i64::MAX));
        engine.register(TriggerRule::on_read("wipe.txt").trace(i64::MIN));
        engine.register(TriggerRule::on_read("wipe.txt").trace(i64::MIN));

        let report = engine
            .fire(&EventKind::Read, "bomb.txt", &user, &topology, &sessions)
            .unwrap();
        assert_eq!(report.trace_delta, i64::MAX);
        assert_eq!(
            sessions.get(&user).unwrap().unwrap().trace_level,
            i64::MAX as u64
        );

        let report = engine
            .fire(&EventKind::Read, "wipe.txt", &user, &topology, &sessions)
            .unwrap();
        assert_eq!(report.trace_delta, i64::MIN);
        assert_eq!(sessions.get(&user).unwrap().unwrap().trace_level, 0);
    }

    #[test]
    fn test_refire_reapplies_trace_but_not_unlock() {
        let (topology, sessions, user) = setup();
        let mut engine = TriggerEngine::new();
        engine.register(
            TriggerRule::on_read("tripwire")
                .unlocks(Node::builder("10.1.0.2", "honeypot").build())
                .trace(4),
        );

        engine.fire(&EventKind::Read, "tripwire", &user, &topology, &sessions).unwrap();
        let second = engine
            .fire(&EventKind::Read, "tripwire", &user, &topology, &sessions)
            .unwrap();

        assert!(second.unlocked.is_empty());
        assert_eq!(topology.node_count().unwrap(), 1);
        assert_eq!(sessions.get(&user).unwrap().unwrap().trace_level, 8);
    }

    #[test]
    fn test_unlock_does_not_overwrite_existing_node() {
        let (topology, sessions, user) = setup();
        topology
            .insert_node_if_absent(Node::builder("10.1.0.3", "original").build())
            .unwrap();

        let mut engine = TriggerEngine::new();
        engine.register(
            TriggerRule::on_read("f").unlocks(Node::builder("10.1.0.3", "replacement").build()),
        );
        engine.fire(&EventKind::Read, "f", &user, &topology, &sessions).unwrap();

        let node = topology.get_node(&NodeId::from("10.1.0.3")).unwrap().unwrap();
        assert_eq!(node.display_name, "original");
    }

    #[test]
    fn test_custom_events_are_separate() {
        let (topology, sessions, user) = setup();
        let mut engine = TriggerEngine::new();
        engine.register(TriggerRule::new("alarm", "f").trace(9));

        engine.fire(&EventKind::Read, "f", &user, &topology, &sessions).unwrap();
        assert_eq!(sessions.get(&user).unwrap().unwrap().trace_level, 0);

        engine
            .fire(&EventKind::from("alarm"), "f", &user, &topology, &sessions)
            .unwrap();
        assert_eq!(sessions.get(&user).unwrap().unwrap().trace_level, 9);
    }

    #[test]
    fn test_rule_deserializes_legacy_names() {
        let rule: TriggerRule = serde_json::from_str(
            r#"{"trigger_type": "cat", "trigger_value": "x.txt",
                "node_data": {"id": "10.2.0.1", "hostname": "hidden"},
                "trace_modifier": 3}"#,
        )
        .unwrap();
        assert_eq!(rule.event, EventKind::Read);
        assert_eq!(rule.unlock.unwrap().display_name, "hidden");
        assert_eq!(rule.trace_modifier, 3);
    }
}
