//! Scripted scenarios for the Infiltr8 engine
//!
//! Each scenario prints a step-by-step transcript and returns the engine
//! so callers (and tests) can inspect the final state.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, ensure};
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::info;

use infiltr8_core::{
    Engine, EngineConfig, EngineError, NodeId, NodeStore, SessionStore, UserId, WorldSeed,
};

use crate::shell::Shell;

fn step<N: NodeStore, S: SessionStore>(
    shell: &Shell<'_, N, S>,
    number: usize,
    title: &str,
    line: &str,
) -> String {
    println!("\n--- Step {}: {} ---", number, title);
    println!("{}> {}", shell.user(), line);
    let output = shell.execute(line);
    for row in output.lines() {
        println!("  {}", row);
    }
    output
}

/// Walk the demo network as a new player
///
/// ```text
/// scan from outside, connect to the mail relay, read the welcome
/// message, read the VPN credentials (which reveals the VPN gateway),
/// download them, hop to the gateway, read the credentials again from
/// inventory, try to pivot from a leaf, check status
/// ```
pub fn run_walkthrough(config: EngineConfig) -> anyhow::Result<Engine> {
    info!("=== Running walkthrough ===");

    let engine = Engine::from_seed(config, WorldSeed::demo())?;
    let shell = Shell::new(&engine, UserId::from("testuser"));

    step(&shell, 1, "Look around before connecting", "scan");
    step(&shell, 2, "Connect to the mail relay", "connect 192.168.0.10");
    step(&shell, 3, "List files", "ls");
    step(&shell, 4, "Read the welcome message", "cat welcome.msg");
    step(&shell, 5, "Read the VPN credentials", "cat vpn_creds.txt");
    step(&shell, 6, "Keep a copy", "download vpn_creds.txt");
    step(&shell, 7, "Connect to the newly revealed gateway", "connect 10.8.0.1");
    step(&shell, 8, "Read the credentials from inventory", "cat vpn_creds.txt");
    step(&shell, 9, "Try to pivot from a leaf node", "pivot 10.8.0.20");
    step(&shell, 10, "Check status", "status");

    println!("\n{}", engine.topology().visualize()?);
    Ok(engine)
}

/// Identity obfuscation between three players
///
/// mallory impersonates bob, hides, reappears and drops the disguise;
/// each `whois bob` shows what an observer sees at that point.
pub fn run_identity_scenario(config: EngineConfig) -> anyhow::Result<Engine> {
    info!("=== Running identity scenario ===");

    let mut seed = WorldSeed::demo();
    seed.users = ["alice", "bob", "mallory"].into_iter().map(UserId::from).collect();
    let engine = Engine::from_seed(config, seed)?;

    let alice = Shell::new(&engine, UserId::from("alice"));
    let bob = Shell::new(&engine, UserId::from("bob"));
    let mallory = Shell::new(&engine, UserId::from("mallory"));

    step(&bob, 1, "bob connects to the dev server", "connect 192.168.0.22");
    step(&mallory, 2, "mallory connects to sec-db", "connect 192.168.0.66");
    step(&alice, 3, "alice looks bob up", "whois bob");
    step(&mallory, 4, "mallory spoofs bob", "spoof bob");
    step(&alice, 5, "alice looks bob up again", "whois bob");
    step(&mallory, 6, "mallory cloaks", "cloak");
    step(&alice, 7, "bob has vanished", "whois bob");
    step(&mallory, 8, "mallory uncloaks", "uncloak");
    step(&mallory, 9, "mallory drops the disguise", "unspoof");
    step(&alice, 10, "bob is visible as bob again", "whois bob");
    step(&mallory, 11, "mallory counts the cost", "whoami");

    Ok(engine)
}

/// Summary of a crowd run
#[derive(Debug, Clone, Default)]
pub struct CrowdReport {
    pub players: usize,
    pub commands: usize,
    /// Commands that failed structurally (unknown node, not connected, ...)
    pub rejected: usize,
    pub nodes: usize,
    pub elapsed: Duration,
}

impl std::fmt::Display for CrowdReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} players ran {} commands ({} rejected) in {:?}; {} nodes known",
            self.players, self.commands, self.rejected, self.elapsed, self.nodes
        )
    }
}

/// Many players issuing random commands at once
///
/// After all threads finish, checks that every player stands on an
/// existing node (or nowhere) and that every inventory item came from a
/// node that exists.
pub fn run_crowd(engine: Arc<Engine>, players: usize, steps: usize) -> anyhow::Result<CrowdReport> {
    info!(players, steps, "=== Running crowd scenario ===");
    let start = Instant::now();

    let handles: Vec<_> = (0..players)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || -> Result<(usize, usize), EngineError> {
                let user = UserId::from(format!("player-{i:02}"));
                engine.create_or_get_session(&user)?;
                let mut rng = rand::rng();
                let mut rejected = 0;
                for _ in 0..steps {
                    match random_action(&engine, &user, players, &mut rng) {
                        Ok(()) => {}
                        Err(EngineError::Storage(e)) => return Err(EngineError::Storage(e)),
                        Err(_) => rejected += 1,
                    }
                }
                Ok((steps, rejected))
            })
        })
        .collect();

    let mut report = CrowdReport {
        players,
        ..Default::default()
    };
    for handle in handles {
        let (commands, rejected) = handle
            .join()
            .map_err(|_| anyhow::anyhow!("crowd player thread panicked"))??;
        report.commands += commands;
        report.rejected += rejected;
    }
    report.elapsed = start.elapsed();
    report.nodes = engine.topology().node_count()?;

    for session in engine.sessions().snapshot()? {
        if let Some(node) = &session.current_node {
            ensure!(
                engine.topology().get_node(node)?.is_some(),
                "{} stands on unknown node {}",
                session.user_id,
                node
            );
        }
        for item in &session.inventory {
            ensure!(
                engine.topology().get_node(&item.source)?.is_some(),
                "{} holds {} from unknown node {}",
                session.user_id,
                item.filename,
                item.source
            );
        }
    }

    println!("{}", report);
    Ok(report)
}

fn random_action(
    engine: &Engine,
    user: &UserId,
    players: usize,
    rng: &mut impl Rng,
) -> Result<(), EngineError> {
    match rng.random_range(0..10) {
        0..=2 => {
            let visible = engine.scan(user)?;
            if let Some(target) = visible.choose(rng) {
                engine.connect(user, &target.id)?;
            }
        }
        3 => {
            let visible = engine.scan(user)?;
            if let Some(target) = visible.choose(rng) {
                engine.pivot(user, &target.id)?;
            }
        }
        4..=5 => {
            let files = engine.list_files(user)?;
            if let Some(file) = files.choose(rng) {
                engine.read_file(user, file)?;
            }
        }
        6 => {
            let files = engine.list_files(user)?;
            if let Some(file) = files.choose(rng) {
                engine.download(user, file)?;
            }
        }
        7 => {
            engine.cloak(user)?;
            engine.uncloak(user)?;
        }
        8 => {
            let other = UserId::from(format!("player-{:02}", rng.random_range(0..players)));
            engine.whois_of(&other)?;
        }
        _ => {
            // unknown host
            engine.connect(user, &NodeId::from("0.0.0.0"))?;
        }
    }
    Ok(())
}

/// Print the world graph, as text or as JSON node records
pub fn print_topology(engine: &Engine, json: bool) -> anyhow::Result<()> {
    if json {
        let mut nodes = engine.topology().store().list()?;
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        println!(
            "{}",
            serde_json::to_string_pretty(&nodes).context("Failed to render topology")?
        );
    } else {
        println!("{}", engine.topology().visualize()?);
    }
    Ok(())
}
