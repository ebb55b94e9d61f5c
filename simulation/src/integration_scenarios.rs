//! Integration scenarios for the shell and scripted runs
//!
//! These drive the engine through the same text interface a player uses,
//! then check the engine state behind it.

use std::io::Cursor;
use std::sync::Arc;

use infiltr8_core::{Engine, EngineConfig, Node, NodeId, UserId, WorldSeed};

use crate::scenarios::{run_crowd, run_identity_scenario, run_walkthrough};
use crate::shell::Shell;

fn demo_engine() -> Engine {
    Engine::from_seed(EngineConfig::default(), WorldSeed::demo()).unwrap()
}

#[test]
fn test_walkthrough_final_state() {
    let engine = run_walkthrough(EngineConfig::default()).unwrap();
    let status = engine.status_of(&UserId::from("testuser")).unwrap();

    assert_eq!(status.connected, Some(NodeId::from("10.8.0.1")));
    assert_eq!(status.inventory.len(), 1);
    assert_eq!(status.inventory[0].filename, "vpn_creds.txt");
    // only the on-node read fires the trigger
    assert_eq!(status.trace_level, 2);
    assert_eq!(engine.topology().node_count().unwrap(), 4);
}

#[test]
fn test_identity_scenario_final_state() {
    let engine = run_identity_scenario(EngineConfig::default()).unwrap();

    let mallory = engine.sessions().get(&UserId::from("mallory")).unwrap().unwrap();
    assert_eq!(mallory.trace_level, 8);
    assert!(!mallory.cloaked);
    assert!(mallory.spoofed_as.is_none());

    let lookup = engine.whois_of(&UserId::from("bob")).unwrap();
    assert_eq!(
        lookup.summary().unwrap().location,
        Some(NodeId::from("192.168.0.22"))
    );
}

#[test]
fn test_crowd_keeps_invariants() {
    let engine = Arc::new(demo_engine());
    let report = run_crowd(Arc::clone(&engine), 4, 50).unwrap();

    assert_eq!(report.players, 4);
    assert_eq!(report.commands, 200);
    // seeded player plus the crowd
    assert_eq!(engine.sessions().snapshot().unwrap().len(), 5);
    assert!((3..=5).contains(&report.nodes));
}

#[test]
fn test_shell_renders_outcomes() {
    let engine = demo_engine();
    let shell = Shell::new(&engine, UserId::from("testuser"));

    let scan = shell.execute("scan");
    assert_eq!(scan.lines().count(), 3);
    assert!(scan.contains("mail.infiltr8corp.local"));

    assert_eq!(shell.execute("connect 192.168.0.66"), "Connected to 192.168.0.66");
    assert_eq!(
        shell.execute("ls"),
        "access_logs.db\nsecrets.kdbx"
    );
    assert_eq!(
        shell.execute("cat nothing.txt"),
        "File 'nothing.txt' not found on 192.168.0.66 or in inventory."
    );
    assert_eq!(
        shell.execute("pivot 192.168.0.10"),
        "192.168.0.66 does not support pivoting."
    );
}

#[test]
fn test_shell_reports_errors() {
    let engine = demo_engine();
    let shell = Shell::new(&engine, UserId::from("testuser"));

    assert_eq!(
        shell.execute("ls"),
        "Error: You are not connected to any node."
    );
    assert_eq!(shell.execute("frobnicate"), "Unknown command: frobnicate");
    assert_eq!(shell.execute("connect"), "Usage: connect <ip>");
    assert!(shell.execute("unspoof").starts_with("Error:"));
    assert!(shell.execute("connect 203.0.113.9").contains("Node not found"));
}

#[test]
fn test_fresh_player_first_command_starts_session() {
    let engine = demo_engine();
    let alice = UserId::from("alice");
    let shell = Shell::new(&engine, alice.clone());

    // unparsable input never touches the engine
    assert_eq!(shell.execute("frobnicate"), "Unknown command: frobnicate");
    assert!(engine.sessions().get(&alice).unwrap().is_none());

    assert_eq!(
        shell.execute("status"),
        concat!(
            "Username: alice\nConnected IP: Not connected\n",
            "Trace Level: 0\nCloaked: No\nInventory: empty"
        )
    );
    assert!(engine.sessions().get(&alice).unwrap().is_some());

    let bob = Shell::new(&engine, UserId::from("bob"));
    assert!(!bob.execute("cloak").starts_with("Error:"));
    assert_eq!(
        bob.execute("whoami"),
        "Username: bob\nConnected IP: Not connected\nTrace Level: 5"
    );

    let carol = Shell::new(&engine, UserId::from("carol"));
    assert_eq!(carol.execute("ls"), "Error: You are not connected to any node.");
}

#[test]
fn test_shell_help_lists_commands() {
    let engine = demo_engine();
    let shell = Shell::new(&engine, UserId::from("testuser"));
    let help = shell.execute("help");
    assert!(help.starts_with("Available commands:"));
    assert_eq!(help.lines().count(), 15);
}

#[test]
fn test_repl_session() {
    let engine = demo_engine();
    let shell = Shell::new(&engine, UserId::from("testuser"));

    let input = Cursor::new("connect 192.168.0.10\n\ndownload welcome.msg\nquit\nscan\n");
    let mut output = Vec::new();
    shell.run(input, &mut output).unwrap();

    let transcript = String::from_utf8(output).unwrap();
    assert!(transcript.contains("Connected to 192.168.0.10"));
    assert!(transcript.contains("Downloaded welcome.msg"));
    // nothing after quit runs
    assert!(!transcript.contains("sec-db"));

    let status = engine.status_of(&UserId::from("testuser")).unwrap();
    assert_eq!(status.inventory.len(), 1);
}

#[test]
fn test_private_chain_through_shell() {
    let engine = Engine::new(EngineConfig::default());
    for node in [
        Node::builder("10.0.0.1", "edge").build(),
        Node::builder("10.0.1.1", "core").neighbor("10.0.1.2").build(),
        Node::builder("10.0.1.2", "vault").neighbor("10.0.1.1").build(),
    ] {
        engine.topology().insert_node_if_absent(node).unwrap();
    }
    let shell = Shell::new(&engine, UserId::from("op"));

    assert!(shell.execute("connect 10.0.1.1").starts_with("Access to 10.0.1.1 denied"));
    engine
        .sessions()
        .mutate(&UserId::from("op"), |s| s.current_node = Some(NodeId::from("10.0.1.2")))
        .unwrap();
    assert_eq!(
        shell.execute("connect 10.0.1.1"),
        "Pivoted to 10.0.1.1 via connect (allowed because it's a neighbor)"
    );
    assert_eq!(shell.execute("pivot 10.0.1.2"), "Pivoted to 10.0.1.2.");
    assert_eq!(
        shell.execute("pivot 10.0.0.1"),
        "Error: 10.0.0.1 is not reachable from 10.0.1.2."
    );
}
