//! Infiltr8 - text hacking simulation
//!
//! Play the demo network interactively, or run the scripted scenarios.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use infiltr8_core::{Engine, EngineConfig, UserId, WorldSeed};
use infiltr8_logging::{Infiltr8SubscriberBuilder, LogConfig};
use infiltr8_simulation::{scenarios, shell::Shell};

#[derive(Parser)]
#[command(
    name = "infiltr8",
    about = "Text hacking simulation over a directed network of hosts",
    version
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// World seed file (JSON); defaults to the built-in network
    #[arg(long, global = true)]
    world: Option<PathBuf>,

    /// Engine config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive shell
    Play {
        /// Player name
        #[arg(short, long, default_value = "testuser")]
        user: String,
    },

    /// Scripted run through the demo network
    Walkthrough,

    /// Cloak and spoof between three players
    Identity,

    /// Many concurrent players issuing random commands
    Crowd {
        /// Number of players
        #[arg(short, long, default_value = "8")]
        players: usize,

        /// Commands per player
        #[arg(short, long, default_value = "200")]
        steps: usize,
    },

    /// Print the world graph
    Topology {
        /// Print node records as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _log_guard = Infiltr8SubscriberBuilder::new()
        .with_config(LogConfig::for_shell(cli.verbose, cli.json_logs))
        .init();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let load_world = || -> anyhow::Result<Engine> {
        let seed = match &cli.world {
            Some(path) => WorldSeed::load(path)?,
            None => WorldSeed::demo(),
        };
        Engine::from_seed(config.clone(), seed).context("Failed to seed world")
    };

    match cli.command {
        Commands::Play { ref user } => {
            let engine = load_world()?;
            let shell = Shell::new(&engine, UserId::from(user.as_str()));
            engine.create_or_get_session(shell.user())?;
            info!(user = %shell.user(), "Starting shell");
            shell.run(io::stdin().lock(), io::stdout().lock())?;
        }
        Commands::Walkthrough => {
            scenarios::run_walkthrough(config.clone())?;
        }
        Commands::Identity => {
            scenarios::run_identity_scenario(config.clone())?;
        }
        Commands::Crowd { players, steps } => {
            let engine = Arc::new(load_world()?);
            scenarios::run_crowd(engine, players, steps)?;
        }
        Commands::Topology { json } => {
            let engine = load_world()?;
            scenarios::print_topology(&engine, json)?;
        }
    }

    Ok(())
}
