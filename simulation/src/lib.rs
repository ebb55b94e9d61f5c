//! # Infiltr8 Simulation
//!
//! Front end for the Infiltr8 engine: an interactive player shell and
//! scripted scenarios that exercise it.
//!
//! ## Architecture
//!
//! - **Shell** (`shell.rs`): parses player input and renders outcomes
//! - **Scenarios** (`scenarios.rs`): the walkthrough, identity and crowd runs
//!
//! ## Example
//!
//! ```rust,ignore
//! use infiltr8_core::{Engine, EngineConfig, UserId, WorldSeed};
//! use infiltr8_simulation::shell::Shell;
//!
//! let engine = Engine::from_seed(EngineConfig::default(), WorldSeed::demo())?;
//! let shell = Shell::new(&engine, UserId::from("testuser"));
//! println!("{}", shell.execute("scan"));
//! ```

pub mod scenarios;
pub mod shell;

#[cfg(test)]
mod integration_scenarios;

pub use scenarios::{CrowdReport, run_crowd, run_identity_scenario, run_walkthrough};
pub use shell::{Shell, dispatch};
