//! Player command vocabulary
//!
//! [`available_commands`] is the help listing shown to players;
//! [`Command`] parses one line of player input into a typed request.

use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::types::{NodeId, UserId};

/// One entry of the help listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommandHelp {
    pub usage: &'static str,
    pub description: &'static str,
}

const COMMANDS: &[CommandHelp] = &[
    CommandHelp {
        usage: "help",
        description: "Show this command list.",
    },
    CommandHelp {
        usage: "scan",
        description: "Discover visible nodes on the network.",
    },
    CommandHelp {
        usage: "connect <ip>",
        description: "Connect to a specific IP address.",
    },
    CommandHelp {
        usage: "ls",
        description: "List files on the currently connected node.",
    },
    CommandHelp {
        usage: "download <filename>",
        description: "Download a file from the connected node.",
    },
    CommandHelp {
        usage: "cat <filename>",
        description: "View the contents of a file (node or inventory).",
    },
    CommandHelp {
        usage: "status",
        description: "Show your current session state (location, inventory, trace).",
    },
    CommandHelp {
        usage: "whoami",
        description: "Show your current session info (username, trace, location).",
    },
    CommandHelp {
        usage: "pivot <ip>",
        description: "Connect to an IP address adjacent to your current location.",
    },
    CommandHelp {
        usage: "whois <username>",
        description: "Look up another user's public footprint.",
    },
    CommandHelp {
        usage: "cloak",
        description: "Temporarily hides your presence from others at a cost.",
    },
    CommandHelp {
        usage: "uncloak",
        description: "Reverses the cloak command.",
    },
    CommandHelp {
        usage: "spoof <username>",
        description: "Makes you look like someone you are not at a cost.",
    },
    CommandHelp {
        usage: "unspoof",
        description: "Reverses the spoof command.",
    },
];

/// The static help listing, in display order
pub fn available_commands() -> &'static [CommandHelp] {
    COMMANDS
}

/// A parsed player command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Scan,
    Connect(NodeId),
    Ls,
    Download(String),
    Cat(String),
    Status,
    Whoami,
    Pivot(NodeId),
    Whois(UserId),
    Cloak,
    Uncloak,
    Spoof(UserId),
    Unspoof,
}

/// Errors parsing player input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandParseError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("Usage: {0}")]
    MissingArgument(&'static str),
}

impl FromStr for Command {
    type Err = CommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().ok_or(CommandParseError::Empty)?.to_ascii_lowercase();
        let mut arg = |usage: &'static str| {
            parts
                .next()
                .map(str::to_string)
                .ok_or(CommandParseError::MissingArgument(usage))
        };

        let command = match verb.as_str() {
            "help" => Self::Help,
            "scan" => Self::Scan,
            "connect" => Self::Connect(NodeId::from(arg("connect <ip>")?)),
            "ls" => Self::Ls,
            "download" => Self::Download(arg("download <filename>")?),
            "cat" => Self::Cat(arg("cat <filename>")?),
            "status" => Self::Status,
            "whoami" => Self::Whoami,
            "pivot" => Self::Pivot(NodeId::from(arg("pivot <ip>")?)),
            "whois" => Self::Whois(UserId::from(arg("whois <username>")?)),
            "cloak" => Self::Cloak,
            "uncloak" => Self::Uncloak,
            "spoof" => Self::Spoof(UserId::from(arg("spoof <username>")?)),
            "unspoof" => Self::Unspoof,
            _ => return Err(CommandParseError::Unknown(verb.clone())),
        };
        Ok(command)
    }
}
