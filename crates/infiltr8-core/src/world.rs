//! World seed data
//!
//! A [`WorldSeed`] is the initial set of nodes, trigger rules and player
//! accounts. Seeds are plain JSON so world authors can write them by hand:
//!
//! ```json
//! {
//!   "nodes": [
//!     {"id": "192.168.0.10", "display_name": "mail", "files": ["welcome.msg"],
//!      "file_contents": {"welcome.msg": "hello"}}
//!   ],
//!   "triggers": [
//!     {"event": "read", "value": "welcome.msg", "trace_modifier": 1}
//!   ],
//!   "users": ["testuser"]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::trigger::TriggerRule;
use crate::types::{Node, UserId};

/// Initial world contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSeed {
    pub nodes: Vec<Node>,
    pub triggers: Vec<TriggerRule>,
    /// Accounts that exist before anyone plays
    pub users: Vec<UserId>,
}

impl WorldSeed {
    pub fn from_json_str(source: &str) -> Result<Self, SeedError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Load a JSON seed file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&source)
    }

    pub fn to_json_pretty(&self) -> Result<String, SeedError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The built-in corporate network
    ///
    /// Three public hosts. Reading the right files unlocks the VPN
    /// concentrator and the backup server; touching the password vault
    /// trips an alarm every time.
    pub fn demo() -> Self {
        let nodes = vec![
            Node::builder("192.168.0.10", "mail.infiltr8corp.local")
                .ports("22,80,443")
                .security_level(2)
                .with_file("email_archive.zip", "PK\u{3}\u{4} [encrypted archive, 14 messages]")
                .with_file(
                    "vpn_creds.txt",
                    "vpn.infiltr8corp.local\nuser: jdoe\npass: Summer2019!",
                )
                .with_file(
                    "welcome.msg",
                    "Welcome to the Infiltr8Corp mail relay. Unauthorized access is monitored.",
                )
                .build(),
            Node::builder("192.168.0.22", "dev.internal.infiltr8corp.local")
                .ports("22,8080")
                .security_level(3)
                .with_file("internal_api_docs.pdf", "%PDF-1.4 Internal API v2 reference")
                .with_file("beta_build.exe", "MZ\u{90}\u{0} [binary]")
                .with_file(
                    "dev_notes.txt",
                    "reminder: move nightly backups off 10.8.0.20 before the audit.",
                )
                .build(),
            Node::builder("192.168.0.66", "sec-db.infiltr8corp.local")
                .ports("3306")
                .security_level(5)
                .with_file("access_logs.db", "SQLite format 3 [access log]")
                .with_file("secrets.kdbx", "KeePass database [locked]")
                .build(),
        ];

        let triggers = vec![
            TriggerRule::on_read("vpn_creds.txt")
                .unlocks(
                    Node::builder("10.8.0.1", "vpn.infiltr8corp.local")
                        .ports("443,1194")
                        .security_level(3)
                        .with_file("routes.txt", "10.8.0.0/24 via tun0")
                        .build(),
                )
                .trace(2),
            TriggerRule::on_read("dev_notes.txt")
                .unlocks(
                    Node::builder("10.8.0.20", "backup.infiltr8corp.local")
                        .ports("22,873")
                        .security_level(4)
                        .with_file("nightly.tar.gz", "[backup archive]")
                        .build(),
                )
                .trace(1),
            TriggerRule::on_read("secrets.kdbx").trace(10),
        ];

        Self {
            nodes,
            triggers,
            users: vec![UserId::from("testuser")],
        }
    }
}

/// Errors loading a world seed
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read world seed {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid world seed: {0}")]
    Parse(#[from] serde_json::Error),
}
