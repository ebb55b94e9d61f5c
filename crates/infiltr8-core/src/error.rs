//! Error types for the Infiltr8 engine
//!
//! Only structural failures live here. In-world outcomes such as a denied
//! connection or a missing file on `cat` are ordinary results, see
//! [`crate::access`].

use thiserror::Error;

use crate::types::{NodeId, UserId};

/// Structural failures of engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("You are not connected to any node.")]
    NotConnected,

    #[error("{target} is not reachable from {from}.")]
    Unreachable { target: NodeId, from: NodeId },

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("{0} is not currently spoofing anyone.")]
    NotSpoofing(UserId),

    #[error("File '{filename}' not found on {node}")]
    FileNotFound { filename: String, node: NodeId },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl EngineError {
    /// Stable code for mapping onto client-visible error responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::NodeNotFound(_) => "node_not_found",
            Self::NotConnected => "not_connected",
            Self::Unreachable { .. } => "unreachable",
            Self::UserNotFound(_) => "user_not_found",
            Self::NotSpoofing(_) => "not_spoofing",
            Self::FileNotFound { .. } => "file_not_found",
            Self::Storage(_) => "storage",
        }
    }
}

/// Errors raised by node and session stores
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend could not be reached or failed mid-operation
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
