//! Error types for topology management

use crate::types::AgentId;
use thiserror::Error;

/// Result type for topology operations
pub type TopologyResult<T> = std::result::Result<T, TopologyError>;

/// Errors raised by the topology manager
#[derive(Debug, Error)]
pub enum TopologyError {
    /// A query or mutation ran before `configure`
    #[error("Topology has not been configured")]
    TopologyNotConfigured,

    /// Agent is not part of the network
    #[error("Agent not found in topology: {0}")]
    AgentNotFound(AgentId),

    /// Agent is already part of the network
    #[error("Agent already present in topology: {0}")]
    DuplicateAgent(AgentId),

    /// Snapshot persistence failed
    #[error("Storage error: {0}")]
    Storage(#[from] hivemind_storage::StorageError),
}
