//! Error types for swarm coordination

use crate::types::{AgentId, AssignmentId, ObjectiveId, TaskId};
use thiserror::Error;

/// Result type for swarm operations
pub type SwarmResult<T> = std::result::Result<T, SwarmError>;

/// Errors that can occur during swarm coordination
#[derive(Debug, Error)]
pub enum SwarmError {
    /// No registered agent can take the task
    #[error("No suitable agent for task {task_id} (unmet capabilities: {unmet:?})")]
    NoSuitableAgent {
        /// Task that could not be placed
        task_id: TaskId,
        /// Required capabilities the closest available agent lacks
        unmet: Vec<String>,
    },

    /// Assignment passed its deadline
    #[error("Assignment {assignment} for task {task_id} timed out after {elapsed_ms}ms")]
    AssignmentTimeout {
        /// Assignment that expired
        assignment: AssignmentId,
        /// Task it was executing
        task_id: TaskId,
        /// Time spent before the deadline hit
        elapsed_ms: u64,
    },

    /// Objective not found in the hive
    #[error("Objective not found: {0}")]
    ObjectiveNotFound(ObjectiveId),

    /// Objective has no strategy to execute
    #[error("No strategy for objective {0}")]
    StrategyMissing(ObjectiveId),

    /// Agent not found in the registry
    #[error("Agent not found: {0}")]
    AgentNotFound(AgentId),

    /// Worker pool not found
    #[error("Worker pool not found: {0}")]
    PoolNotFound(String),

    /// Objective was cancelled before execution
    #[error("Objective {0} was cancelled")]
    ObjectiveCancelled(ObjectiveId),

    /// Consensus refused to approve the objective
    #[error("Objective {objective} rejected: {reason}")]
    ObjectiveRejected {
        /// Objective that was refused
        objective: ObjectiveId,
        /// Consensus status or refusal reason
        reason: String,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] hivemind_storage::StorageError),

    /// Topology error
    #[error("Topology error: {0}")]
    Topology(#[from] hivemind_topology::TopologyError),

    /// Consensus error
    #[error("Consensus error: {0}")]
    Consensus(#[from] hivemind_consensus::ConsensusError),

    /// Other errors
    #[error("Swarm error: {0}")]
    Other(#[from] anyhow::Error),
}
