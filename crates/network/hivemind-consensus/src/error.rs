//! Error types for consensus

use crate::types::DecisionId;
use thiserror::Error;

/// Result type for consensus operations
pub type ConsensusResult<T> = std::result::Result<T, ConsensusError>;

/// Errors raised by the consensus engine and its protocols
#[derive(Debug, Error)]
pub enum ConsensusError {
    /// Requested protocol is not registered
    #[error("Unknown consensus algorithm: {0}")]
    UnknownAlgorithm(String),

    /// `propose` was called before any protocol was selected
    #[error("No consensus algorithm selected")]
    NoAlgorithmSelected,

    /// Attempted to execute a decision the swarm did not approve
    #[error("Consensus not reached for decision {0}")]
    ConsensusNotReached(DecisionId),

    /// Too few high-confidence votes for byzantine execution
    #[error("Insufficient honest votes: {honest} < {required}")]
    InsufficientHonestVotes {
        /// Votes with confidence above the honesty threshold
        honest: usize,
        /// Supermajority floor
        required: usize,
    },

    /// Gossip did not reach enough of the swarm
    #[error("Insufficient participation: {ratio:.2} <= {required:.2}")]
    InsufficientParticipation {
        /// Votes received over eligible agents
        ratio: f64,
        /// Minimum ratio (exclusive)
        required: f64,
    },

    /// Reputation-weighted support too low
    #[error("Insufficient reputation weight: {signed:.3} <= {required:.3}")]
    InsufficientReputationWeight {
        /// Signed reputation-weighted sum of votes
        signed: f64,
        /// Threshold the signed sum must exceed
        required: f64,
    },

    /// Nobody is eligible to vote
    #[error("No eligible voters")]
    NoEligibleVoters,

    /// A decision with this id was already proposed
    #[error("Decision already proposed: {0}")]
    DuplicateDecision(DecisionId),

    /// Unknown decision id
    #[error("Decision not found: {0}")]
    DecisionNotFound(DecisionId),

    /// Vote source failed to produce votes
    #[error("Vote collection failed: {0}")]
    VoteCollection(String),

    /// Persistence failure
    #[error("Storage error: {0}")]
    Storage(#[from] hivemind_storage::StorageError),
}
