//! Interchangeable agreement protocols
//!
//! Every protocol shares the outcome rule in [`crate::outcome`]. They differ
//! in how votes are gathered and in the extra gates applied before an approved
//! decision is executed.

mod byzantine;
mod gossip;
mod leader;
mod reputation;

pub use byzantine::{supermajority, ByzantineTolerant};
pub use gossip::{GossipBased, PARTICIPATION_THRESHOLD};
pub use leader::LeaderBased;
pub use reputation::{learning_score, ReputationWeighted, EXPERIENCE_SATURATION, REPUTATION_THRESHOLD};

use crate::error::{ConsensusError, ConsensusResult};
use crate::types::{AlgorithmKind, Consensus, Decision, ExecutionResult, Vote, Voter};
use async_trait::async_trait;
use chrono::Utc;

/// A consensus protocol
#[async_trait]
pub trait ConsensusAlgorithm: Send + Sync {
    /// Registered identifier
    fn kind(&self) -> AlgorithmKind;

    /// Gather the vote set for `decision` from the eligible `voters`
    async fn propose(&self, decision: &Decision, voters: &[Voter]) -> ConsensusResult<Vec<Vote>>;

    /// Execute an approved decision, applying protocol-specific gates
    async fn execute(&self, consensus: &Consensus) -> ConsensusResult<ExecutionResult>;
}

/// Fail with `ConsensusNotReached` unless the shared outcome approved the decision
pub(crate) fn ensure_reached(consensus: &Consensus) -> ConsensusResult<()> {
    if consensus.outcome {
        Ok(())
    } else {
        Err(ConsensusError::ConsensusNotReached(consensus.decision_id))
    }
}

pub(crate) fn execution_result(
    consensus: &Consensus,
    details: serde_json::Value,
) -> ExecutionResult {
    ExecutionResult {
        decision_id: consensus.decision_id,
        algorithm: consensus.algorithm,
        details,
        executed_at: Utc::now(),
    }
}
