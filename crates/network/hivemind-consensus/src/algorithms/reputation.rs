//! Reputation-weighted protocol
//!
//! A voter's confidence is replaced by its learning score, so agents with a
//! strong track record carry more weight.

use super::{ensure_reached, execution_result, ConsensusAlgorithm};
use crate::error::{ConsensusError, ConsensusResult};
use crate::types::{AgentId, AlgorithmKind, Consensus, Decision, ExecutionResult, Vote, Voter};
use crate::voting::VoteSource;
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Completed tasks at which experience stops adding reputation
pub const EXPERIENCE_SATURATION: f64 = 100.0;

/// Fraction of total weight the signed sum must exceed
pub const REPUTATION_THRESHOLD: f64 = 0.6;

/// `0.7 * success_rate + 0.3 * min(1, tasks_completed / 100)`
pub fn learning_score(voter: &Voter) -> f64 {
    let experience = (voter.tasks_completed as f64 / EXPERIENCE_SATURATION).min(1.0);
    0.7 * voter.success_rate.clamp(0.0, 1.0) + 0.3 * experience
}

/// Reputation-weighted consensus
pub struct ReputationWeighted {
    votes: Arc<dyn VoteSource>,
}

impl ReputationWeighted {
    /// Create the protocol over a vote source
    pub fn new(votes: Arc<dyn VoteSource>) -> Self {
        Self { votes }
    }
}

#[async_trait]
impl ConsensusAlgorithm for ReputationWeighted {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::ReputationWeighted
    }

    async fn propose(&self, decision: &Decision, voters: &[Voter]) -> ConsensusResult<Vec<Vote>> {
        let scores: HashMap<AgentId, f64> = voters
            .iter()
            .map(|v| (v.agent_id, learning_score(v)))
            .collect();

        let raw = self.votes.collect_votes(decision, voters).await?;
        let received = raw.len();
        let votes: Vec<Vote> = raw
            .into_iter()
            .filter_map(|mut vote| {
                let score = scores.get(&vote.agent_id)?;
                vote.confidence = *score;
                Some(vote)
            })
            .collect();

        if votes.len() < received {
            debug!(
                "Discarded {} votes from agents without reputation on {}",
                received - votes.len(),
                decision.id
            );
        }
        Ok(votes)
    }

    async fn execute(&self, consensus: &Consensus) -> ConsensusResult<ExecutionResult> {
        ensure_reached(consensus)?;

        let mut signed: Vec<f64> = consensus
            .votes
            .iter()
            .map(|v| if v.decision { v.confidence } else { -v.confidence })
            .collect();
        let mut weights: Vec<f64> = consensus.votes.iter().map(|v| v.confidence).collect();
        signed.sort_by(f64::total_cmp);
        weights.sort_by(f64::total_cmp);

        let signed: f64 = signed.iter().sum();
        let required = REPUTATION_THRESHOLD * weights.iter().sum::<f64>();
        if signed <= required {
            warn!(
                "Decision {} lacks reputation support: {:.3} <= {:.3}",
                consensus.decision_id, signed, required
            );
            return Err(ConsensusError::InsufficientReputationWeight { signed, required });
        }

        Ok(execution_result(
            consensus,
            json!({ "signed_weight": signed, "required": required }),
        ))
    }
}
