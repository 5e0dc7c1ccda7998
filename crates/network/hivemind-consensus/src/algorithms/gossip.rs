//! Gossip protocol
//!
//! Votes spread by partial propagation, so not every eligible agent is heard.
//! Execution requires that more than 70% of the agents eligible when the
//! round ran actually voted.

use super::{ensure_reached, execution_result, ConsensusAlgorithm};
use crate::error::{ConsensusError, ConsensusResult};
use crate::types::{AlgorithmKind, Consensus, Decision, ExecutionResult, Vote, Voter};
use crate::voting::VoteSource;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// Participation ratio that must be exceeded
pub const PARTICIPATION_THRESHOLD: f64 = 0.7;

/// Gossip-based consensus
pub struct GossipBased {
    votes: Arc<dyn VoteSource>,
}

impl GossipBased {
    /// Create the protocol over a vote source
    pub fn new(votes: Arc<dyn VoteSource>) -> Self {
        Self { votes }
    }
}

#[async_trait]
impl ConsensusAlgorithm for GossipBased {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::Gossip
    }

    async fn propose(&self, decision: &Decision, voters: &[Voter]) -> ConsensusResult<Vec<Vote>> {
        let votes = self.votes.collect_votes(decision, voters).await?;
        debug!(
            "Gossip round for {} reached {}/{} agents",
            decision.id,
            votes.len(),
            voters.len()
        );
        Ok(votes)
    }

    async fn execute(&self, consensus: &Consensus) -> ConsensusResult<ExecutionResult> {
        ensure_reached(consensus)?;

        let eligible = consensus.eligible;
        let ratio = if eligible == 0 {
            0.0
        } else {
            consensus.votes.len() as f64 / eligible as f64
        };
        if ratio <= PARTICIPATION_THRESHOLD {
            warn!(
                "Decision {} approved with participation {:.2}",
                consensus.decision_id, ratio
            );
            return Err(ConsensusError::InsufficientParticipation {
                ratio,
                required: PARTICIPATION_THRESHOLD,
            });
        }

        Ok(execution_result(
            consensus,
            json!({
                "participants": consensus.votes.len(),
                "eligible": eligible,
                "participation": ratio,
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::tally;
    use crate::voting::FixedVoteSource;
    use chrono::Utc;
    use uuid::Uuid;

    fn voters(n: usize) -> Vec<Voter> {
        (0..n).map(|_| Voter::new(Uuid::new_v4())).collect()
    }

    async fn run(eligible: usize, approving: usize) -> ConsensusResult<ExecutionResult> {
        let votes: Vec<Vote> = (0..approving)
            .map(|_| Vote::new(Uuid::new_v4(), true, 0.9, "gossip"))
            .collect();
        let gossip = GossipBased::new(Arc::new(FixedVoteSource::new(votes)));
        let decision = Decision::new(Uuid::new_v4(), json!({}));

        let pool = voters(eligible);
        let votes = gossip.propose(&decision, &pool).await?;
        let t = tally(&votes);
        let consensus = Consensus {
            decision_id: decision.id,
            algorithm: AlgorithmKind::Gossip,
            outcome: t.outcome,
            votes,
            confidence: t.average_confidence,
            eligible: pool.len(),
            timestamp: Utc::now(),
        };
        gossip.execute(&consensus).await
    }

    #[tokio::test]
    async fn test_high_participation_executes() {
        let result = run(10, 8).await.unwrap();
        assert_eq!(result.details["participants"], 8);
        assert_eq!(result.details["eligible"], 10);
    }

    #[tokio::test]
    async fn test_participation_at_threshold_refused() {
        assert!(matches!(
            run(10, 7).await,
            Err(ConsensusError::InsufficientParticipation { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_eligible_count_has_zero_participation() {
        let gossip = GossipBased::new(Arc::new(FixedVoteSource::default()));
        let votes = vec![Vote::new(Uuid::new_v4(), true, 0.9, "late")];
        let t = tally(&votes);
        let consensus = Consensus {
            decision_id: Uuid::new_v4(),
            algorithm: AlgorithmKind::Gossip,
            outcome: t.outcome,
            votes,
            confidence: t.average_confidence,
            eligible: 0,
            timestamp: Utc::now(),
        };
        assert!(matches!(
            gossip.execute(&consensus).await,
            Err(ConsensusError::InsufficientParticipation { ratio, .. }) if ratio == 0.0
        ));
    }
}
