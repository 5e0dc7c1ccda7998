//! Byzantine-tolerant protocol
//!
//! Up to a third of voters may be unreliable, so execution also needs a
//! supermajority of high-confidence ("honest") votes.

use super::{ensure_reached, execution_result, ConsensusAlgorithm};
use crate::error::{ConsensusError, ConsensusResult};
use crate::outcome::CONFIDENCE_THRESHOLD;
use crate::types::{AlgorithmKind, Consensus, Decision, ExecutionResult, Vote, Voter};
use crate::voting::VoteSource;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

/// Honest votes needed out of `n`: `floor(2n/3) + 1`
pub fn supermajority(n: usize) -> usize {
    2 * n / 3 + 1
}

/// Byzantine fault tolerant consensus
pub struct ByzantineTolerant {
    votes: Arc<dyn VoteSource>,
}

impl ByzantineTolerant {
    /// Create the protocol over a vote source
    pub fn new(votes: Arc<dyn VoteSource>) -> Self {
        Self { votes }
    }
}

#[async_trait]
impl ConsensusAlgorithm for ByzantineTolerant {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::ByzantineTolerant
    }

    async fn propose(&self, decision: &Decision, voters: &[Voter]) -> ConsensusResult<Vec<Vote>> {
        self.votes.collect_votes(decision, voters).await
    }

    async fn execute(&self, consensus: &Consensus) -> ConsensusResult<ExecutionResult> {
        ensure_reached(consensus)?;

        let n = consensus.votes.len();
        let honest = consensus
            .votes
            .iter()
            .filter(|v| v.confidence > CONFIDENCE_THRESHOLD)
            .count();
        let required = supermajority(n);
        if honest < required {
            warn!(
                "Decision {} approved but only {}/{} honest votes",
                consensus.decision_id, honest, required
            );
            return Err(ConsensusError::InsufficientHonestVotes { honest, required });
        }

        Ok(execution_result(
            consensus,
            json!({
                "honest_votes": honest,
                "required": required,
                "fault_tolerance": n.saturating_sub(1) / 3,
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::test_support::{consensus, votes};
    use crate::voting::FixedVoteSource;

    fn protocol() -> ByzantineTolerant {
        ByzantineTolerant::new(Arc::new(FixedVoteSource::default()))
    }

    #[test]
    fn test_supermajority_floor() {
        assert_eq!(supermajority(1), 1);
        assert_eq!(supermajority(3), 3);
        assert_eq!(supermajority(4), 3);
        assert_eq!(supermajority(6), 5);
        assert_eq!(supermajority(7), 5);
    }

    #[tokio::test]
    async fn test_all_honest_executes() {
        let c = consensus(
            AlgorithmKind::ByzantineTolerant,
            votes(&[(true, 0.9), (true, 0.8), (true, 0.7), (false, 0.65)]),
        );
        let result = protocol().execute(&c).await.unwrap();
        assert_eq!(result.details["honest_votes"], 4);
        assert_eq!(result.details["required"], 3);
    }

    #[tokio::test]
    async fn test_approved_but_too_few_honest_votes_refused() {
        // Mean confidence 0.6625 > 0.6 and a weighted majority approves, yet
        // only 2 of 4 votes clear 0.6 against a floor of 3.
        let c = consensus(
            AlgorithmKind::ByzantineTolerant,
            votes(&[(true, 1.0), (true, 1.0), (true, 0.55), (false, 0.1)]),
        );
        assert!(c.outcome);
        assert!(matches!(
            protocol().execute(&c).await,
            Err(ConsensusError::InsufficientHonestVotes { honest: 2, required: 3 })
        ));
    }
}
