//! Leader-based protocol
//!
//! A single leader must hold office before a round starts. Election bumps a
//! monotonic term and is a no-op while the sitting leader is still eligible.

use super::{ensure_reached, execution_result, ConsensusAlgorithm};
use crate::error::{ConsensusError, ConsensusResult};
use crate::types::{AgentId, AlgorithmKind, Consensus, Decision, ExecutionResult, Vote, Voter};
use crate::voting::VoteSource;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct Office {
    leader: Option<AgentId>,
    term: u64,
}

/// Leader-driven consensus
pub struct LeaderBased {
    votes: Arc<dyn VoteSource>,
    office: Mutex<Office>,
}

impl LeaderBased {
    /// Create the protocol over a vote source
    pub fn new(votes: Arc<dyn VoteSource>) -> Self {
        Self {
            votes,
            office: Mutex::new(Office::default()),
        }
    }

    /// Elect a leader among `candidates`.
    ///
    /// Keeps the sitting leader if it is still a candidate. Otherwise the
    /// candidate with the highest success rate wins (first on ties) and the
    /// term advances.
    pub fn elect_leader(&self, candidates: &[Voter]) -> ConsensusResult<AgentId> {
        let mut office = self.office.lock();
        if let Some(current) = office.leader {
            if candidates.iter().any(|c| c.agent_id == current) {
                return Ok(current);
            }
        }

        let winner = candidates
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| {
                a.success_rate
                    .total_cmp(&b.success_rate)
                    .then_with(|| ib.cmp(ia))
            })
            .map(|(_, c)| c.agent_id)
            .ok_or(ConsensusError::NoEligibleVoters)?;

        office.leader = Some(winner);
        office.term += 1;
        info!("Agent {} elected leader for term {}", winner, office.term);
        Ok(winner)
    }

    /// Current leader, if any
    pub fn leader(&self) -> Option<AgentId> {
        self.office.lock().leader
    }

    /// Current term
    pub fn term(&self) -> u64 {
        self.office.lock().term
    }

    /// Vacate the office. The term is kept so the next election advances it.
    pub fn step_down(&self) {
        let mut office = self.office.lock();
        if let Some(leader) = office.leader.take() {
            debug!("Leader {} stepped down in term {}", leader, office.term);
        }
    }
}

#[async_trait]
impl ConsensusAlgorithm for LeaderBased {
    fn kind(&self) -> AlgorithmKind {
        AlgorithmKind::LeaderBased
    }

    async fn propose(&self, decision: &Decision, voters: &[Voter]) -> ConsensusResult<Vec<Vote>> {
        let leader = self.elect_leader(voters)?;
        debug!("Leader {} collecting votes on {}", leader, decision.id);
        self.votes.collect_votes(decision, voters).await
    }

    async fn execute(&self, consensus: &Consensus) -> ConsensusResult<ExecutionResult> {
        ensure_reached(consensus)?;
        let (leader, term) = {
            let office = self.office.lock();
            (office.leader, office.term)
        };
        Ok(execution_result(
            consensus,
            json!({ "leader": leader, "term": term }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::test_support::{consensus, votes};
    use crate::voting::FixedVoteSource;
    use uuid::Uuid;

    fn protocol() -> LeaderBased {
        LeaderBased::new(Arc::new(FixedVoteSource::default()))
    }

    fn voter(success_rate: f64) -> Voter {
        Voter {
            success_rate,
            ..Voter::new(Uuid::new_v4())
        }
    }

    #[test]
    fn test_election_is_idempotent() {
        let leader = protocol();
        let candidates = vec![voter(0.5), voter(0.9), voter(0.7)];

        let first = leader.elect_leader(&candidates).unwrap();
        let second = leader.elect_leader(&candidates).unwrap();

        assert_eq!(first, candidates[1].agent_id);
        assert_eq!(first, second);
        assert_eq!(leader.term(), 1);
    }

    #[test]
    fn test_ties_go_to_first_candidate() {
        let leader = protocol();
        let candidates = vec![voter(0.8), voter(0.8)];
        assert_eq!(leader.elect_leader(&candidates).unwrap(), candidates[0].agent_id);
    }

    #[test]
    fn test_reelection_advances_term() {
        let leader = protocol();
        let first = vec![voter(0.9)];
        let second = vec![voter(0.4)];

        leader.elect_leader(&first).unwrap();
        leader.elect_leader(&second).unwrap();
        assert_eq!(leader.term(), 2);
        assert_eq!(leader.leader(), Some(second[0].agent_id));

        leader.step_down();
        assert_eq!(leader.leader(), None);
        leader.elect_leader(&second).unwrap();
        assert_eq!(leader.term(), 3);
    }

    #[test]
    fn test_election_without_candidates_fails() {
        assert!(matches!(
            protocol().elect_leader(&[]),
            Err(ConsensusError::NoEligibleVoters)
        ));
    }

    #[tokio::test]
    async fn test_execute_records_leader_and_term() {
        let leader = protocol();
        let candidates = vec![voter(1.0)];
        leader.elect_leader(&candidates).unwrap();

        let approved = consensus(AlgorithmKind::LeaderBased, votes(&[(true, 0.9), (true, 0.8)]));
        let result = leader.execute(&approved).await.unwrap();
        assert_eq!(result.details["term"], 1);
        assert_eq!(result.details["leader"], json!(candidates[0].agent_id));
    }

    #[tokio::test]
    async fn test_execute_rejected_decision_fails() {
        let rejected = consensus(AlgorithmKind::LeaderBased, votes(&[(false, 0.9)]));
        assert!(matches!(
            protocol().execute(&rejected).await,
            Err(ConsensusError::ConsensusNotReached(_))
        ));
    }
}
