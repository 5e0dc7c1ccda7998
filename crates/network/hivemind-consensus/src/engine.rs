//! Consensus engine: protocol registry, decision lifecycle and execution

use crate::algorithms::{
    ByzantineTolerant, ConsensusAlgorithm, GossipBased, LeaderBased, ReputationWeighted,
};
use crate::error::{ConsensusError, ConsensusResult};
use crate::outcome::tally;
use crate::types::{
    AlgorithmKind, Consensus, ConsensusStats, ConsensusStatus, Decision, DecisionId,
    DecisionStatus, ExecutionRecord, ExecutionResult,
};
use crate::voting::{SimulatedVoteSource, VoteSource, VoterDirectory};
use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};
use hivemind_storage::{namespaces, KeyValueStore, KeyValueStoreExt};
use metrics::{counter, gauge, histogram};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Key holding the selected protocol
const ACTIVE_ALGORITHM_KEY: &str = "active-algorithm";

fn decision_key(id: DecisionId) -> String {
    format!("decision:{id}")
}

fn consensus_key(id: DecisionId) -> String {
    format!("consensus:{id}")
}

fn execution_key(id: DecisionId) -> String {
    format!("execution:{id}")
}

#[derive(Debug, Clone)]
struct DecisionEntry {
    decision: Decision,
    consensus: Option<Consensus>,
    execution: Option<ExecutionRecord>,
}

#[derive(Debug, Default)]
struct StatsState {
    stats: ConsensusStats,
    confidence_sum: f64,
}

/// Drops a decision from the in-memory table once its round ends.
/// Finished decisions are served from storage.
struct RoundGuard<'a> {
    decisions: &'a DashMap<DecisionId, DecisionEntry>,
    id: DecisionId,
}

impl Drop for RoundGuard<'_> {
    fn drop(&mut self) {
        self.decisions.remove(&self.id);
    }
}

/// Runs decisions through the selected protocol
pub struct ConsensusEngine {
    algorithms: DashMap<AlgorithmKind, Arc<dyn ConsensusAlgorithm>>,
    active: RwLock<Option<AlgorithmKind>>,
    voters: Arc<dyn VoterDirectory>,
    storage: Arc<dyn KeyValueStore>,
    decisions: DashMap<DecisionId, DecisionEntry>,
    stats: RwLock<StatsState>,
}

impl ConsensusEngine {
    /// Engine with no registered protocols
    pub fn new(storage: Arc<dyn KeyValueStore>, voters: Arc<dyn VoterDirectory>) -> Self {
        Self {
            algorithms: DashMap::new(),
            active: RwLock::new(None),
            voters,
            storage,
            decisions: DashMap::new(),
            stats: RwLock::new(StatsState::default()),
        }
    }

    /// Engine with all four protocols sharing one vote source
    pub fn standard(
        storage: Arc<dyn KeyValueStore>,
        voters: Arc<dyn VoterDirectory>,
        votes: Arc<dyn VoteSource>,
    ) -> Self {
        let engine = Self::new(storage, voters);
        engine.register(Arc::new(LeaderBased::new(votes.clone())));
        engine.register(Arc::new(ByzantineTolerant::new(votes.clone())));
        engine.register(Arc::new(GossipBased::new(votes.clone())));
        engine.register(Arc::new(ReputationWeighted::new(votes)));
        engine
    }

    /// Engine with all four protocols, each voting through its simulated preset
    pub fn simulated(
        storage: Arc<dyn KeyValueStore>,
        voters: Arc<dyn VoterDirectory>,
        seed: Option<u64>,
    ) -> Self {
        let source = |kind: AlgorithmKind| -> Arc<dyn VoteSource> {
            Arc::new(SimulatedVoteSource::preset(kind, seed))
        };
        let engine = Self::new(storage, voters);
        engine.register(Arc::new(LeaderBased::new(source(AlgorithmKind::LeaderBased))));
        engine.register(Arc::new(ByzantineTolerant::new(source(
            AlgorithmKind::ByzantineTolerant,
        ))));
        engine.register(Arc::new(GossipBased::new(source(AlgorithmKind::Gossip))));
        engine.register(Arc::new(ReputationWeighted::new(source(
            AlgorithmKind::ReputationWeighted,
        ))));
        engine
    }

    /// Register (or replace) a protocol under its kind
    pub fn register(&self, algorithm: Arc<dyn ConsensusAlgorithm>) {
        let kind = algorithm.kind();
        debug!("Registered consensus algorithm {}", kind);
        self.algorithms.insert(kind, algorithm);
    }

    /// Registered protocol kinds
    pub fn registered(&self) -> Vec<AlgorithmKind> {
        AlgorithmKind::ALL
            .into_iter()
            .filter(|k| self.algorithms.contains_key(k))
            .collect()
    }

    /// Registered protocol instance
    pub fn algorithm(&self, kind: AlgorithmKind) -> Option<Arc<dyn ConsensusAlgorithm>> {
        self.algorithms.get(&kind).map(|a| a.value().clone())
    }

    /// Currently selected protocol
    pub fn active_algorithm(&self) -> Option<AlgorithmKind> {
        *self.active.read()
    }

    /// Switch the active protocol and persist the choice
    pub async fn select_algorithm(&self, kind: AlgorithmKind) -> ConsensusResult<()> {
        if !self.algorithms.contains_key(&kind) {
            return Err(ConsensusError::UnknownAlgorithm(kind.to_string()));
        }

        self.storage
            .store_json(ACTIVE_ALGORITHM_KEY, &kind, namespaces::CONSENSUS)
            .await?;
        *self.active.write() = Some(kind);
        info!("Consensus algorithm set to {}", kind);
        Ok(())
    }

    /// Parse `name` and select it
    pub async fn select_algorithm_by_name(&self, name: &str) -> ConsensusResult<()> {
        let kind: AlgorithmKind = name.parse()?;
        self.select_algorithm(kind).await
    }

    /// Run a full voting round on `decision`.
    ///
    /// Returns once every vote is in and the outcome is recorded. Approved
    /// decisions are executed immediately; a protocol refusing execution is
    /// recorded in the decision's status, not returned as an error.
    pub async fn propose(&self, decision: Decision) -> ConsensusResult<DecisionId> {
        let kind = self.active_algorithm().ok_or(ConsensusError::NoAlgorithmSelected)?;
        let algorithm = self
            .algorithm(kind)
            .ok_or_else(|| ConsensusError::UnknownAlgorithm(kind.to_string()))?;

        let voters = self.voters.eligible_voters().await?;
        if voters.is_empty() {
            return Err(ConsensusError::NoEligibleVoters);
        }

        let id = decision.id;
        let _round = self.reserve(&decision)?;
        if self
            .storage
            .retrieve(&decision_key(id), namespaces::CONSENSUS)
            .await?
            .is_some()
        {
            return Err(ConsensusError::DuplicateDecision(id));
        }
        self.storage
            .store_json(&decision_key(id), &decision, namespaces::CONSENSUS)
            .await?;
        counter!("hivemind_consensus_proposals_total", "algorithm" => kind.as_str()).increment(1);

        let votes = algorithm.propose(&decision, &voters).await?;
        let t = tally(&votes);
        let consensus = Consensus {
            decision_id: id,
            algorithm: kind,
            outcome: t.outcome,
            votes,
            confidence: t.average_confidence,
            eligible: voters.len(),
            timestamp: Utc::now(),
        };
        self.storage
            .store_json(&consensus_key(id), &consensus, namespaces::CONSENSUS)
            .await?;
        self.record_outcome(&consensus);
        if let Some(mut entry) = self.decisions.get_mut(&id) {
            entry.consensus = Some(consensus.clone());
        }
        info!(
            "Decision {} {} under {} ({} votes, confidence {:.2})",
            id,
            if consensus.outcome { "approved" } else { "rejected" },
            kind,
            consensus.votes.len(),
            consensus.confidence
        );

        let record = if consensus.outcome {
            match algorithm.execute(&consensus).await {
                Ok(result) => ExecutionRecord::Executed(result),
                Err(e) => {
                    warn!("Execution of decision {} refused: {}", id, e);
                    ExecutionRecord::Refused {
                        reason: e.to_string(),
                    }
                }
            }
        } else {
            ExecutionRecord::NotAttempted
        };
        self.record_execution(id, record).await?;
        Ok(id)
    }

    /// Current status of a decision
    pub async fn get_status(&self, id: DecisionId) -> ConsensusResult<DecisionStatus> {
        let entry = match self.decisions.get(&id).map(|e| e.value().clone()) {
            Some(entry) => entry,
            None => self.load(id).await?,
        };

        let status = match &entry.consensus {
            None => ConsensusStatus::Pending,
            Some(c) if c.outcome => ConsensusStatus::Reached,
            Some(_) => ConsensusStatus::Failed,
        };
        Ok(DecisionStatus {
            decision: entry.decision,
            consensus: entry.consensus,
            status,
            execution: entry.execution,
        })
    }

    /// Execute an approved decision through the protocol that decided it
    pub async fn execute(&self, id: DecisionId) -> ConsensusResult<ExecutionResult> {
        let status = self.get_status(id).await?;
        let consensus = status
            .consensus
            .ok_or(ConsensusError::ConsensusNotReached(id))?;
        if !consensus.outcome {
            return Err(ConsensusError::ConsensusNotReached(id));
        }

        let algorithm = self
            .algorithm(consensus.algorithm)
            .ok_or_else(|| ConsensusError::UnknownAlgorithm(consensus.algorithm.to_string()))?;
        match algorithm.execute(&consensus).await {
            Ok(result) => {
                self.record_execution(id, ExecutionRecord::Executed(result.clone()))
                    .await?;
                Ok(result)
            }
            Err(e) => {
                self.record_execution(
                    id,
                    ExecutionRecord::Refused {
                        reason: e.to_string(),
                    },
                )
                .await?;
                Err(e)
            }
        }
    }

    /// Running totals
    pub fn stats(&self) -> ConsensusStats {
        self.stats.read().stats.clone()
    }

    fn reserve(&self, decision: &Decision) -> ConsensusResult<RoundGuard<'_>> {
        match self.decisions.entry(decision.id) {
            Entry::Occupied(_) => Err(ConsensusError::DuplicateDecision(decision.id)),
            Entry::Vacant(slot) => {
                slot.insert(DecisionEntry {
                    decision: decision.clone(),
                    consensus: None,
                    execution: None,
                });
                Ok(RoundGuard {
                    decisions: &self.decisions,
                    id: decision.id,
                })
            }
        }
    }

    /// Decisions with a voting round still running
    pub fn in_flight(&self) -> usize {
        self.decisions.len()
    }

    async fn load(&self, id: DecisionId) -> ConsensusResult<DecisionEntry> {
        let decision: Decision = self
            .storage
            .retrieve_json(&decision_key(id), namespaces::CONSENSUS)
            .await?
            .ok_or(ConsensusError::DecisionNotFound(id))?;
        let consensus = self
            .storage
            .retrieve_json(&consensus_key(id), namespaces::CONSENSUS)
            .await?;
        let execution = self
            .storage
            .retrieve_json(&execution_key(id), namespaces::CONSENSUS)
            .await?;
        Ok(DecisionEntry {
            decision,
            consensus,
            execution,
        })
    }

    fn record_outcome(&self, consensus: &Consensus) {
        let mut state = self.stats.write();
        state.stats.proposals += 1;
        if consensus.outcome {
            state.stats.reached += 1;
        } else {
            state.stats.failed += 1;
        }
        state.confidence_sum += consensus.confidence;
        state.stats.average_confidence = state.confidence_sum / state.stats.proposals as f64;

        let outcome = if consensus.outcome { "reached" } else { "failed" };
        counter!(
            "hivemind_consensus_outcomes_total",
            "algorithm" => consensus.algorithm.as_str(),
            "outcome" => outcome
        )
        .increment(1);
        histogram!("hivemind_consensus_confidence").record(consensus.confidence);
        gauge!("hivemind_consensus_average_confidence").set(state.stats.average_confidence);
    }

    async fn record_execution(&self, id: DecisionId, record: ExecutionRecord) -> ConsensusResult<()> {
        match &record {
            ExecutionRecord::Executed(_) => {
                self.stats.write().stats.executions += 1;
                counter!("hivemind_consensus_executions_total").increment(1);
            }
            ExecutionRecord::Refused { .. } => {
                self.stats.write().stats.execution_failures += 1;
                counter!("hivemind_consensus_execution_failures_total").increment(1);
            }
            ExecutionRecord::NotAttempted => {}
        }

        self.storage
            .store_json(&execution_key(id), &record, namespaces::CONSENSUS)
            .await?;
        if let Some(mut entry) = self.decisions.get_mut(&id) {
            entry.execution = Some(record);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Vote, Voter};
    use crate::voting::{FixedVoteSource, StaticVoterDirectory};
    use hivemind_storage::MemoryStore;
    use serde_json::json;
    use uuid::Uuid;

    fn engine_with(votes: Vec<Vote>, voters: usize) -> (ConsensusEngine, Arc<MemoryStore>) {
        let storage = Arc::new(MemoryStore::new());
        let directory = StaticVoterDirectory::new(
            (0..voters).map(|_| Voter::new(Uuid::new_v4())).collect(),
        );
        let engine = ConsensusEngine::standard(
            storage.clone(),
            Arc::new(directory),
            Arc::new(FixedVoteSource::new(votes)),
        );
        (engine, storage)
    }

    fn approving() -> Vec<Vote> {
        vec![
            Vote::new(Uuid::new_v4(), true, 0.9, "a"),
            Vote::new(Uuid::new_v4(), true, 0.8, "b"),
            Vote::new(Uuid::new_v4(), true, 0.85, "c"),
        ]
    }

    #[tokio::test]
    async fn test_propose_without_selection_leaves_no_state() {
        let (engine, storage) = engine_with(approving(), 3);
        let decision = Decision::new(Uuid::new_v4(), json!({"op": "scale"}));
        let id = decision.id;

        assert!(matches!(
            engine.propose(decision).await,
            Err(ConsensusError::NoAlgorithmSelected)
        ));
        assert!(storage.list(namespaces::CONSENSUS).await.unwrap().is_empty());
        assert!(matches!(
            engine.get_status(id).await,
            Err(ConsensusError::DecisionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_select_unregistered_algorithm_fails() {
        let storage = Arc::new(MemoryStore::new());
        let engine = ConsensusEngine::new(storage.clone(), Arc::new(StaticVoterDirectory::default()));

        assert!(matches!(
            engine.select_algorithm(AlgorithmKind::Gossip).await,
            Err(ConsensusError::UnknownAlgorithm(_))
        ));
        assert!(matches!(
            engine.select_algorithm_by_name("paxos").await,
            Err(ConsensusError::UnknownAlgorithm(_))
        ));
        assert_eq!(engine.active_algorithm(), None);
        assert!(storage.is_empty(namespaces::CONSENSUS));
    }

    #[tokio::test]
    async fn test_selection_is_persisted() {
        let (engine, storage) = engine_with(approving(), 3);
        engine.select_algorithm_by_name("pbft").await.unwrap();

        let stored: Option<AlgorithmKind> = storage
            .retrieve_json(ACTIVE_ALGORITHM_KEY, namespaces::CONSENSUS)
            .await
            .unwrap();
        assert_eq!(stored, Some(AlgorithmKind::ByzantineTolerant));
    }

    #[tokio::test]
    async fn test_approved_decision_is_executed_and_persisted() {
        let (engine, storage) = engine_with(approving(), 3);
        engine.select_algorithm(AlgorithmKind::LeaderBased).await.unwrap();

        let id = engine
            .propose(Decision::new(Uuid::new_v4(), json!({})))
            .await
            .unwrap();
        let status = engine.get_status(id).await.unwrap();

        assert_eq!(status.status, ConsensusStatus::Reached);
        assert!(matches!(status.execution, Some(ExecutionRecord::Executed(_))));
        assert!(storage
            .retrieve(&consensus_key(id), namespaces::CONSENSUS)
            .await
            .unwrap()
            .is_some());

        let stats = engine.stats();
        assert_eq!((stats.proposals, stats.reached, stats.executions), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_duplicate_decision_rejected() {
        let (engine, _) = engine_with(approving(), 3);
        engine.select_algorithm(AlgorithmKind::ByzantineTolerant).await.unwrap();

        let decision = Decision::new(Uuid::new_v4(), json!({}));
        engine.propose(decision.clone()).await.unwrap();
        assert!(matches!(
            engine.propose(decision).await,
            Err(ConsensusError::DuplicateDecision(_))
        ));
        assert_eq!(engine.stats().proposals, 1);
    }

    #[tokio::test]
    async fn test_execute_rejected_decision_has_no_side_effects() {
        let votes = vec![
            Vote::new(Uuid::new_v4(), false, 0.9, "no"),
            Vote::new(Uuid::new_v4(), false, 0.8, "no"),
        ];
        let (engine, _) = engine_with(votes, 2);
        engine.select_algorithm(AlgorithmKind::LeaderBased).await.unwrap();

        let id = engine
            .propose(Decision::new(Uuid::new_v4(), json!({})))
            .await
            .unwrap();
        assert!(matches!(
            engine.execute(id).await,
            Err(ConsensusError::ConsensusNotReached(_))
        ));

        let status = engine.get_status(id).await.unwrap();
        assert_eq!(status.status, ConsensusStatus::Failed);
        assert_eq!(status.execution, Some(ExecutionRecord::NotAttempted));
        assert_eq!(engine.stats().executions, 0);
    }

    #[tokio::test]
    async fn test_finished_rounds_leave_memory() {
        let (engine, _) = engine_with(approving(), 3);
        engine.select_algorithm(AlgorithmKind::Gossip).await.unwrap();

        let mut ids = Vec::new();
        for _ in 0..20 {
            ids.push(
                engine
                    .propose(Decision::new(Uuid::new_v4(), json!({})))
                    .await
                    .unwrap(),
            );
        }
        assert_eq!(engine.in_flight(), 0);

        for id in ids {
            let status = engine.get_status(id).await.unwrap();
            assert_eq!(status.status, ConsensusStatus::Reached);
            assert!(matches!(status.execution, Some(ExecutionRecord::Executed(_))));
            assert_eq!(status.consensus.unwrap().eligible, 3);
        }
    }

    #[tokio::test]
    async fn test_duplicate_detected_after_round_evicted() {
        let (engine, _) = engine_with(approving(), 3);
        engine.select_algorithm(AlgorithmKind::LeaderBased).await.unwrap();

        let decision = Decision::new(Uuid::new_v4(), json!({}));
        engine.propose(decision.clone()).await.unwrap();
        assert_eq!(engine.in_flight(), 0);
        assert!(matches!(
            engine.propose(decision).await,
            Err(ConsensusError::DuplicateDecision(_))
        ));
        assert_eq!(engine.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_status_survives_restart() {
        let storage = Arc::new(MemoryStore::new());
        let directory = Arc::new(StaticVoterDirectory::new(vec![Voter::new(Uuid::new_v4())]));
        let first = ConsensusEngine::standard(
            storage.clone(),
            directory.clone(),
            Arc::new(FixedVoteSource::new(approving())),
        );
        first.select_algorithm(AlgorithmKind::LeaderBased).await.unwrap();
        let id = first
            .propose(Decision::new(Uuid::new_v4(), json!({})))
            .await
            .unwrap();

        let second = ConsensusEngine::standard(
            storage,
            directory,
            Arc::new(FixedVoteSource::default()),
        );
        let status = second.get_status(id).await.unwrap();
        assert_eq!(status.status, ConsensusStatus::Reached);
    }
}
