//! Consensus data model

use crate::error::ConsensusError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Unique identifier for a voting agent
pub type AgentId = Uuid;

/// Unique identifier for a decision
pub type DecisionId = Uuid;

/// Registered protocol identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlgorithmKind {
    /// Single elected leader drives each round
    LeaderBased,
    /// Tolerates up to a third of unreliable voters
    ByzantineTolerant,
    /// Votes spread by partial propagation
    Gossip,
    /// Votes weighted by each agent's track record
    ReputationWeighted,
}

impl AlgorithmKind {
    /// All protocol kinds
    pub const ALL: [AlgorithmKind; 4] = [
        AlgorithmKind::LeaderBased,
        AlgorithmKind::ByzantineTolerant,
        AlgorithmKind::Gossip,
        AlgorithmKind::ReputationWeighted,
    ];

    /// Stable name
    pub fn as_str(&self) -> &'static str {
        match self {
            AlgorithmKind::LeaderBased => "leader-based",
            AlgorithmKind::ByzantineTolerant => "byzantine-tolerant",
            AlgorithmKind::Gossip => "gossip",
            AlgorithmKind::ReputationWeighted => "reputation-weighted",
        }
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlgorithmKind {
    type Err = ConsensusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "leader-based" | "leader" | "raft" => Ok(AlgorithmKind::LeaderBased),
            "byzantine-tolerant" | "byzantine" | "pbft" => Ok(AlgorithmKind::ByzantineTolerant),
            "gossip" => Ok(AlgorithmKind::Gossip),
            "reputation-weighted" | "reputation" => Ok(AlgorithmKind::ReputationWeighted),
            other => Err(ConsensusError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// A proposal submitted for consensus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Unique decision id
    pub id: DecisionId,
    /// Opaque proposal payload
    pub payload: serde_json::Value,
    /// Agent (or component) that proposed it
    pub proposer: AgentId,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Decision {
    /// Create a decision with a fresh id
    pub fn new(proposer: AgentId, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            payload,
            proposer,
            created_at: Utc::now(),
        }
    }
}

/// One agent's judgment on a decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    /// Voting agent
    pub agent_id: AgentId,
    /// Approve or reject
    pub decision: bool,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Free-text justification
    pub reasoning: String,
}

impl Vote {
    /// Create a vote, clamping confidence into [0, 1]
    pub fn new(agent_id: AgentId, decision: bool, confidence: f64, reasoning: impl Into<String>) -> Self {
        Self {
            agent_id,
            decision,
            confidence: if confidence.is_nan() { 0.0 } else { confidence.clamp(0.0, 1.0) },
            reasoning: reasoning.into(),
        }
    }
}

/// Aggregated, immutable outcome of voting on a decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consensus {
    /// Decision voted on
    pub decision_id: DecisionId,
    /// Protocol that ran the round
    pub algorithm: AlgorithmKind,
    /// Whether the decision was approved
    pub outcome: bool,
    /// Every vote cast
    pub votes: Vec<Vote>,
    /// Mean vote confidence
    pub confidence: f64,
    /// Agents eligible to vote when the round ran
    #[serde(default)]
    pub eligible: usize,
    /// When the outcome was computed
    pub timestamp: DateTime<Utc>,
}

/// Lifecycle of a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsensusStatus {
    /// No consensus record yet
    Pending,
    /// Approved
    Reached,
    /// Rejected
    Failed,
}

/// Side effects of executing an approved decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Decision that was executed
    pub decision_id: DecisionId,
    /// Protocol that executed it
    pub algorithm: AlgorithmKind,
    /// Protocol-specific execution details
    pub details: serde_json::Value,
    /// Execution timestamp
    pub executed_at: DateTime<Utc>,
}

/// What happened after the vote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ExecutionRecord {
    /// The decision was executed
    Executed(ExecutionResult),
    /// The protocol refused to execute an approved decision
    Refused {
        /// Why execution was refused
        reason: String,
    },
    /// The decision was not approved, so nothing ran
    NotAttempted,
}

/// Status report for one decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionStatus {
    /// The decision
    pub decision: Decision,
    /// Its consensus record, once computed
    pub consensus: Option<Consensus>,
    /// Pending / reached / failed
    pub status: ConsensusStatus,
    /// Execution outcome, once attempted
    pub execution: Option<ExecutionRecord>,
}

/// Agent eligible to vote, with the track record reputation protocols use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voter {
    /// Agent id
    pub agent_id: AgentId,
    /// Rolling task success rate in [0, 1]
    pub success_rate: f64,
    /// Tasks completed so far
    pub tasks_completed: u64,
}

impl Voter {
    /// Voter with a perfect record and no experience
    pub fn new(agent_id: AgentId) -> Self {
        Self {
            agent_id,
            success_rate: 1.0,
            tasks_completed: 0,
        }
    }
}

/// Running totals for the engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsensusStats {
    /// Decisions proposed
    pub proposals: u64,
    /// Decisions approved
    pub reached: u64,
    /// Decisions rejected
    pub failed: u64,
    /// Approved decisions executed
    pub executions: u64,
    /// Approved decisions a protocol refused to execute
    pub execution_failures: u64,
    /// Mean confidence across all consensus records
    pub average_confidence: f64,
}
