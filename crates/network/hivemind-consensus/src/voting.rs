//! Vote generation seams
//!
//! Protocols never invent votes themselves. A [`VoteSource`] produces the vote
//! set for a decision and a [`VoterDirectory`] says who may vote. Tests replay
//! fixed votes; production wiring asks real agents.

use crate::error::{ConsensusError, ConsensusResult};
use crate::types::{AlgorithmKind, Decision, Vote, Voter};
use async_trait::async_trait;
use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Produces the votes for a decision
#[async_trait]
pub trait VoteSource: Send + Sync {
    /// Collect votes on `decision` from (a subset of) `voters`
    async fn collect_votes(&self, decision: &Decision, voters: &[Voter]) -> ConsensusResult<Vec<Vote>>;
}

/// Supplies the agents eligible to vote
#[async_trait]
pub trait VoterDirectory: Send + Sync {
    /// Current eligible voters, in a stable order
    async fn eligible_voters(&self) -> ConsensusResult<Vec<Voter>>;
}

/// Directory over a fixed voter list
#[derive(Debug, Clone, Default)]
pub struct StaticVoterDirectory {
    voters: Vec<Voter>,
}

impl StaticVoterDirectory {
    /// Create a directory from a voter list
    pub fn new(voters: Vec<Voter>) -> Self {
        Self { voters }
    }
}

#[async_trait]
impl VoterDirectory for StaticVoterDirectory {
    async fn eligible_voters(&self) -> ConsensusResult<Vec<Voter>> {
        Ok(self.voters.clone())
    }
}

/// Replays a predetermined vote set regardless of who is eligible
#[derive(Debug, Clone, Default)]
pub struct FixedVoteSource {
    votes: Vec<Vote>,
}

impl FixedVoteSource {
    /// Replay exactly `votes`
    pub fn new(votes: Vec<Vote>) -> Self {
        Self { votes }
    }
}

#[async_trait]
impl VoteSource for FixedVoteSource {
    async fn collect_votes(&self, _decision: &Decision, _voters: &[Voter]) -> ConsensusResult<Vec<Vote>> {
        Ok(self.votes.clone())
    }
}

/// Parameters for simulated voting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Probability that a participating voter approves
    pub approval_probability: f64,
    /// Probability that an eligible voter participates at all
    pub participation: f64,
    /// Lower bound of sampled confidence
    pub min_confidence: f64,
    /// Upper bound of sampled confidence
    pub max_confidence: f64,
    /// Seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            approval_probability: 0.8,
            participation: 1.0,
            min_confidence: 0.6,
            max_confidence: 1.0,
            seed: None,
        }
    }
}

impl SimulationSettings {
    /// Illustrative defaults per protocol
    pub fn preset(kind: AlgorithmKind) -> Self {
        match kind {
            AlgorithmKind::LeaderBased => Self::default(),
            AlgorithmKind::ByzantineTolerant => Self {
                min_confidence: 0.5,
                ..Self::default()
            },
            AlgorithmKind::Gossip => Self {
                approval_probability: 0.75,
                participation: 0.85,
                ..Self::default()
            },
            AlgorithmKind::ReputationWeighted => Self {
                approval_probability: 0.75,
                ..Self::default()
            },
        }
    }

    /// Check that probabilities and the confidence band lie in `[0, 1]`
    pub fn validate(&self) -> Result<(), String> {
        let unit = |name: &str, value: f64| {
            if value.is_finite() && (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(format!("{} must be within [0, 1], got {}", name, value))
            }
        };
        unit("approval_probability", self.approval_probability)?;
        unit("participation", self.participation)?;
        unit("min_confidence", self.min_confidence)?;
        unit("max_confidence", self.max_confidence)?;
        if self.min_confidence > self.max_confidence {
            return Err(format!(
                "min_confidence {} exceeds max_confidence {}",
                self.min_confidence, self.max_confidence
            ));
        }
        Ok(())
    }
}

/// Pseudo-random voter for demos and soak runs
#[derive(Debug)]
pub struct SimulatedVoteSource {
    settings: SimulationSettings,
    rng: Mutex<StdRng>,
}

impl SimulatedVoteSource {
    /// Create a simulated source
    pub fn new(settings: SimulationSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            settings,
            rng: Mutex::new(rng),
        }
    }

    /// Simulated source with the protocol's preset
    pub fn preset(kind: AlgorithmKind, seed: Option<u64>) -> Self {
        Self::new(SimulationSettings {
            seed,
            ..SimulationSettings::preset(kind)
        })
    }
}

#[async_trait]
impl VoteSource for SimulatedVoteSource {
    async fn collect_votes(&self, decision: &Decision, voters: &[Voter]) -> ConsensusResult<Vec<Vote>> {
        let s = &self.settings;
        s.validate().map_err(ConsensusError::VoteCollection)?;
        let (lo, hi) = if s.min_confidence < s.max_confidence {
            (s.min_confidence, s.max_confidence)
        } else {
            (s.max_confidence, s.min_confidence + f64::EPSILON)
        };

        let mut rng = self.rng.lock();
        let mut votes = Vec::new();
        for voter in voters {
            if !rng.gen_bool(s.participation) {
                continue;
            }
            let approve = rng.gen_bool(s.approval_probability);
            let confidence = rng.gen_range(lo..hi);
            let reasoning = format!(
                "simulated {} on decision {}",
                if approve { "approval" } else { "rejection" },
                decision.id
            );
            votes.push(Vote::new(voter.agent_id, approve, confidence, reasoning));
        }
        Ok(votes)
    }
}
