//! # HiveMind Consensus
//!
//! Runs one of several interchangeable agreement protocols over a
//! [`Decision`] and, when the swarm approves, executes it.
//!
//! ```text
//!  propose(decision)
//!        │
//!        ▼
//!  VoterDirectory ──► eligible voters
//!        │
//!        ▼
//!  ConsensusAlgorithm::propose ──► VoteSource ──► votes
//!        │
//!        ▼
//!  tally(votes)  (shared, protocol independent)
//!        │ outcome == true
//!        ▼
//!  ConsensusAlgorithm::execute  (protocol specific gates)
//! ```
//!
//! Vote generation sits behind the [`VoteSource`] trait so tests can replay
//! fixed vote sets while production wiring queries real agents.

pub mod algorithms;
pub mod engine;
pub mod error;
pub mod outcome;
pub mod types;
pub mod voting;

pub use algorithms::{
    learning_score, supermajority, ByzantineTolerant, ConsensusAlgorithm, GossipBased,
    LeaderBased, ReputationWeighted, EXPERIENCE_SATURATION, PARTICIPATION_THRESHOLD,
    REPUTATION_THRESHOLD,
};
pub use engine::ConsensusEngine;
pub use error::{ConsensusError, ConsensusResult};
pub use outcome::{tally, Tally, CONFIDENCE_THRESHOLD};
pub use types::*;
pub use voting::{
    FixedVoteSource, SimulatedVoteSource, SimulationSettings, StaticVoterDirectory, VoteSource,
    VoterDirectory,
};
