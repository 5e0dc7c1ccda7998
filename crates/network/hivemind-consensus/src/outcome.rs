//! Protocol-independent outcome computation

use crate::types::Vote;
use serde::{Deserialize, Serialize};

/// Mean confidence a vote set must exceed to be approved
pub const CONFIDENCE_THRESHOLD: f64 = 0.6;

/// Aggregate of a vote set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tally {
    /// Number of votes
    pub votes: usize,
    /// Mean confidence (0 for an empty set)
    pub average_confidence: f64,
    /// Sum of confidence over approving votes
    pub weighted_positive: f64,
    /// Sum of confidence over all votes
    pub total_weight: f64,
    /// `weighted_positive > total_weight / 2 && average_confidence > 0.6`
    pub outcome: bool,
}

/// Compute the shared outcome for a vote set.
///
/// Sums run over confidences sorted ascending, so the result is identical for
/// any permutation of `votes`.
pub fn tally(votes: &[Vote]) -> Tally {
    let mut all: Vec<f64> = votes.iter().map(|v| v.confidence).collect();
    let mut positive: Vec<f64> = votes
        .iter()
        .filter(|v| v.decision)
        .map(|v| v.confidence)
        .collect();
    all.sort_by(f64::total_cmp);
    positive.sort_by(f64::total_cmp);

    let total_weight: f64 = all.iter().sum();
    let weighted_positive: f64 = positive.iter().sum();
    let average_confidence = if votes.is_empty() {
        0.0
    } else {
        total_weight / votes.len() as f64
    };

    Tally {
        votes: votes.len(),
        average_confidence,
        weighted_positive,
        total_weight,
        outcome: weighted_positive > total_weight / 2.0 && average_confidence > CONFIDENCE_THRESHOLD,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn votes(spec: &[(bool, f64)]) -> Vec<Vote> {
        spec.iter()
            .map(|&(d, c)| Vote::new(Uuid::new_v4(), d, c, "test"))
            .collect()
    }

    #[test]
    fn test_mixed_votes_below_confidence_threshold_fail() {
        // Weighted majority approves (2.4 of 2.9) but mean confidence is 0.58
        let t = tally(&votes(&[(true, 0.9), (true, 0.8), (false, 0.2), (true, 0.7), (false, 0.3)]));
        assert!((t.weighted_positive - 2.4).abs() < 1e-9);
        assert!((t.total_weight - 2.9).abs() < 1e-9);
        assert!((t.average_confidence - 0.58).abs() < 1e-9);
        assert!(!t.outcome);
    }

    #[test]
    fn test_confident_majority_passes() {
        let t = tally(&votes(&[(true, 0.9), (true, 0.8), (false, 0.7)]));
        assert!(t.outcome);
    }

    #[test]
    fn test_exact_half_weight_fails() {
        let t = tally(&votes(&[(true, 0.8), (false, 0.8)]));
        assert!(!t.outcome);
    }

    #[test]
    fn test_confidence_must_strictly_exceed_threshold() {
        let t = tally(&votes(&[(true, 0.6), (true, 0.6)]));
        assert!(!t.outcome);
    }

    #[test]
    fn test_empty_vote_set() {
        let t = tally(&[]);
        assert_eq!(t.votes, 0);
        assert_eq!(t.average_confidence, 0.0);
        assert!(!t.outcome);
    }
}
