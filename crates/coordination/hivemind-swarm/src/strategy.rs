//! Objectives and the strategies derived from them
//!
//! A strategy is a fixed phase pipeline. Each phase produces one task whose
//! required capabilities follow from the phase, and depends on the previous
//! phase's task, so phases run strictly in order.

use crate::types::{ObjectiveId, Priority, Task};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A high-level goal submitted to the hive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    /// Unique identifier
    pub id: ObjectiveId,
    /// What the hive should achieve
    pub description: String,
    /// Ordered sub-goals
    pub subgoals: Vec<String>,
    /// Free-form limits, each adds planning risk
    pub constraints: Vec<String>,
    /// Priority given to every derived task
    pub priority: Priority,
    /// Latest completion time
    pub deadline: Option<DateTime<Utc>>,
    /// Submission time
    pub created_at: DateTime<Utc>,
}

impl Objective {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            subgoals: Vec::new(),
            constraints: Vec::new(),
            priority: Priority::Medium,
            deadline: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_subgoals<I, S>(mut self, subgoals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subgoals = subgoals.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_constraints<I, S>(mut self, constraints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constraints = constraints.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Objective complexity class
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    /// Few sub-goals
    Low,
    /// Several sub-goals or constraints
    Medium,
    /// Many sub-goals or constraints
    High,
}

/// Objective risk class
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// No notable risk
    Low,
    /// Some risk
    Medium,
    /// Needs close monitoring
    High,
}

/// One identified risk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    /// What could go wrong
    pub description: String,
    /// Likelihood in [0, 1]
    pub probability: f64,
    /// Severity in [0, 1]
    pub impact: f64,
    /// Suggested countermeasure
    pub mitigation: String,
}

/// Risks found while planning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Overall class
    pub level: RiskLevel,
    /// Individual risks
    pub risks: Vec<Risk>,
}

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    /// Research the problem
    Analysis,
    /// Design the solution
    Planning,
    /// Build a first version
    Prototyping,
    /// Implement in full
    Execution,
    /// Test the result
    Validation,
}

impl PhaseKind {
    /// Capabilities required by the phase's task
    pub fn capabilities(&self) -> [&'static str; 2] {
        match self {
            PhaseKind::Analysis => ["research", "analysis"],
            PhaseKind::Planning => ["planning", "design"],
            PhaseKind::Prototyping => ["prototyping", "programming"],
            PhaseKind::Execution => ["programming", "implementation"],
            PhaseKind::Validation => ["testing", "validation"],
        }
    }

    /// Share of the base phase duration this phase takes
    fn duration_factor(&self) -> f64 {
        match self {
            PhaseKind::Analysis => 1.0,
            PhaseKind::Planning => 0.75,
            PhaseKind::Prototyping => 1.5,
            PhaseKind::Execution => 2.0,
            PhaseKind::Validation => 1.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseKind::Analysis => "analysis",
            PhaseKind::Planning => "planning",
            PhaseKind::Prototyping => "prototyping",
            PhaseKind::Execution => "execution",
            PhaseKind::Validation => "validation",
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stage of a strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    /// Pipeline stage
    pub kind: PhaseKind,
    /// Work in this phase
    pub tasks: Vec<Task>,
    /// Phase that must finish first
    pub depends_on: Option<PhaseKind>,
    /// Expected wall time
    pub estimated_duration_secs: u64,
}

/// Resources a strategy is expected to consume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceAllocation {
    /// Agents needed
    pub agents: usize,
    /// Expected wall time over all phases
    pub estimated_duration_secs: u64,
    /// Memory in MiB
    pub memory_mb: u64,
    /// CPU share in percent
    pub cpu_percent: f64,
}

/// Plan for an objective
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    /// Objective this plan serves
    pub objective_id: ObjectiveId,
    /// Complexity class
    pub complexity: Complexity,
    /// Phases in execution order
    pub phases: Vec<Phase>,
    /// Expected consumption
    pub resources: ResourceAllocation,
    /// Risk assessment
    pub risk: RiskAssessment,
    /// Planning time
    pub created_at: DateTime<Utc>,
}

impl Strategy {
    /// Every task of every phase, in phase order
    pub fn tasks(&self) -> Vec<Task> {
        self.phases.iter().flat_map(|p| p.tasks.iter().cloned()).collect()
    }
}

fn priority_bonus(priority: Priority) -> u32 {
    match priority {
        Priority::Low => 0,
        Priority::Medium => 2,
        Priority::High => 4,
        Priority::Critical => 6,
    }
}

/// `2 * subgoals + 3 * constraints + priority bonus`
pub fn complexity_score(objective: &Objective) -> u32 {
    2 * objective.subgoals.len() as u32
        + 3 * objective.constraints.len() as u32
        + priority_bonus(objective.priority)
}

pub fn classify_complexity(objective: &Objective) -> Complexity {
    match complexity_score(objective) {
        0..=7 => Complexity::Low,
        8..=15 => Complexity::Medium,
        _ => Complexity::High,
    }
}

fn deadline_is_near(objective: &Objective, now: DateTime<Utc>) -> bool {
    objective
        .deadline
        .map_or(false, |deadline| deadline - now <= Duration::hours(24))
}

/// Constraints, plus 3 for a deadline within a day, plus 3 when critical
pub fn risk_score(objective: &Objective, now: DateTime<Utc>) -> u32 {
    let mut score = objective.constraints.len() as u32;
    if deadline_is_near(objective, now) {
        score += 3;
    }
    if objective.priority == Priority::Critical {
        score += 3;
    }
    score
}

pub fn classify_risk(objective: &Objective, now: DateTime<Utc>) -> RiskLevel {
    match risk_score(objective, now) {
        0..=2 => RiskLevel::Low,
        3..=5 => RiskLevel::Medium,
        _ => RiskLevel::High,
    }
}

fn identify_risks(objective: &Objective, complexity: Complexity, now: DateTime<Utc>) -> Vec<Risk> {
    let mut risks = Vec::new();
    if !objective.constraints.is_empty() {
        risks.push(Risk {
            description: format!("{} constraints may conflict", objective.constraints.len()),
            probability: (0.1 * objective.constraints.len() as f64).min(0.9),
            impact: 0.5,
            mitigation: "Validate constraints during planning".into(),
        });
    }
    if deadline_is_near(objective, now) {
        risks.push(Risk {
            description: "Deadline within 24 hours".into(),
            probability: 0.6,
            impact: 0.8,
            mitigation: "Keep work on the critical path".into(),
        });
    }
    if objective.priority == Priority::Critical {
        risks.push(Risk {
            description: "Failure of a critical objective".into(),
            probability: 0.3,
            impact: 0.9,
            mitigation: "Gate completion on validation".into(),
        });
    }
    if complexity == Complexity::High {
        risks.push(Risk {
            description: "Scope exceeds estimate".into(),
            probability: 0.5,
            impact: 0.6,
            mitigation: "Prototype before execution".into(),
        });
    }
    risks
}

/// Derive the strategy for `objective`
pub fn plan(objective: &Objective) -> Strategy {
    plan_at(objective, Utc::now())
}

/// Derive the strategy as of `now`
pub fn plan_at(objective: &Objective, now: DateTime<Utc>) -> Strategy {
    let complexity = classify_complexity(objective);
    let base_secs = match complexity {
        Complexity::Low => 1800.0,
        Complexity::Medium => 3600.0,
        Complexity::High => 7200.0,
    };

    let mut kinds = vec![PhaseKind::Analysis, PhaseKind::Planning];
    if complexity == Complexity::High {
        kinds.push(PhaseKind::Prototyping);
    }
    kinds.extend([PhaseKind::Execution, PhaseKind::Validation]);

    let mut phases: Vec<Phase> = Vec::with_capacity(kinds.len());
    for kind in kinds {
        let (depends_on, dependencies) = match phases.last() {
            Some(prev) => (Some(prev.kind), prev.tasks.iter().map(|t| t.id).collect()),
            None => (None, Vec::new()),
        };
        let mut task = Task::new(
            format!("{}: {}", kind, objective.description),
            kind.capabilities(),
        )
        .with_priority(objective.priority)
        .with_dependencies(dependencies);
        task.deadline = objective.deadline;

        phases.push(Phase {
            kind,
            depends_on,
            tasks: vec![task],
            estimated_duration_secs: (base_secs * kind.duration_factor()) as u64,
        });
    }

    let agents = phases.len();
    let estimated_duration_secs = phases.iter().map(|p| p.estimated_duration_secs).sum();
    Strategy {
        objective_id: objective.id,
        complexity,
        resources: ResourceAllocation {
            agents,
            estimated_duration_secs,
            memory_mb: 512 * agents as u64,
            cpu_percent: 25.0 * agents as f64,
        },
        risk: RiskAssessment {
            level: classify_risk(objective, now),
            risks: identify_risks(objective, complexity, now),
        },
        phases,
        created_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_subgoals_medium_priority_is_low_complexity() {
        let objective = Objective::new("ship login page").with_subgoals(["form", "session"]);
        let strategy = plan(&objective);

        assert_eq!(complexity_score(&objective), 6);
        assert_eq!(strategy.complexity, Complexity::Low);
        assert_eq!(strategy.phases.len(), 4);
        assert!(strategy.phases.iter().all(|p| p.kind != PhaseKind::Prototyping));
    }

    #[test]
    fn test_high_complexity_adds_prototyping() {
        let objective = Objective::new("rebuild billing")
            .with_subgoals(["a", "b", "c", "d", "e"])
            .with_constraints(["pci", "zero downtime"])
            .with_priority(Priority::High);
        let strategy = plan(&objective);

        assert_eq!(complexity_score(&objective), 20);
        assert_eq!(strategy.complexity, Complexity::High);
        let kinds: Vec<PhaseKind> = strategy.phases.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PhaseKind::Analysis,
                PhaseKind::Planning,
                PhaseKind::Prototyping,
                PhaseKind::Execution,
                PhaseKind::Validation
            ]
        );
    }

    #[test]
    fn test_medium_band() {
        let objective = Objective::new("x")
            .with_subgoals(["a", "b", "c"])
            .with_priority(Priority::Medium);
        assert_eq!(classify_complexity(&objective), Complexity::Medium);
    }

    #[test]
    fn test_phases_chain_through_dependencies() {
        let strategy = plan(&Objective::new("chain").with_subgoals(["one"]));
        assert!(strategy.phases[0].tasks[0].dependencies.is_empty());
        assert_eq!(strategy.phases[0].depends_on, None);
        for pair in strategy.phases.windows(2) {
            assert_eq!(pair[1].depends_on, Some(pair[0].kind));
            assert_eq!(pair[1].tasks[0].dependencies, vec![pair[0].tasks[0].id]);
        }
        assert_eq!(
            strategy.phases[0].tasks[0].required_capabilities,
            vec!["research", "analysis"]
        );
    }

    #[test]
    fn test_risk_classification() {
        let now = Utc::now();
        let calm = Objective::new("calm").with_constraints(["budget"]);
        assert_eq!(classify_risk(&calm, now), RiskLevel::Low);

        let rushed = Objective::new("rushed").with_deadline(now + Duration::hours(2));
        assert_eq!(classify_risk(&rushed, now), RiskLevel::Medium);

        let critical = Objective::new("critical")
            .with_priority(Priority::Critical)
            .with_deadline(now + Duration::hours(2));
        assert_eq!(classify_risk(&critical, now), RiskLevel::High);

        let distant = Objective::new("distant").with_deadline(now + Duration::days(7));
        assert_eq!(risk_score(&distant, now), 0);
    }
}
