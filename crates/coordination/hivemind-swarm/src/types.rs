//! Common types for agent coordination

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an agent
pub type AgentId = Uuid;

/// Unique identifier for a task
pub type TaskId = Uuid;

/// Unique identifier for an assignment
pub type AssignmentId = Uuid;

/// Unique identifier for an objective
pub type ObjectiveId = Uuid;

/// Role tag of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    /// Gathers information
    Researcher,
    /// Writes and debugs code
    Coder,
    /// Processes data and reports
    Analyst,
    /// Verifies behavior
    Tester,
    /// Designs and plans
    Architect,
    /// Reviews work for quality
    Reviewer,
    /// Tunes performance
    Optimizer,
    /// Plans and delegates
    Coordinator,
    /// Writes documentation
    Documenter,
    /// Watches and alerts
    Monitor,
    /// Catch-all for unlisted specializations
    Specialist,
}

impl AgentType {
    /// Capabilities an agent of this type gets when none are supplied
    pub fn default_capabilities(&self) -> &'static [&'static str] {
        match self {
            AgentType::Researcher => &["research", "analysis", "information-gathering"],
            AgentType::Coder => &["programming", "implementation", "debugging", "prototyping"],
            AgentType::Analyst => &["analysis", "data-processing", "reporting"],
            AgentType::Tester => &["testing", "validation", "quality-assurance"],
            AgentType::Architect => &["design", "planning", "architecture"],
            AgentType::Reviewer => &["review", "validation", "quality-assurance"],
            AgentType::Optimizer => &["optimization", "performance", "profiling"],
            AgentType::Coordinator => &["coordination", "planning", "delegation"],
            AgentType::Documenter => &["documentation", "writing"],
            AgentType::Monitor => &["monitoring", "alerting", "diagnostics"],
            AgentType::Specialist => &["general"],
        }
    }

    /// Agent type best suited to a worker pool specialization
    pub fn for_specialization(specialization: &str) -> Self {
        match specialization.to_ascii_lowercase().as_str() {
            "research" => AgentType::Researcher,
            "planning" | "design" => AgentType::Architect,
            "programming" | "implementation" | "prototyping" => AgentType::Coder,
            "testing" | "validation" => AgentType::Tester,
            "analysis" => AgentType::Analyst,
            "review" => AgentType::Reviewer,
            "optimization" => AgentType::Optimizer,
            "coordination" => AgentType::Coordinator,
            "documentation" => AgentType::Documenter,
            "monitoring" => AgentType::Monitor,
            _ => AgentType::Specialist,
        }
    }

    /// Stable name
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Researcher => "researcher",
            AgentType::Coder => "coder",
            AgentType::Analyst => "analyst",
            AgentType::Tester => "tester",
            AgentType::Architect => "architect",
            AgentType::Reviewer => "reviewer",
            AgentType::Optimizer => "optimizer",
            AgentType::Coordinator => "coordinator",
            AgentType::Documenter => "documenter",
            AgentType::Monitor => "monitor",
            AgentType::Specialist => "specialist",
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Being created
    Spawning,
    /// No work in flight
    Idle,
    /// Working, with spare concurrency
    Active,
    /// At its concurrency limit
    Busy,
    /// Faulted
    Error,
    /// Shut down
    Terminated,
}

impl AgentStatus {
    /// Whether the agent may be offered new work
    pub fn is_available(&self) -> bool {
        matches!(self, AgentStatus::Idle | AgentStatus::Active)
    }
}

/// Resource gauges reported for an agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsage {
    /// CPU usage in percent
    pub cpu: f64,
    /// Memory usage in percent
    pub memory: f64,
    /// Open connections
    pub connections: u32,
}

/// Rolling performance record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPerformance {
    /// Tasks finished successfully
    pub tasks_completed: u64,
    /// Tasks that failed or timed out
    pub tasks_failed: u64,
    /// Exponential moving average of task success
    pub success_rate: f64,
    /// Exponential moving average of response time
    pub avg_response_time_ms: f64,
    /// Blended feedback rating in [0, 1]
    pub quality_score: f64,
    /// Latest resource gauges
    pub resources: ResourceUsage,
    /// Last time the agent did anything
    pub last_activity: DateTime<Utc>,
}

impl Default for AgentPerformance {
    fn default() -> Self {
        Self {
            tasks_completed: 0,
            tasks_failed: 0,
            success_rate: 1.0,
            avg_response_time_ms: 0.0,
            quality_score: 0.5,
            resources: ResourceUsage::default(),
            last_activity: Utc::now(),
        }
    }
}

/// A worker agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Unique identifier
    pub id: AgentId,
    /// Display name
    pub name: String,
    /// Role tag
    pub agent_type: AgentType,
    /// Capabilities offered to tasks
    pub capabilities: Vec<String>,
    /// Lifecycle status
    pub status: AgentStatus,
    /// Maximum tasks in flight at once
    pub max_concurrency: usize,
    /// Tasks currently in flight
    pub active_tasks: usize,
    /// Track record
    pub performance: AgentPerformance,
    /// Spawn time
    pub created_at: DateTime<Utc>,
}

/// Options for spawning an agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Display name, defaults to `<type>-<short id>`
    pub name: Option<String>,
    /// Capabilities, defaults to the type's set
    pub capabilities: Option<Vec<String>>,
    /// Concurrency limit, defaults to the registry setting
    pub max_concurrency: Option<usize>,
}

impl AgentConfig {
    /// Config with explicit capabilities
    pub fn with_capabilities<I, S>(capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            capabilities: Some(capabilities.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Background work
    Low,
    /// Default
    #[default]
    Medium,
    /// Preferred by coordinators and optimizers
    High,
    /// Preferred by coordinators
    Critical,
}

/// A unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,
    /// What to do
    pub description: String,
    /// Every capability an assignee must hold
    pub required_capabilities: Vec<String>,
    /// Scheduling priority
    pub priority: Priority,
    /// Tasks that must finish first
    pub dependencies: Vec<TaskId>,
    /// Latest completion time
    pub deadline: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a medium-priority task without dependencies
    pub fn new<I, S>(description: impl Into<String>, required_capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            required_capabilities: required_capabilities.into_iter().map(Into::into).collect(),
            priority: Priority::Medium,
            dependencies: Vec::new(),
            deadline: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<TaskId>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Resource quotas reserved for an assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceReservation {
    /// Memory in MiB
    pub memory_mb: u64,
    /// CPU share in percent
    pub cpu_percent: f64,
    /// Disk in MiB
    pub storage_mb: u64,
    /// Bandwidth in Mbit/s
    pub network_mbps: u64,
}

impl Default for ResourceReservation {
    fn default() -> Self {
        Self {
            memory_mb: 512,
            cpu_percent: 25.0,
            storage_mb: 256,
            network_mbps: 10,
        }
    }
}

/// Binds one task to one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// Unique identifier
    pub id: AssignmentId,
    /// Task being executed
    pub task_id: TaskId,
    /// Agent executing it
    pub agent_id: AgentId,
    /// Execution is cancelled past this point
    pub deadline: DateTime<Utc>,
    /// Reserved quotas
    pub resources: ResourceReservation,
    /// When the agent was chosen
    pub assigned_at: DateTime<Utc>,
}

/// How an assignment ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOutcome {
    /// The executor reported success
    Succeeded,
    /// The executor failed or reported failure
    Failed,
    /// The deadline passed first
    TimedOut,
    /// The assignment was aborted
    Cancelled,
}

/// Result of an executed assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Assignment that ran
    pub assignment: Assignment,
    /// How it ended
    pub outcome: TaskOutcome,
    /// Executor payload
    pub data: Option<serde_json::Value>,
    /// Failure description
    pub error: Option<String>,
    /// Executor metadata
    pub metadata: Option<serde_json::Value>,
    /// Wall time from dispatch to completion
    pub duration_ms: u64,
    /// Completion time
    pub completed_at: DateTime<Utc>,
}

impl TaskResult {
    pub fn is_success(&self) -> bool {
        self.outcome == TaskOutcome::Succeeded
    }

    pub fn task_id(&self) -> TaskId {
        self.assignment.task_id
    }

    pub fn agent_id(&self) -> AgentId {
        self.assignment.agent_id
    }
}

/// System-wide gauges
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemMetrics {
    /// Registered agents
    pub agent_count: usize,
    /// Agents with work in flight
    pub active_agents: usize,
    /// Mean memory usage in percent
    pub mean_memory: f64,
    /// Mean CPU usage in percent
    pub mean_cpu: f64,
    /// Open connections over all agents
    pub total_connections: u64,
}

/// Aggregate performance across agents
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    /// Finished tasks per minute since the registry started
    pub throughput_per_minute: f64,
    /// Mean of agent response times
    pub mean_latency_ms: f64,
    /// `1 - mean success rate`
    pub error_rate: f64,
}

/// Threshold an agent exceeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BottleneckKind {
    /// CPU above limit
    Cpu,
    /// Memory above limit
    Memory,
    /// Success rate below limit
    SuccessRate,
    /// Response time above limit
    ResponseTime,
}

/// One flagged agent metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bottleneck {
    /// Flagged agent
    pub agent_id: AgentId,
    /// Metric that crossed its limit
    pub kind: BottleneckKind,
    /// Observed value
    pub value: f64,
    /// Configured limit
    pub threshold: f64,
}

/// Output of `AgentRegistry::monitor`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorReport {
    /// System-wide gauges
    pub system: SystemMetrics,
    /// Aggregate performance
    pub performance: PerformanceSummary,
    /// Flagged agent metrics
    pub bottlenecks: Vec<Bottleneck>,
    /// When the report was taken
    pub timestamp: DateTime<Utc>,
}
