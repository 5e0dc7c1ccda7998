//! Network data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an agent in the network
pub type AgentId = Uuid;

/// Supported network shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopologyKind {
    /// Every agent connected to every other agent
    Mesh,
    /// Coordinators chained together, each serving a run of workers
    Hierarchical,
    /// Each agent connected to its successor, wrapping around
    Ring,
    /// First agent is a hub, everyone else connects only to it
    Star,
}

impl TopologyKind {
    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            TopologyKind::Mesh => "mesh",
            TopologyKind::Hierarchical => "hierarchical",
            TopologyKind::Ring => "ring",
            TopologyKind::Star => "star",
        }
    }
}

impl fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a connection carries traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    /// Point-to-point link
    Direct,
    /// Link that forwards traffic on behalf of other agents
    Relay,
}

/// Unordered link between two agents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// One endpoint
    pub a: AgentId,
    /// The other endpoint
    pub b: AgentId,
    /// Link type
    pub kind: ConnectionKind,
    /// Routing weight (higher is preferred)
    pub weight: f64,
    /// Simulated latency estimate in milliseconds
    pub latency_ms: f64,
}

impl Connection {
    /// Create a new connection
    pub fn new(a: AgentId, b: AgentId, kind: ConnectionKind, latency_ms: f64) -> Self {
        Self {
            a,
            b,
            kind,
            weight: 1.0,
            latency_ms,
        }
    }

    /// Whether this connection joins `x` and `y`, in either order
    pub fn joins(&self, x: AgentId, y: AgentId) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }

    /// Endpoint opposite `id`, if `id` is an endpoint
    pub fn other(&self, id: AgentId) -> Option<AgentId> {
        if self.a == id {
            Some(self.b)
        } else if self.b == id {
            Some(self.a)
        } else {
            None
        }
    }
}

/// Derived network metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkMetrics {
    /// Number of agents in the network
    pub agent_count: usize,
    /// Number of connections in the network
    pub connection_count: usize,
    /// Mean connection latency in milliseconds
    pub average_latency_ms: f64,
    /// Relative throughput estimate
    pub throughput: f64,
    /// Reliability estimate in [0, 1]
    pub reliability: f64,
}

/// The active agent graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    /// Agents in input order
    pub agents: Vec<AgentId>,
    /// Connections between agents
    pub connections: Vec<Connection>,
    /// Metrics derived from the two above
    pub metrics: NetworkMetrics,
}

impl Network {
    /// Agents directly connected to `id`, in connection order, without duplicates
    pub fn neighbours(&self, id: AgentId) -> Vec<AgentId> {
        let mut out = Vec::new();
        for other in self.connections.iter().filter_map(|c| c.other(id)) {
            if !out.contains(&other) {
                out.push(other);
            }
        }
        out
    }

    /// Whether `a` and `b` share a connection
    pub fn are_connected(&self, a: AgentId, b: AgentId) -> bool {
        self.connections.iter().any(|c| c.joins(a, b))
    }

    /// Whether `id` is part of the network
    pub fn contains(&self, id: AgentId) -> bool {
        self.agents.contains(&id)
    }
}

/// Read-only snapshot of the active topology
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyInfo {
    /// Active shape
    pub kind: TopologyKind,
    /// Agents in input order
    pub agents: Vec<AgentId>,
    /// Current connections
    pub connections: Vec<Connection>,
    /// Current metrics
    pub metrics: NetworkMetrics,
    /// Coordinators (hierarchical only)
    pub coordinators: Vec<AgentId>,
    /// Hub agent (star only)
    pub hub: Option<AgentId>,
    /// When the network was last rebuilt or optimized
    pub updated_at: DateTime<Utc>,
}

/// What an optimization pass targeted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationObjective {
    /// Reduce message latency
    Latency,
    /// Increase message throughput
    Throughput,
    /// Increase fault tolerance
    Reliability,
}

/// Outcome of an optimization pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Optimization {
    /// Shape that was optimized
    pub kind: TopologyKind,
    /// Objective optimized for
    pub objective: OptimizationObjective,
    /// Expected relative improvement in [0, 1]
    pub expected_improvement: f64,
    /// Connections added, removed or reweighted
    pub changes: usize,
}

impl Optimization {
    /// A pass that changed nothing
    pub fn unchanged(kind: TopologyKind, objective: OptimizationObjective) -> Self {
        Self {
            kind,
            objective,
            expected_improvement: 0.0,
            changes: 0,
        }
    }
}
