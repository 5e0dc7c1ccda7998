//! Construction rules and metric profiles for each topology shape

use crate::types::{
    AgentId, Connection, ConnectionKind, Network, NetworkMetrics, Optimization,
    OptimizationObjective, TopologyKind,
};
use crate::{HIERARCHY_GROUP_SIZE, STAR_HUB_CAPACITY};
use rand::{rngs::StdRng, Rng};
use std::fmt::Debug;

/// Workers served by each coordinator
const WORKERS_PER_COORDINATOR: usize = HIERARCHY_GROUP_SIZE - 1;

/// A network shape: how agents are wired and what the wiring implies
pub trait TopologyShape: Send + Sync + Debug {
    /// Shape identifier
    fn kind(&self) -> TopologyKind;

    /// Latency band `(min, max)` in milliseconds sampled for each new edge
    fn latency_band(&self) -> (f64, f64);

    /// Build the full connection set for `agents`
    fn build(&self, agents: &[AgentId], rng: &mut StdRng) -> Vec<Connection>;

    /// Derive metrics for a built network
    fn metrics(&self, agents: &[AgentId], connections: &[Connection]) -> NetworkMetrics;

    /// Improve the network in place. The default changes nothing.
    fn optimize(&self, _network: &mut Network) -> Optimization {
        Optimization::unchanged(self.kind(), OptimizationObjective::Throughput)
    }

    /// Coordinators of the layout, if the shape has any
    fn coordinators(&self, _agents: &[AgentId]) -> Vec<AgentId> {
        Vec::new()
    }

    /// Hub of the layout, if the shape has one
    fn hub(&self, _agents: &[AgentId]) -> Option<AgentId> {
        None
    }
}

/// Instantiate the shape for `kind`
pub fn shape_for(kind: TopologyKind) -> Box<dyn TopologyShape> {
    match kind {
        TopologyKind::Mesh => Box::new(MeshTopology),
        TopologyKind::Hierarchical => Box::new(HierarchicalTopology),
        TopologyKind::Ring => Box::new(RingTopology),
        TopologyKind::Star => Box::new(StarTopology),
    }
}

fn sample_latency(rng: &mut StdRng, (min, max): (f64, f64)) -> f64 {
    rng.gen_range(min..max)
}

fn summarize(
    agents: &[AgentId],
    connections: &[Connection],
    throughput: f64,
    reliability: f64,
) -> NetworkMetrics {
    let average_latency_ms = if connections.is_empty() {
        0.0
    } else {
        connections.iter().map(|c| c.latency_ms).sum::<f64>() / connections.len() as f64
    };

    NetworkMetrics {
        agent_count: agents.len(),
        connection_count: connections.len(),
        average_latency_ms,
        throughput,
        reliability,
    }
}

/// Fully connected network
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshTopology;

impl TopologyShape for MeshTopology {
    fn kind(&self) -> TopologyKind {
        TopologyKind::Mesh
    }

    fn latency_band(&self) -> (f64, f64) {
        (10.0, 50.0)
    }

    fn build(&self, agents: &[AgentId], rng: &mut StdRng) -> Vec<Connection> {
        let mut connections = Vec::with_capacity(agents.len() * agents.len().saturating_sub(1) / 2);
        for (i, &a) in agents.iter().enumerate() {
            for &b in &agents[i + 1..] {
                let latency = sample_latency(rng, self.latency_band());
                connections.push(Connection::new(a, b, ConnectionKind::Direct, latency));
            }
        }
        connections
    }

    fn metrics(&self, agents: &[AgentId], connections: &[Connection]) -> NetworkMetrics {
        summarize(agents, connections, agents.len() as f64, 0.95)
    }

    /// Prefer low-latency links: each edge is weighted by how close it is to
    /// the fastest edge in the mesh.
    fn optimize(&self, network: &mut Network) -> Optimization {
        if network.connections.is_empty() {
            return Optimization::unchanged(self.kind(), OptimizationObjective::Latency);
        }

        let fastest = network
            .connections
            .iter()
            .map(|c| c.latency_ms)
            .fold(f64::INFINITY, f64::min);
        let mean = network.metrics.average_latency_ms;

        for connection in &mut network.connections {
            connection.weight = fastest / connection.latency_ms;
        }

        let expected_improvement = if mean > 0.0 {
            (1.0 - fastest / mean).clamp(0.0, 1.0)
        } else {
            0.0
        };

        Optimization {
            kind: self.kind(),
            objective: OptimizationObjective::Latency,
            expected_improvement,
            changes: network.connections.len(),
        }
    }
}

/// Coordinator tree: every fourth agent coordinates the three that follow it
#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchicalTopology;

impl HierarchicalTopology {
    fn split(agents: &[AgentId]) -> (Vec<AgentId>, Vec<AgentId>) {
        let mut coordinators = Vec::new();
        let mut workers = Vec::new();
        for (i, &agent) in agents.iter().enumerate() {
            if i % HIERARCHY_GROUP_SIZE == 0 {
                coordinators.push(agent);
            } else {
                workers.push(agent);
            }
        }
        (coordinators, workers)
    }
}

impl TopologyShape for HierarchicalTopology {
    fn kind(&self) -> TopologyKind {
        TopologyKind::Hierarchical
    }

    fn latency_band(&self) -> (f64, f64) {
        (20.0, 80.0)
    }

    fn build(&self, agents: &[AgentId], rng: &mut StdRng) -> Vec<Connection> {
        let (coordinators, workers) = Self::split(agents);
        let mut connections = Vec::new();
        if coordinators.is_empty() {
            return connections;
        }

        for (j, &worker) in workers.iter().enumerate() {
            let slot = (j / WORKERS_PER_COORDINATOR).min(coordinators.len() - 1);
            let latency = sample_latency(rng, self.latency_band());
            connections.push(Connection::new(
                coordinators[slot],
                worker,
                ConnectionKind::Direct,
                latency,
            ));
        }

        for pair in coordinators.windows(2) {
            let latency = sample_latency(rng, self.latency_band());
            connections.push(Connection::new(pair[0], pair[1], ConnectionKind::Relay, latency));
        }

        connections
    }

    fn metrics(&self, agents: &[AgentId], connections: &[Connection]) -> NetworkMetrics {
        summarize(agents, connections, (agents.len() as f64).sqrt(), 0.85)
    }

    fn coordinators(&self, agents: &[AgentId]) -> Vec<AgentId> {
        Self::split(agents).0
    }
}

/// Each agent linked to its successor, the last wrapping to the first
#[derive(Debug, Clone, Copy, Default)]
pub struct RingTopology;

impl TopologyShape for RingTopology {
    fn kind(&self) -> TopologyKind {
        TopologyKind::Ring
    }

    fn latency_band(&self) -> (f64, f64) {
        (15.0, 60.0)
    }

    fn build(&self, agents: &[AgentId], rng: &mut StdRng) -> Vec<Connection> {
        let n = agents.len();
        if n < 2 {
            return Vec::new();
        }

        // With two agents the wrap-around link doubles the forward one.
        (0..n)
            .map(|i| {
                let latency = sample_latency(rng, self.latency_band());
                Connection::new(agents[i], agents[(i + 1) % n], ConnectionKind::Direct, latency)
            })
            .collect()
    }

    fn metrics(&self, agents: &[AgentId], connections: &[Connection]) -> NetworkMetrics {
        summarize(agents, connections, agents.len() as f64 * 0.7, 0.75)
    }

    fn optimize(&self, _network: &mut Network) -> Optimization {
        Optimization::unchanged(self.kind(), OptimizationObjective::Reliability)
    }
}

/// Single hub with spokes
#[derive(Debug, Clone, Copy, Default)]
pub struct StarTopology;

impl TopologyShape for StarTopology {
    fn kind(&self) -> TopologyKind {
        TopologyKind::Star
    }

    fn latency_band(&self) -> (f64, f64) {
        (5.0, 30.0)
    }

    fn build(&self, agents: &[AgentId], rng: &mut StdRng) -> Vec<Connection> {
        let Some((&hub, spokes)) = agents.split_first() else {
            return Vec::new();
        };
        spokes
            .iter()
            .map(|&spoke| {
                let latency = sample_latency(rng, self.latency_band());
                Connection::new(hub, spoke, ConnectionKind::Direct, latency)
            })
            .collect()
    }

    fn metrics(&self, agents: &[AgentId], connections: &[Connection]) -> NetworkMetrics {
        let spokes = agents.len().saturating_sub(1) as f64;
        summarize(agents, connections, spokes.min(STAR_HUB_CAPACITY), 0.70)
    }

    fn hub(&self, agents: &[AgentId]) -> Option<AgentId> {
        agents.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use uuid::Uuid;

    fn agents(n: usize) -> Vec<AgentId> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_mesh_connects_every_pair_once() {
        let ids = agents(5);
        let connections = MeshTopology.build(&ids, &mut rng());
        assert_eq!(connections.len(), 10);
        for (i, &a) in ids.iter().enumerate() {
            for &b in &ids[i + 1..] {
                assert_eq!(connections.iter().filter(|c| c.joins(a, b)).count(), 1);
            }
        }
    }

    #[test]
    fn test_hierarchical_groups_workers_under_coordinators() {
        let ids = agents(9);
        let connections = HierarchicalTopology.build(&ids, &mut rng());

        // Coordinators at positions 0, 4, 8; workers 1-3 -> 0, 5-7 -> 4
        let coordinators = HierarchicalTopology.coordinators(&ids);
        assert_eq!(coordinators, vec![ids[0], ids[4], ids[8]]);
        for w in [1, 2, 3] {
            assert!(connections.iter().any(|c| c.joins(ids[0], ids[w])));
        }
        for w in [5, 6, 7] {
            assert!(connections.iter().any(|c| c.joins(ids[4], ids[w])));
        }
        assert!(connections.iter().any(|c| c.joins(ids[0], ids[4]) && c.kind == ConnectionKind::Relay));
        assert!(connections.iter().any(|c| c.joins(ids[4], ids[8])));
        assert_eq!(connections.len(), 6 + 2);
    }

    #[test]
    fn test_ring_wraps_around() {
        let ids = agents(4);
        let connections = RingTopology.build(&ids, &mut rng());
        assert_eq!(connections.len(), 4);
        assert!(connections.iter().any(|c| c.joins(ids[3], ids[0])));
        assert!(RingTopology.build(&ids[..1], &mut rng()).is_empty());
    }

    #[test]
    fn test_star_hub_is_first_agent() {
        let ids = agents(6);
        let connections = StarTopology.build(&ids, &mut rng());
        assert_eq!(connections.len(), 5);
        assert!(connections.iter().all(|c| c.a == ids[0]));
        assert_eq!(StarTopology.hub(&ids), Some(ids[0]));
    }

    #[test]
    fn test_latencies_stay_in_band() {
        let ids = agents(8);
        for kind in [
            TopologyKind::Mesh,
            TopologyKind::Hierarchical,
            TopologyKind::Ring,
            TopologyKind::Star,
        ] {
            let shape = shape_for(kind);
            let (min, max) = shape.latency_band();
            for c in shape.build(&ids, &mut rng()) {
                assert!(c.latency_ms >= min && c.latency_ms < max, "{kind}: {}", c.latency_ms);
            }
        }
    }

    #[test]
    fn test_reliability_ordering() {
        let ids = agents(8);
        let reliability = |kind| {
            let shape = shape_for(kind);
            let connections = shape.build(&ids, &mut rng());
            shape.metrics(&ids, &connections).reliability
        };
        assert!(reliability(TopologyKind::Mesh) > reliability(TopologyKind::Hierarchical));
        assert!(reliability(TopologyKind::Hierarchical) > reliability(TopologyKind::Ring));
        assert!(reliability(TopologyKind::Ring) > reliability(TopologyKind::Star));
    }

    #[test]
    fn test_star_throughput_capped_by_hub() {
        let ids = agents(30);
        let connections = StarTopology.build(&ids, &mut rng());
        assert_eq!(StarTopology.metrics(&ids, &connections).throughput, STAR_HUB_CAPACITY);
    }

    #[test]
    fn test_mesh_optimize_reweights_by_latency() {
        let ids = agents(4);
        let shape = MeshTopology;
        let connections = shape.build(&ids, &mut rng());
        let metrics = shape.metrics(&ids, &connections);
        let mut network = Network { agents: ids, connections, metrics };

        let optimization = shape.optimize(&mut network);
        assert_eq!(optimization.objective, OptimizationObjective::Latency);
        assert_eq!(optimization.changes, 6);
        assert!(optimization.expected_improvement >= 0.0);
        assert!(network.connections.iter().all(|c| c.weight > 0.0 && c.weight <= 1.0));
        assert!(network.connections.iter().any(|c| (c.weight - 1.0).abs() < f64::EPSILON));
    }
}
