//! Topology manager: owns the active shape and the current network

use crate::error::{TopologyError, TopologyResult};
use crate::shapes::{shape_for, TopologyShape};
use crate::types::{AgentId, Network, Optimization, TopologyInfo, TopologyKind};
use chrono::{DateTime, Utc};
use hivemind_storage::{namespaces, KeyValueStore, KeyValueStoreExt};
use metrics::{counter, gauge};
use parking_lot::Mutex;
use rand::{rngs::StdRng, SeedableRng};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Key of the persisted network snapshot
const SNAPSHOT_KEY: &str = "current";

struct ActiveTopology {
    shape: Box<dyn TopologyShape>,
    network: Network,
    updated_at: DateTime<Utc>,
}

impl ActiveTopology {
    fn info(&self) -> TopologyInfo {
        snapshot(self.shape.as_ref(), &self.network, self.updated_at)
    }
}

fn snapshot(shape: &dyn TopologyShape, network: &Network, updated_at: DateTime<Utc>) -> TopologyInfo {
    TopologyInfo {
        kind: shape.kind(),
        agents: network.agents.clone(),
        connections: network.connections.clone(),
        metrics: network.metrics.clone(),
        coordinators: shape.coordinators(&network.agents),
        hub: shape.hub(&network.agents),
        updated_at,
    }
}

/// Maintains the agent communication graph
pub struct TopologyManager {
    state: RwLock<Option<ActiveTopology>>,
    rng: Mutex<StdRng>,
    storage: Arc<dyn KeyValueStore>,
}

impl TopologyManager {
    /// Create an unconfigured manager with an entropy-seeded latency sampler
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self::with_rng(storage, StdRng::from_entropy())
    }

    /// Create an unconfigured manager whose latency sampling is reproducible
    pub fn with_seed(storage: Arc<dyn KeyValueStore>, seed: u64) -> Self {
        Self::with_rng(storage, StdRng::seed_from_u64(seed))
    }

    fn with_rng(storage: Arc<dyn KeyValueStore>, rng: StdRng) -> Self {
        Self {
            state: RwLock::new(None),
            rng: Mutex::new(rng),
            storage,
        }
    }

    /// (Re)build the network for `agents` under `kind`
    pub async fn configure(
        &self,
        kind: TopologyKind,
        agents: Vec<AgentId>,
    ) -> TopologyResult<TopologyInfo> {
        for (i, agent) in agents.iter().enumerate() {
            if agents[..i].contains(agent) {
                return Err(TopologyError::DuplicateAgent(*agent));
            }
        }

        let shape = shape_for(kind);
        let network = self.build_network(shape.as_ref(), agents);
        let active = ActiveTopology {
            shape,
            network,
            updated_at: Utc::now(),
        };
        let info = active.info();

        let mut state = self.state.write().await;
        self.persist(&info).await?;
        *state = Some(active);
        counter!("hivemind_topology_rebuilds_total", "kind" => kind.as_str()).increment(1);

        info!(
            "Configured {} topology with {} agents and {} connections",
            kind, info.metrics.agent_count, info.metrics.connection_count
        );
        Ok(info)
    }

    /// Add an agent and rebuild connections under the active shape
    pub async fn add_agent(&self, agent: AgentId) -> TopologyResult<TopologyInfo> {
        let mut state = self.state.write().await;
        let active = state.as_mut().ok_or(TopologyError::TopologyNotConfigured)?;
        if active.network.contains(agent) {
            return Err(TopologyError::DuplicateAgent(agent));
        }

        let mut agents = active.network.agents.clone();
        agents.push(agent);
        self.rebuild(active, agents).await
    }

    /// Remove an agent and rebuild connections under the active shape
    pub async fn remove_agent(&self, agent: AgentId) -> TopologyResult<TopologyInfo> {
        let mut state = self.state.write().await;
        let active = state.as_mut().ok_or(TopologyError::TopologyNotConfigured)?;
        if !active.network.contains(agent) {
            return Err(TopologyError::AgentNotFound(agent));
        }

        let agents = active
            .network
            .agents
            .iter()
            .copied()
            .filter(|id| *id != agent)
            .collect();
        self.rebuild(active, agents).await
    }

    /// Run the active shape's optimization step
    pub async fn optimize(&self) -> TopologyResult<Optimization> {
        let mut state = self.state.write().await;
        let active = state.as_mut().ok_or(TopologyError::TopologyNotConfigured)?;

        let mut network = active.network.clone();
        let optimization = active.shape.optimize(&mut network);
        let updated_at = if optimization.changes > 0 { Utc::now() } else { active.updated_at };

        self.persist(&snapshot(active.shape.as_ref(), &network, updated_at)).await?;
        active.network = network;
        active.updated_at = updated_at;

        debug!(
            "Optimized {} topology for {:?}: expected improvement {:.3}",
            optimization.kind, optimization.objective, optimization.expected_improvement
        );
        Ok(optimization)
    }

    /// Snapshot of the current network
    pub async fn get_topology_info(&self) -> TopologyResult<TopologyInfo> {
        let state = self.state.read().await;
        state
            .as_ref()
            .map(ActiveTopology::info)
            .ok_or(TopologyError::TopologyNotConfigured)
    }

    /// Agents sharing a connection with `agent`
    pub async fn get_connected_agents(&self, agent: AgentId) -> TopologyResult<Vec<AgentId>> {
        let state = self.state.read().await;
        let active = state.as_ref().ok_or(TopologyError::TopologyNotConfigured)?;
        if !active.network.contains(agent) {
            return Err(TopologyError::AgentNotFound(agent));
        }
        Ok(active.network.neighbours(agent))
    }

    /// Whether `a` and `b` share a connection
    pub async fn are_connected(&self, a: AgentId, b: AgentId) -> TopologyResult<bool> {
        let state = self.state.read().await;
        let active = state.as_ref().ok_or(TopologyError::TopologyNotConfigured)?;
        Ok(active.network.are_connected(a, b))
    }

    /// Whether `agent` is part of the configured network
    pub async fn contains(&self, agent: AgentId) -> TopologyResult<bool> {
        let state = self.state.read().await;
        let active = state.as_ref().ok_or(TopologyError::TopologyNotConfigured)?;
        Ok(active.network.contains(agent))
    }

    /// Active shape, if configured
    pub async fn kind(&self) -> Option<TopologyKind> {
        self.state.read().await.as_ref().map(|a| a.shape.kind())
    }

    async fn rebuild(
        &self,
        active: &mut ActiveTopology,
        agents: Vec<AgentId>,
    ) -> TopologyResult<TopologyInfo> {
        let network = self.build_network(active.shape.as_ref(), agents);
        let updated_at = Utc::now();
        let info = snapshot(active.shape.as_ref(), &network, updated_at);
        self.persist(&info).await?;

        active.network = network;
        active.updated_at = updated_at;
        counter!("hivemind_topology_rebuilds_total", "kind" => info.kind.as_str()).increment(1);
        debug!("Rebuilt {} topology with {} agents", info.kind, info.agents.len());
        Ok(info)
    }

    fn build_network(&self, shape: &dyn TopologyShape, agents: Vec<AgentId>) -> Network {
        let connections = {
            let mut rng = self.rng.lock();
            shape.build(&agents, &mut rng)
        };
        let metrics = shape.metrics(&agents, &connections);

        let kind = shape.kind().as_str();
        gauge!("hivemind_topology_agents", "kind" => kind).set(metrics.agent_count as f64);
        gauge!("hivemind_topology_connections", "kind" => kind).set(metrics.connection_count as f64);
        gauge!("hivemind_topology_latency_ms", "kind" => kind).set(metrics.average_latency_ms);
        gauge!("hivemind_topology_reliability", "kind" => kind).set(metrics.reliability);

        Network {
            agents,
            connections,
            metrics,
        }
    }

    async fn persist(&self, info: &TopologyInfo) -> TopologyResult<()> {
        self.storage
            .store_json(SNAPSHOT_KEY, info, namespaces::TOPOLOGY)
            .await?;
        Ok(())
    }
}
