//! Top-level facade wiring storage, topology, consensus, registry and hive

use crate::config::HiveMindConfig;
use crate::error::SwarmResult;
use crate::executor::{SimulatedExecutor, TaskExecutor};
use crate::hive::{ExecutionReport, Feedback, Hive, HiveStatus};
use crate::registry::AgentRegistry;
use crate::strategy::Objective;
use crate::types::*;
use async_trait::async_trait;
use hivemind_consensus::{
    AlgorithmKind, ConsensusEngine, ConsensusResult, ConsensusStats, Decision, DecisionId,
    DecisionStatus, SimulatedVoteSource, VoteSource, Voter, VoterDirectory,
};
use hivemind_storage::KeyValueStore;
use hivemind_topology::{Optimization, TopologyError, TopologyInfo, TopologyManager};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Registry voters restricted to agents that are part of the topology
struct TopologyVoterDirectory {
    registry: Arc<AgentRegistry>,
    topology: Arc<TopologyManager>,
}

#[async_trait]
impl VoterDirectory for TopologyVoterDirectory {
    async fn eligible_voters(&self) -> ConsensusResult<Vec<Voter>> {
        let mut voters = Vec::new();
        for voter in self.registry.voters().await {
            match self.topology.contains(voter.agent_id).await {
                Ok(true) | Err(TopologyError::TopologyNotConfigured) => voters.push(voter),
                _ => {}
            }
        }
        Ok(voters)
    }
}

/// Snapshot of the whole system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HiveMindStatus {
    /// Registered agents
    pub agents: usize,
    /// Assignments executing now
    pub active_assignments: usize,
    /// Active network, if configured
    pub topology: Option<TopologyInfo>,
    /// Selected consensus protocol
    pub algorithm: Option<AlgorithmKind>,
    /// Consensus totals
    pub consensus: ConsensusStats,
    /// Hive status
    pub hive: HiveStatus,
}

/// Builder for [`HiveMind`]
#[derive(Default)]
pub struct HiveMindBuilder {
    config: HiveMindConfig,
    storage: Option<Arc<dyn KeyValueStore>>,
    executor: Option<Arc<dyn TaskExecutor>>,
    votes: Option<Arc<dyn VoteSource>>,
}

impl HiveMindBuilder {
    pub fn new(config: HiveMindConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Use this store instead of building one from the config
    pub fn storage(mut self, storage: Arc<dyn KeyValueStore>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Run tasks through this executor instead of the simulated one
    pub fn executor(mut self, executor: Arc<dyn TaskExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Collect votes from this source for every protocol
    pub fn vote_source(mut self, votes: Arc<dyn VoteSource>) -> Self {
        self.votes = Some(votes);
        self
    }

    pub async fn build(self) -> SwarmResult<HiveMind> {
        let config = self.config;
        config.validate()?;

        let storage = match self.storage {
            Some(storage) => storage,
            None => config.storage.build().await?,
        };

        let topology = Arc::new(match config.topology.seed {
            Some(seed) => TopologyManager::with_seed(storage.clone(), seed),
            None => TopologyManager::new(storage.clone()),
        });
        topology.configure(config.topology.kind, Vec::new()).await?;

        let executor = self
            .executor
            .unwrap_or_else(|| Arc::new(SimulatedExecutor::default()));
        let registry = Arc::new(AgentRegistry::new(
            storage.clone(),
            executor,
            config.registry.clone(),
        ));

        let voters: Arc<dyn VoterDirectory> = Arc::new(TopologyVoterDirectory {
            registry: registry.clone(),
            topology: topology.clone(),
        });
        let consensus = match (self.votes, config.consensus.simulation.clone()) {
            (Some(votes), _) => ConsensusEngine::standard(storage.clone(), voters, votes),
            (None, Some(settings)) => ConsensusEngine::standard(
                storage.clone(),
                voters,
                Arc::new(SimulatedVoteSource::new(settings)),
            ),
            (None, None) => ConsensusEngine::simulated(storage.clone(), voters, config.consensus.seed),
        };
        consensus.select_algorithm(config.consensus.algorithm).await?;
        let consensus = Arc::new(consensus);

        let hive = Hive::new(registry.clone(), storage.clone(), config.hive.clone())
            .with_consensus(consensus.clone())
            .with_topology(topology.clone());

        info!(
            "HiveMind ready: {} topology, {} consensus, {} worker pools",
            config.topology.kind,
            config.consensus.algorithm,
            config.hive.specializations.len()
        );
        Ok(HiveMind {
            config,
            storage,
            topology,
            consensus,
            registry,
            hive,
        })
    }
}

/// Entry point for applications
pub struct HiveMind {
    config: HiveMindConfig,
    storage: Arc<dyn KeyValueStore>,
    topology: Arc<TopologyManager>,
    consensus: Arc<ConsensusEngine>,
    registry: Arc<AgentRegistry>,
    hive: Hive,
}

impl HiveMind {
    pub fn builder(config: HiveMindConfig) -> HiveMindBuilder {
        HiveMindBuilder::new(config)
    }

    /// Build with defaults for everything the config does not set
    pub async fn new(config: HiveMindConfig) -> SwarmResult<Self> {
        HiveMindBuilder::new(config).build().await
    }

    /// Load a TOML config and build from it
    pub async fn from_config_file(path: impl AsRef<Path>) -> SwarmResult<Self> {
        Self::new(HiveMindConfig::from_file(path)?).await
    }

    /// Spawn an agent and join it to the topology
    pub async fn spawn_agent(&self, agent_type: AgentType, config: AgentConfig) -> SwarmResult<Agent> {
        let agent = self.registry.spawn(agent_type, config).await?;
        if let Err(e) = self.topology.add_agent(agent.id).await {
            warn!("Agent {} could not join the topology: {}", agent.id, e);
            self.registry.shutdown(agent.id).await?;
            return Err(e.into());
        }
        Ok(agent)
    }

    /// Shut an agent down and drop it from the topology.
    /// Returns the number of cancelled assignments.
    pub async fn shutdown_agent(&self, agent_id: AgentId) -> SwarmResult<usize> {
        let cancelled = self.registry.shutdown(agent_id).await?;
        match self.topology.remove_agent(agent_id).await {
            Ok(_) | Err(TopologyError::AgentNotFound(_)) => Ok(cancelled),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn coordinate(&self, task: &Task) -> SwarmResult<TaskResult> {
        self.registry.coordinate(task).await
    }

    /// Put a decision to the active consensus protocol
    pub async fn propose(&self, decision: Decision) -> SwarmResult<DecisionId> {
        Ok(self.consensus.propose(decision).await?)
    }

    pub async fn decision_status(&self, id: DecisionId) -> SwarmResult<DecisionStatus> {
        Ok(self.consensus.get_status(id).await?)
    }

    pub async fn select_algorithm(&self, kind: AlgorithmKind) -> SwarmResult<()> {
        Ok(self.consensus.select_algorithm(kind).await?)
    }

    pub async fn set_objective(&self, objective: Objective) -> SwarmResult<ObjectiveId> {
        self.hive.set_objective(objective).await
    }

    pub async fn execute_objective(&self, id: ObjectiveId) -> SwarmResult<ExecutionReport> {
        self.hive.execute_objective(id).await
    }

    pub fn cancel_objective(&self, id: ObjectiveId) -> SwarmResult<()> {
        self.hive.cancel_objective(id)
    }

    pub async fn adapt(&self, feedback: &[Feedback]) -> SwarmResult<Vec<String>> {
        self.hive.adapt(feedback).await
    }

    pub async fn monitor(&self) -> MonitorReport {
        self.registry.monitor().await
    }

    pub async fn optimize_topology(&self) -> SwarmResult<Optimization> {
        Ok(self.topology.optimize().await?)
    }

    pub async fn status(&self) -> HiveMindStatus {
        let topology = match self.topology.get_topology_info().await {
            Ok(info) => Some(info),
            Err(TopologyError::TopologyNotConfigured) => None,
            Err(e) => {
                warn!("Topology unavailable: {}", e);
                None
            }
        };
        HiveMindStatus {
            agents: self.registry.agent_count(),
            active_assignments: self.registry.active_assignments().len(),
            topology,
            algorithm: self.consensus.active_algorithm(),
            consensus: self.consensus.stats(),
            hive: self.hive.get_status(),
        }
    }

    pub fn config(&self) -> &HiveMindConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<dyn KeyValueStore> {
        &self.storage
    }

    pub fn topology(&self) -> &Arc<TopologyManager> {
        &self.topology
    }

    pub fn consensus(&self) -> &Arc<ConsensusEngine> {
        &self.consensus
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    pub fn hive(&self) -> &Hive {
        &self.hive
    }
}
