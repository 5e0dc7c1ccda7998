//! Configuration for the swarm and its collaborators
//!
//! Every section implements `Default`, so a TOML file only has to name the
//! values it changes:
//!
//! ```toml
//! [topology]
//! kind = "hierarchical"
//!
//! [consensus]
//! algorithm = "byzantine-tolerant"
//!
//! [hive]
//! specializations = ["research", "programming", "testing"]
//! pool_capacity = 8
//! ```

use crate::error::{SwarmError, SwarmResult};
use crate::{DEFAULT_LEARNING_RATE, DEFAULT_MAX_CONCURRENCY};
use hivemind_consensus::{AlgorithmKind, SimulationSettings};
use hivemind_storage::StorageConfig;
use hivemind_topology::TopologyKind;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HiveMindConfig {
    /// Storage backend
    pub storage: StorageConfig,
    /// Network shape
    pub topology: TopologySettings,
    /// Consensus protocol and vote simulation
    pub consensus: ConsensusSettings,
    /// Agent registry
    pub registry: RegistryConfig,
    /// Hive and worker pools
    pub hive: HiveConfig,
}

impl HiveMindConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> SwarmResult<Self> {
        let config: Self = toml::from_str(source)
            .map_err(|e| SwarmError::InvalidConfiguration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> SwarmResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            SwarmError::InvalidConfiguration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&source)
    }

    /// Reject out-of-range values
    pub fn validate(&self) -> SwarmResult<()> {
        self.consensus.validate()?;
        self.registry.validate()?;
        self.hive.validate()
    }
}

/// Network shape settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologySettings {
    /// Shape configured at startup
    pub kind: TopologyKind,
    /// Seed for latency sampling
    pub seed: Option<u64>,
}

impl Default for TopologySettings {
    fn default() -> Self {
        Self {
            kind: TopologyKind::Mesh,
            seed: None,
        }
    }
}

/// Consensus settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusSettings {
    /// Protocol selected at startup
    pub algorithm: AlgorithmKind,
    /// Parameters for simulated voting. Protocol presets apply when absent.
    pub simulation: Option<SimulationSettings>,
    /// Seed for the preset simulated vote sources
    pub seed: Option<u64>,
}

impl Default for ConsensusSettings {
    fn default() -> Self {
        Self {
            algorithm: AlgorithmKind::LeaderBased,
            simulation: None,
            seed: None,
        }
    }
}

impl ConsensusSettings {
    /// Reject simulation parameters the vote sampler cannot use
    pub fn validate(&self) -> SwarmResult<()> {
        match &self.simulation {
            Some(simulation) => simulation
                .validate()
                .map_err(|e| SwarmError::InvalidConfiguration(format!("consensus.simulation: {}", e))),
            None => Ok(()),
        }
    }
}

/// Limits above which an agent is reported as a bottleneck
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BottleneckThresholds {
    /// CPU usage in percent
    pub cpu: f64,
    /// Memory usage in percent
    pub memory: f64,
    /// Success rate below this is flagged
    pub success_rate: f64,
    /// Mean response time
    pub response_time_ms: f64,
}

impl Default for BottleneckThresholds {
    fn default() -> Self {
        Self {
            cpu: 80.0,
            memory: 80.0,
            success_rate: 0.8,
            response_time_ms: 5000.0,
        }
    }
}

/// Agent registry settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Concurrency limit for agents that do not set their own
    pub max_concurrency: usize,
    /// EMA learning rate for success rate and response time
    pub learning_rate: f64,
    /// Deadline applied to tasks without one
    pub assignment_timeout_secs: u64,
    /// Limits used by `monitor`
    pub bottlenecks: BottleneckThresholds,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            learning_rate: DEFAULT_LEARNING_RATE,
            assignment_timeout_secs: 300,
            bottlenecks: BottleneckThresholds::default(),
        }
    }
}

impl RegistryConfig {
    pub fn assignment_timeout(&self) -> Duration {
        Duration::from_secs(self.assignment_timeout_secs)
    }

    pub fn validate(&self) -> SwarmResult<()> {
        check_rate("registry.learning_rate", self.learning_rate)?;
        if self.max_concurrency == 0 {
            return Err(SwarmError::InvalidConfiguration(
                "registry.max_concurrency must be at least 1".into(),
            ));
        }
        if self.assignment_timeout_secs == 0 {
            return Err(SwarmError::InvalidConfiguration(
                "registry.assignment_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Hive settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HiveConfig {
    /// One worker pool per entry
    pub specializations: Vec<String>,
    /// Initial capacity of every pool
    pub pool_capacity: usize,
    /// Blend factor applied by `adapt`
    pub adaptation_rate: f64,
    /// Derive a strategy when an objective is set
    pub strategic_planning: bool,
    /// Ask the consensus engine before executing an objective
    pub require_consensus: bool,
}

impl Default for HiveConfig {
    fn default() -> Self {
        Self {
            specializations: ["research", "planning", "programming", "testing"]
                .into_iter()
                .map(String::from)
                .collect(),
            pool_capacity: 5,
            adaptation_rate: 0.1,
            strategic_planning: true,
            require_consensus: false,
        }
    }
}

impl HiveConfig {
    pub fn validate(&self) -> SwarmResult<()> {
        check_rate("hive.adaptation_rate", self.adaptation_rate)?;
        if self.pool_capacity == 0 {
            return Err(SwarmError::InvalidConfiguration(
                "hive.pool_capacity must be at least 1".into(),
            ));
        }
        if self.specializations.iter().any(|s| s.trim().is_empty()) {
            return Err(SwarmError::InvalidConfiguration(
                "hive.specializations must not contain blank names".into(),
            ));
        }
        Ok(())
    }
}

fn check_rate(name: &str, value: f64) -> SwarmResult<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(SwarmError::InvalidConfiguration(format!(
            "{name} must be in (0, 1], got {value}"
        )))
    }
}
