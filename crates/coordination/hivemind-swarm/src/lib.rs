//! # HiveMind Swarm
//!
//! Agent lifecycle, capability-based task assignment and queen-led
//! orchestration of objectives across specialized worker pools.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │               HiveMind                  │
//! ├─────────────────────────────────────────┤
//! │  Hive (queen)  │  strategies, pools     │
//! ├─────────────────────────────────────────┤
//! │  Agent Registry │ Consensus │ Topology  │
//! ├─────────────────────────────────────────┤
//! │           Key/value storage             │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use hivemind_swarm::prelude::*;
//!
//! # async fn run() -> SwarmResult<()> {
//! let hivemind = HiveMind::new(HiveMindConfig::default()).await?;
//! hivemind.spawn_agent(AgentType::Coder, AgentConfig::default()).await?;
//!
//! let task = Task::new("implement parser", ["programming"]);
//! let result = hivemind.coordinate(&task).await?;
//! println!("{:?}", result.outcome);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod hive;
pub mod hivemind;
pub mod matching;
pub mod pool;
pub mod registry;
pub mod strategy;
pub mod telemetry;
pub mod types;

pub use config::{
    BottleneckThresholds, ConsensusSettings, HiveConfig, HiveMindConfig, RegistryConfig,
    TopologySettings,
};
pub use error::{SwarmError, SwarmResult};
pub use executor::{ExecutorOutput, SimulatedExecutor, TaskExecutor};
pub use hive::{
    dependency_waves, ExecutionMetrics, ExecutionReport, Feedback, Hive, HiveStatus,
    ObjectiveStatus, TaskExecutionRecord, TaskStatus,
};
pub use hivemind::{HiveMind, HiveMindBuilder, HiveMindStatus};
pub use pool::{select_pool, PoolChoice, PoolStats, WorkerPool};
pub use registry::{score_agent, AgentRegistry, CoordinationOptions};
pub use strategy::{
    classify_complexity, classify_risk, complexity_score, plan, plan_at, risk_score, Complexity,
    Objective, Phase, PhaseKind, ResourceAllocation, Risk, RiskAssessment, RiskLevel, Strategy,
};
pub use telemetry::{describe_metrics, init_tracing};
pub use types::*;

/// Default EMA learning rate for agent performance
pub const DEFAULT_LEARNING_RATE: f64 = 0.1;

/// Default per-agent concurrency limit
pub const DEFAULT_MAX_CONCURRENCY: usize = 3;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        AgentConfig, AgentRegistry, AgentType, ExecutionReport, Feedback, Hive, HiveMind,
        HiveMindConfig, Objective, Priority, SwarmError, SwarmResult, Task, TaskExecutor,
        TaskOutcome, TaskResult,
    };
    pub use hivemind_consensus::{AlgorithmKind, Decision};
    pub use hivemind_topology::TopologyKind;
}
