//! Task execution seam
//!
//! The registry treats execution as an opaque, possibly slow and possibly
//! failing call. Real deployments plug in a process or RPC invoker.

use crate::types::{Agent, Task};
use async_trait::async_trait;
use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

/// What an executor reports back for a task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutorOutput {
    /// Whether the task succeeded
    pub success: bool,
    /// Result payload
    pub data: Option<serde_json::Value>,
    /// Failure description
    pub error: Option<String>,
    /// Free-form execution details
    pub metadata: Option<serde_json::Value>,
}

impl ExecutorOutput {
    /// Successful output carrying `data`
    pub fn success(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            ..Self::default()
        }
    }

    /// Failed output with a message
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// Runs a task on behalf of an agent
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Execute `task` as `agent`. An `Err` counts as a failed task.
    async fn execute(&self, agent: &Agent, task: &Task) -> anyhow::Result<ExecutorOutput>;
}

/// Executor that sleeps and succeeds with a fixed probability
pub struct SimulatedExecutor {
    latency: Duration,
    success_probability: f64,
    rng: Mutex<StdRng>,
}

impl SimulatedExecutor {
    pub fn new(latency: Duration, success_probability: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            latency,
            success_probability: success_probability.clamp(0.0, 1.0),
            rng: Mutex::new(rng),
        }
    }
}

impl Default for SimulatedExecutor {
    fn default() -> Self {
        Self::new(Duration::from_millis(25), 0.95, None)
    }
}

#[async_trait]
impl TaskExecutor for SimulatedExecutor {
    async fn execute(&self, agent: &Agent, task: &Task) -> anyhow::Result<ExecutorOutput> {
        tokio::time::sleep(self.latency).await;
        let succeeded = self.rng.lock().gen_bool(self.success_probability);
        let output = if succeeded {
            ExecutorOutput::success(json!({
                "task": task.description,
                "agent": agent.name,
            }))
        } else {
            ExecutorOutput::failure(format!("{} could not finish '{}'", agent.name, task.description))
        };
        Ok(ExecutorOutput {
            metadata: Some(json!({ "agent_type": agent.agent_type.as_str() })),
            ..output
        })
    }
}
