//! Agent registry: lifecycle, capability-based assignment and performance tracking

use crate::config::RegistryConfig;
use crate::error::{SwarmError, SwarmResult};
use crate::executor::TaskExecutor;
use crate::matching::{exact_matches, satisfies, unmet};
use crate::types::*;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use hivemind_consensus::{ConsensusResult, Voter, VoterDirectory};
use hivemind_storage::{namespaces, KeyValueStore, KeyValueStoreExt};
use metrics::{counter, gauge, histogram};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{oneshot, Mutex};
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Key of the latest monitoring snapshot in the metrics namespace
const MONITOR_KEY: &str = "registry:latest";

fn agent_key(id: AgentId) -> String {
    format!("agent:{id}")
}

fn assignment_key(id: AssignmentId) -> String {
    format!("assignment:{id}")
}

/// Restrictions applied to one `coordinate_with` call
#[derive(Debug, Clone, Default)]
pub struct CoordinationOptions {
    /// Only consider these agents, in this order
    pub candidates: Option<Vec<AgentId>>,
    /// Overrides the task deadline and the registry default
    pub deadline: Option<DateTime<Utc>>,
    /// Overrides the default reservation
    pub resources: Option<ResourceReservation>,
}

struct InFlight {
    assignment: Assignment,
    abort: AbortHandle,
}

/// Score used to rank eligible agents for a task
pub fn score_agent(agent: &Agent, task: &Task) -> f64 {
    let perf = &agent.performance;
    let response_secs = perf.avg_response_time_ms / 1000.0;
    let mut score = 40.0 * perf.success_rate
        + 2.0 * (20.0 - response_secs).max(0.0)
        + 3.0 * (10.0 - agent.active_tasks as f64).max(0.0)
        + 5.0 * exact_matches(&agent.capabilities, &task.required_capabilities) as f64;

    match (task.priority, agent.agent_type) {
        (Priority::Critical, AgentType::Coordinator) => score += 10.0,
        (Priority::High, AgentType::Coordinator | AgentType::Optimizer) => score += 5.0,
        _ => {}
    }
    score
}

fn can_accept(agent: &Agent) -> bool {
    agent.status.is_available() && agent.active_tasks < agent.max_concurrency
}

fn is_eligible(agent: &Agent, task: &Task) -> bool {
    can_accept(agent) && satisfies(&agent.capabilities, &task.required_capabilities)
}

fn settle_status(agent: &mut Agent) {
    if matches!(agent.status, AgentStatus::Terminated | AgentStatus::Error) {
        return;
    }
    agent.status = if agent.active_tasks == 0 {
        AgentStatus::Idle
    } else if agent.active_tasks >= agent.max_concurrency {
        AgentStatus::Busy
    } else {
        AgentStatus::Active
    };
}

/// Owns agents and matches tasks to them
pub struct AgentRegistry {
    agents: Arc<DashMap<AgentId, Arc<Mutex<Agent>>>>,
    order: RwLock<Vec<AgentId>>,
    in_flight: Arc<DashMap<AssignmentId, InFlight>>,
    executor: Arc<dyn TaskExecutor>,
    storage: Arc<dyn KeyValueStore>,
    config: RegistryConfig,
    started: Instant,
}

impl AgentRegistry {
    pub fn new(
        storage: Arc<dyn KeyValueStore>,
        executor: Arc<dyn TaskExecutor>,
        config: RegistryConfig,
    ) -> Self {
        Self {
            agents: Arc::new(DashMap::new()),
            order: RwLock::new(Vec::new()),
            in_flight: Arc::new(DashMap::new()),
            executor,
            storage,
            config,
            started: Instant::now(),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Create, persist and register an agent
    pub async fn spawn(&self, agent_type: AgentType, config: AgentConfig) -> SwarmResult<Agent> {
        let id = Uuid::new_v4();
        let capabilities = config.capabilities.unwrap_or_else(|| {
            agent_type
                .default_capabilities()
                .iter()
                .map(|c| c.to_string())
                .collect()
        });
        let name = config
            .name
            .unwrap_or_else(|| format!("{}-{}", agent_type, &id.simple().to_string()[..8]));

        let mut agent = Agent {
            id,
            name,
            agent_type,
            capabilities,
            status: AgentStatus::Spawning,
            max_concurrency: config
                .max_concurrency
                .unwrap_or(self.config.max_concurrency)
                .max(1),
            active_tasks: 0,
            performance: AgentPerformance::default(),
            created_at: Utc::now(),
        };
        debug!("Spawning {} agent {}", agent_type, id);

        agent.status = AgentStatus::Idle;
        self.storage
            .store_json(&agent_key(id), &agent, namespaces::AGENTS)
            .await?;
        self.agents.insert(id, Arc::new(Mutex::new(agent.clone())));
        self.order.write().push(id);

        counter!("hivemind_registry_agents_spawned_total", "type" => agent_type.as_str())
            .increment(1);
        gauge!("hivemind_registry_agents").set(self.agents.len() as f64);
        info!("Agent {} ({}) spawned with capabilities {:?}", agent.name, id, agent.capabilities);
        Ok(agent)
    }

    /// Assign `task` to the best eligible agent and run it to completion
    pub async fn coordinate(&self, task: &Task) -> SwarmResult<TaskResult> {
        self.coordinate_with(task, CoordinationOptions::default()).await
    }

    /// Like [`coordinate`](Self::coordinate), with per-call restrictions.
    ///
    /// `Err(NoSuitableAgent)` means nobody could take the task. Once an agent
    /// is chosen the call returns `Ok` and the result's outcome says whether
    /// the task succeeded, failed, timed out or was cancelled.
    pub async fn coordinate_with(
        &self,
        task: &Task,
        options: CoordinationOptions,
    ) -> SwarmResult<TaskResult> {
        let pool = match options.candidates {
            Some(ids) => ids,
            None => self.order.read().clone(),
        };
        let agent = self.reserve(task, &pool).await?;

        let now = Utc::now();
        let deadline = options.deadline.or(task.deadline).unwrap_or_else(|| {
            now + chrono::Duration::seconds(self.config.assignment_timeout_secs as i64)
        });
        let assignment = Assignment {
            id: Uuid::new_v4(),
            task_id: task.id,
            agent_id: agent.id,
            deadline,
            resources: options.resources.unwrap_or_default(),
            assigned_at: now,
        };
        let budget = (deadline - now).to_std().unwrap_or(Duration::ZERO);
        let id = assignment.id;

        // The run owns its cleanup. Dropping this future closes `_caller`,
        // which cancels the execution but still releases the agent.
        let (_caller, dropped) = oneshot::channel::<()>();
        let run = tokio::spawn(self.ledger().run(
            agent,
            task.clone(),
            assignment,
            budget,
            self.executor.clone(),
            dropped,
        ));
        run.await.map_err(|e| {
            SwarmError::Other(anyhow::anyhow!("assignment {} aborted: {}", id, e))
        })?
    }

    /// Cancel an agent's in-flight assignments and remove it.
    /// Returns the number of cancelled assignments.
    pub async fn shutdown(&self, agent_id: AgentId) -> SwarmResult<usize> {
        let (_, slot) = self
            .agents
            .remove(&agent_id)
            .ok_or(SwarmError::AgentNotFound(agent_id))?;
        self.order.write().retain(|id| *id != agent_id);
        slot.lock().await.status = AgentStatus::Terminated;

        let doomed: Vec<AssignmentId> = self
            .in_flight
            .iter()
            .filter(|entry| entry.assignment.agent_id == agent_id)
            .map(|entry| *entry.key())
            .collect();
        for id in &doomed {
            if let Some((_, flight)) = self.in_flight.remove(id) {
                flight.abort.abort();
            }
            self.storage
                .delete(&assignment_key(*id), namespaces::AGENTS)
                .await?;
        }

        self.storage
            .delete(&agent_key(agent_id), namespaces::AGENTS)
            .await?;
        gauge!("hivemind_registry_agents").set(self.agents.len() as f64);
        info!(
            "Agent {} shut down, {} assignments cancelled",
            agent_id,
            doomed.len()
        );
        Ok(doomed.len())
    }

    /// Aggregate per-agent metrics into system gauges and flag bottlenecks
    pub async fn monitor(&self) -> MonitorReport {
        let agents = self.list_agents().await;
        let n = agents.len();
        let mean = |f: &dyn Fn(&Agent) -> f64| -> f64 {
            if n == 0 {
                0.0
            } else {
                agents.iter().map(f).sum::<f64>() / n as f64
            }
        };

        let system = SystemMetrics {
            agent_count: n,
            active_agents: agents.iter().filter(|a| a.active_tasks > 0).count(),
            mean_memory: mean(&|a: &Agent| a.performance.resources.memory),
            mean_cpu: mean(&|a: &Agent| a.performance.resources.cpu),
            total_connections: agents
                .iter()
                .map(|a| a.performance.resources.connections as u64)
                .sum(),
        };

        let finished: u64 = agents
            .iter()
            .map(|a| a.performance.tasks_completed + a.performance.tasks_failed)
            .sum();
        let minutes = self.started.elapsed().as_secs_f64().max(1.0) / 60.0;
        let performance = PerformanceSummary {
            throughput_per_minute: finished as f64 / minutes,
            mean_latency_ms: mean(&|a: &Agent| a.performance.avg_response_time_ms),
            error_rate: if n == 0 {
                0.0
            } else {
                1.0 - mean(&|a: &Agent| a.performance.success_rate)
            },
        };

        let limits = &self.config.bottlenecks;
        let mut bottlenecks = Vec::new();
        for agent in &agents {
            let perf = &agent.performance;
            let checks = [
                (BottleneckKind::Cpu, perf.resources.cpu, limits.cpu, perf.resources.cpu > limits.cpu),
                (
                    BottleneckKind::Memory,
                    perf.resources.memory,
                    limits.memory,
                    perf.resources.memory > limits.memory,
                ),
                (
                    BottleneckKind::SuccessRate,
                    perf.success_rate,
                    limits.success_rate,
                    perf.success_rate < limits.success_rate,
                ),
                (
                    BottleneckKind::ResponseTime,
                    perf.avg_response_time_ms,
                    limits.response_time_ms,
                    perf.avg_response_time_ms > limits.response_time_ms,
                ),
            ];
            bottlenecks.extend(checks.into_iter().filter(|c| c.3).map(|(kind, value, threshold, _)| {
                Bottleneck {
                    agent_id: agent.id,
                    kind,
                    value,
                    threshold,
                }
            }));
        }

        gauge!("hivemind_registry_mean_cpu").set(system.mean_cpu);
        gauge!("hivemind_registry_mean_memory").set(system.mean_memory);
        gauge!("hivemind_registry_connections").set(system.total_connections as f64);
        gauge!("hivemind_registry_throughput_per_minute").set(performance.throughput_per_minute);
        gauge!("hivemind_registry_error_rate").set(performance.error_rate);
        gauge!("hivemind_registry_bottlenecks").set(bottlenecks.len() as f64);

        let report = MonitorReport {
            system,
            performance,
            bottlenecks,
            timestamp: Utc::now(),
        };
        if let Err(e) = self
            .storage
            .store_json(MONITOR_KEY, &report, namespaces::METRICS)
            .await
        {
            warn!("Failed to persist monitoring snapshot: {}", e);
        }
        report
    }

    /// Replace an agent's resource gauges
    pub async fn record_resource_usage(
        &self,
        agent_id: AgentId,
        usage: ResourceUsage,
    ) -> SwarmResult<()> {
        let slot = self.slot(agent_id).ok_or(SwarmError::AgentNotFound(agent_id))?;
        let mut agent = slot.lock().await;
        agent.performance.resources = usage;
        agent.performance.last_activity = Utc::now();
        Ok(())
    }

    /// Blend a 0-5 rating into the agent's quality score, returning the new score
    pub async fn apply_feedback(&self, agent_id: AgentId, rating: f64, rate: f64) -> SwarmResult<f64> {
        let slot = self.slot(agent_id).ok_or(SwarmError::AgentNotFound(agent_id))?;
        let mut agent = slot.lock().await;
        let target = rating.clamp(0.0, 5.0) / 5.0;
        let rate = rate.clamp(0.0, 1.0);
        let quality = &mut agent.performance.quality_score;
        *quality = (1.0 - rate) * *quality + rate * target;
        Ok(*quality)
    }

    pub async fn get_agent(&self, agent_id: AgentId) -> SwarmResult<Agent> {
        let slot = self.slot(agent_id).ok_or(SwarmError::AgentNotFound(agent_id))?;
        let agent = slot.lock().await.clone();
        Ok(agent)
    }

    /// All agents in spawn order
    pub async fn list_agents(&self) -> Vec<Agent> {
        let ids = self.order.read().clone();
        self.snapshot(&ids).await
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn contains(&self, agent_id: AgentId) -> bool {
        self.agents.contains_key(&agent_id)
    }

    /// Assignments currently executing, oldest first
    pub fn active_assignments(&self) -> Vec<Assignment> {
        let mut assignments: Vec<Assignment> = self
            .in_flight
            .iter()
            .map(|entry| entry.assignment.clone())
            .collect();
        assignments.sort_by_key(|a| a.assigned_at);
        assignments
    }

    /// Agents able to vote, with their track record
    pub async fn voters(&self) -> Vec<Voter> {
        self.list_agents()
            .await
            .into_iter()
            .filter(|a| !matches!(a.status, AgentStatus::Terminated | AgentStatus::Error))
            .map(|a| Voter {
                agent_id: a.id,
                success_rate: a.performance.success_rate,
                tasks_completed: a.performance.tasks_completed,
            })
            .collect()
    }

    fn slot(&self, agent_id: AgentId) -> Option<Arc<Mutex<Agent>>> {
        self.agents.get(&agent_id).map(|s| s.value().clone())
    }

    async fn snapshot(&self, ids: &[AgentId]) -> Vec<Agent> {
        let mut agents = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(slot) = self.slot(*id) {
                agents.push(slot.lock().await.clone());
            }
        }
        agents
    }

    /// Pick the best eligible agent and claim a concurrency slot on it
    async fn reserve(&self, task: &Task, pool: &[AgentId]) -> SwarmResult<Agent> {
        for _ in 0..=pool.len() {
            let agents = self.snapshot(pool).await;
            let mut best: Option<(&Agent, f64)> = None;
            for agent in agents.iter().filter(|a| is_eligible(a, task)) {
                let score = score_agent(agent, task);
                if best.map_or(true, |(_, top)| score > top) {
                    best = Some((agent, score));
                }
            }
            let Some((chosen, score)) = best else {
                return Err(self.no_suitable(task, &agents));
            };

            let Some(slot) = self.slot(chosen.id) else {
                continue;
            };
            let mut agent = slot.lock().await;
            if !is_eligible(&agent, task) {
                continue;
            }
            agent.active_tasks += 1;
            settle_status(&mut agent);
            agent.performance.last_activity = Utc::now();
            debug!("Selected agent {} for task {} (score {:.1})", agent.id, task.id, score);
            return Ok(agent.clone());
        }

        let agents = self.snapshot(pool).await;
        Err(self.no_suitable(task, &agents))
    }

    fn no_suitable(&self, task: &Task, agents: &[Agent]) -> SwarmError {
        // Report the gap of the closest available agent, first on ties
        let mut closest: Option<Vec<String>> = None;
        for agent in agents.iter().filter(|a| can_accept(a)) {
            let gap = unmet(&agent.capabilities, &task.required_capabilities);
            if closest.as_ref().map_or(true, |best| gap.len() < best.len()) {
                closest = Some(gap);
            }
        }
        counter!("hivemind_registry_unassignable_total").increment(1);
        SwarmError::NoSuitableAgent {
            task_id: task.id,
            unmet: closest.unwrap_or_else(|| task.required_capabilities.clone()),
        }
    }

    fn ledger(&self) -> Ledger {
        Ledger {
            agents: self.agents.clone(),
            in_flight: self.in_flight.clone(),
            storage: self.storage.clone(),
            learning_rate: self.config.learning_rate,
        }
    }
}

/// Registry state shared with running assignments
struct Ledger {
    agents: Arc<DashMap<AgentId, Arc<Mutex<Agent>>>>,
    in_flight: Arc<DashMap<AssignmentId, InFlight>>,
    storage: Arc<dyn KeyValueStore>,
    learning_rate: f64,
}

impl Ledger {
    /// Persist the assignment, execute it and settle the agent's record.
    /// Runs detached from the caller so cleanup happens even if the caller goes away.
    async fn run(
        self,
        agent: Agent,
        task: Task,
        assignment: Assignment,
        budget: Duration,
        executor: Arc<dyn TaskExecutor>,
        dropped: oneshot::Receiver<()>,
    ) -> SwarmResult<TaskResult> {
        if let Err(e) = self
            .storage
            .store_json(&assignment_key(assignment.id), &assignment, namespaces::AGENTS)
            .await
        {
            self.release(agent.id, None, 0).await;
            return Err(e.into());
        }
        info!(
            "Task {} assigned to agent {} as {}",
            task.id, agent.name, assignment.id
        );

        let started = Instant::now();
        let job = task.clone();
        let mut handle = tokio::spawn(async move {
            tokio::time::timeout(budget, executor.execute(&agent, &job)).await
        });
        let abort = handle.abort_handle();
        self.in_flight.insert(
            assignment.id,
            InFlight {
                assignment: assignment.clone(),
                abort: abort.clone(),
            },
        );

        let joined = tokio::select! {
            joined = &mut handle => joined,
            _ = dropped => {
                debug!("Caller of assignment {} went away, cancelling", assignment.id);
                abort.abort();
                handle.await
            }
        };
        let duration_ms = started.elapsed().as_millis() as u64;
        let (outcome, data, error, metadata) = match joined {
            Ok(Ok(Ok(output))) if output.success => {
                (TaskOutcome::Succeeded, output.data, None, output.metadata)
            }
            Ok(Ok(Ok(output))) => (
                TaskOutcome::Failed,
                output.data,
                Some(output.error.unwrap_or_else(|| "task reported failure".to_string())),
                output.metadata,
            ),
            Ok(Ok(Err(e))) => (TaskOutcome::Failed, None, Some(format!("{e:#}")), None),
            Ok(Err(_)) => {
                let timeout = SwarmError::AssignmentTimeout {
                    assignment: assignment.id,
                    task_id: task.id,
                    elapsed_ms: duration_ms,
                };
                warn!("{}", timeout);
                (TaskOutcome::TimedOut, None, Some(timeout.to_string()), None)
            }
            Err(e) if e.is_cancelled() => (
                TaskOutcome::Cancelled,
                None,
                Some(format!("assignment {} cancelled", assignment.id)),
                None,
            ),
            Err(e) => (TaskOutcome::Failed, None, Some(format!("executor panicked: {e}")), None),
        };

        self.in_flight.remove(&assignment.id);
        if let Err(e) = self
            .storage
            .delete(&assignment_key(assignment.id), namespaces::AGENTS)
            .await
        {
            warn!("Failed to clear assignment {}: {}", assignment.id, e);
        }
        self.release(assignment.agent_id, Some(outcome), duration_ms).await;

        let label = match outcome {
            TaskOutcome::Succeeded => "succeeded",
            TaskOutcome::Failed => "failed",
            TaskOutcome::TimedOut => "timed_out",
            TaskOutcome::Cancelled => "cancelled",
        };
        counter!("hivemind_registry_tasks_total", "outcome" => label).increment(1);
        histogram!("hivemind_registry_task_duration_ms").record(duration_ms as f64);
        debug!("Task {} finished as {} in {}ms", task.id, label, duration_ms);

        Ok(TaskResult {
            assignment,
            outcome,
            data,
            error,
            metadata,
            duration_ms,
            completed_at: Utc::now(),
        })
    }

    /// Return a concurrency slot and fold the outcome into the agent's record
    async fn release(&self, agent_id: AgentId, outcome: Option<TaskOutcome>, duration_ms: u64) {
        let Some(slot) = self.agents.get(&agent_id).map(|s| s.value().clone()) else {
            return;
        };
        let snapshot = {
            let mut agent = slot.lock().await;
            agent.active_tasks = agent.active_tasks.saturating_sub(1);
            let alpha = self.learning_rate;
            if let Some(outcome) = outcome.filter(|o| *o != TaskOutcome::Cancelled) {
                let perf = &mut agent.performance;
                let succeeded = outcome == TaskOutcome::Succeeded;
                if succeeded {
                    perf.tasks_completed += 1;
                } else {
                    perf.tasks_failed += 1;
                }
                perf.success_rate =
                    (1.0 - alpha) * perf.success_rate + alpha * if succeeded { 1.0 } else { 0.0 };
                perf.avg_response_time_ms =
                    (1.0 - alpha) * perf.avg_response_time_ms + alpha * duration_ms as f64;
            }
            agent.performance.last_activity = Utc::now();
            settle_status(&mut agent);
            agent.clone()
        };

        if let Err(e) = self
            .storage
            .store_json(&agent_key(agent_id), &snapshot, namespaces::AGENTS)
            .await
        {
            warn!("Failed to persist agent {}: {}", agent_id, e);
        }
    }
}

#[async_trait]
impl VoterDirectory for AgentRegistry {
    async fn eligible_voters(&self) -> ConsensusResult<Vec<Voter>> {
        Ok(self.voters().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{ExecutorOutput, SimulatedExecutor};
    use hivemind_storage::MemoryStore;

    fn registry() -> AgentRegistry {
        AgentRegistry::new(
            Arc::new(MemoryStore::new()),
            Arc::new(SimulatedExecutor::new(Duration::from_millis(1), 1.0, Some(3))),
            RegistryConfig::default(),
        )
    }

    fn agent(agent_type: AgentType, capabilities: &[&str]) -> Agent {
        Agent {
            id: Uuid::new_v4(),
            name: "scored".into(),
            agent_type,
            capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
            status: AgentStatus::Idle,
            max_concurrency: 3,
            active_tasks: 0,
            performance: AgentPerformance::default(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_score_formula() {
        let mut coder = agent(AgentType::Coder, &["programming", "debugging"]);
        coder.performance.success_rate = 0.5;
        coder.performance.avg_response_time_ms = 5000.0;
        coder.active_tasks = 2;
        let task = Task::new("build", ["programming"]);

        // 40*0.5 + 2*15 + 3*8 + 5*1
        assert!((score_agent(&coder, &task) - 79.0).abs() < 1e-9);
    }

    #[test]
    fn test_priority_bonus() {
        let coordinator = agent(AgentType::Coordinator, &["coordination"]);
        let optimizer = agent(AgentType::Optimizer, &["optimization"]);
        let task = Task::new("plan", ["coordination"]);
        let base = score_agent(&coordinator, &task);

        let critical = task.clone().with_priority(Priority::Critical);
        let high = task.clone().with_priority(Priority::High);
        assert_eq!(score_agent(&coordinator, &critical), base + 10.0);
        assert_eq!(score_agent(&coordinator, &high), base + 5.0);
        assert_eq!(
            score_agent(&optimizer, &high) - score_agent(&optimizer, &task),
            5.0
        );
        assert_eq!(score_agent(&optimizer, &critical), score_agent(&optimizer, &task));
    }

    #[test]
    fn test_settle_status_tracks_load() {
        let mut a = agent(AgentType::Coder, &[]);
        a.active_tasks = 1;
        settle_status(&mut a);
        assert_eq!(a.status, AgentStatus::Active);
        a.active_tasks = 3;
        settle_status(&mut a);
        assert_eq!(a.status, AgentStatus::Busy);
        a.active_tasks = 0;
        settle_status(&mut a);
        assert_eq!(a.status, AgentStatus::Idle);
    }

    #[tokio::test]
    async fn test_spawn_defaults() {
        let registry = registry();
        let coder = registry.spawn(AgentType::Coder, AgentConfig::default()).await.unwrap();

        assert_eq!(coder.status, AgentStatus::Idle);
        assert_eq!(coder.performance.success_rate, 1.0);
        assert_eq!(coder.max_concurrency, 3);
        assert!(coder.capabilities.iter().any(|c| c == "programming"));
        assert!(coder.name.starts_with("coder-"));
    }

    #[tokio::test]
    async fn test_success_updates_ema() {
        let registry = registry();
        let coder = registry.spawn(AgentType::Coder, AgentConfig::default()).await.unwrap();

        let result = registry
            .coordinate(&Task::new("implement", ["programming"]))
            .await
            .unwrap();
        assert!(result.is_success());

        let after = registry.get_agent(coder.id).await.unwrap();
        assert_eq!(after.performance.tasks_completed, 1);
        assert!((after.performance.success_rate - 1.0).abs() < 1e-12);
        assert_eq!(after.status, AgentStatus::Idle);
        assert!(registry.active_assignments().is_empty());
    }

    #[tokio::test]
    async fn test_executor_error_counts_as_failure() {
        struct Broken;

        #[async_trait]
        impl TaskExecutor for Broken {
            async fn execute(&self, _: &Agent, _: &Task) -> anyhow::Result<ExecutorOutput> {
                anyhow::bail!("toolchain missing")
            }
        }

        let registry = AgentRegistry::new(
            Arc::new(MemoryStore::new()),
            Arc::new(Broken),
            RegistryConfig::default(),
        );
        let tester = registry.spawn(AgentType::Tester, AgentConfig::default()).await.unwrap();

        let result = registry.coordinate(&Task::new("test", ["testing"])).await.unwrap();
        assert_eq!(result.outcome, TaskOutcome::Failed);
        assert!(result.error.unwrap().contains("toolchain missing"));

        let after = registry.get_agent(tester.id).await.unwrap();
        assert!((after.performance.success_rate - 0.9).abs() < 1e-12);
        assert_eq!(after.performance.tasks_failed, 1);
    }

    #[tokio::test]
    async fn test_feedback_blends_quality() {
        let registry = registry();
        let a = registry.spawn(AgentType::Reviewer, AgentConfig::default()).await.unwrap();

        let quality = registry.apply_feedback(a.id, 5.0, 0.5).await.unwrap();
        assert!((quality - 0.75).abs() < 1e-12);
        assert!(matches!(
            registry.apply_feedback(Uuid::new_v4(), 5.0, 0.5).await,
            Err(SwarmError::AgentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_monitor_flags_bottlenecks() {
        let registry = registry();
        let hot = registry.spawn(AgentType::Monitor, AgentConfig::default()).await.unwrap();
        registry.spawn(AgentType::Analyst, AgentConfig::default()).await.unwrap();
        registry
            .record_resource_usage(
                hot.id,
                ResourceUsage {
                    cpu: 95.0,
                    memory: 40.0,
                    connections: 4,
                },
            )
            .await
            .unwrap();

        let report = registry.monitor().await;
        assert_eq!(report.system.agent_count, 2);
        assert_eq!(report.system.total_connections, 4);
        assert!((report.system.mean_cpu - 47.5).abs() < 1e-9);
        assert_eq!(report.bottlenecks.len(), 1);
        assert_eq!(report.bottlenecks[0].kind, BottleneckKind::Cpu);
        assert_eq!(report.bottlenecks[0].agent_id, hot.id);
        assert_eq!(report.performance.error_rate, 0.0);
    }

    #[tokio::test]
    async fn test_voters_follow_spawn_order() {
        let registry = registry();
        let first = registry.spawn(AgentType::Coder, AgentConfig::default()).await.unwrap();
        let second = registry.spawn(AgentType::Tester, AgentConfig::default()).await.unwrap();

        let voters = registry.eligible_voters().await.unwrap();
        assert_eq!(
            voters.iter().map(|v| v.agent_id).collect::<Vec<_>>(),
            vec![first.id, second.id]
        );
    }
}
