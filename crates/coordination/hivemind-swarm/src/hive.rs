//! The hive: queen-level orchestration of objectives over worker pools
//!
//! ```text
//!  set_objective ──► plan ──► Strategy (phases → tasks)
//!                                  │
//!  execute_objective ──► dependency waves ──► wave 0 ─► wave 1 ─► ...
//!                                               │ (concurrent)
//!                                select_pool ─► coordinate_with(pool agents)
//! ```

use crate::config::HiveConfig;
use crate::error::{SwarmError, SwarmResult};
use crate::matching::satisfies;
use crate::pool::{select_pool, WorkerPool};
use crate::registry::{AgentRegistry, CoordinationOptions};
use crate::strategy::{plan, Objective, Strategy};
use crate::types::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::future::join_all;
use hivemind_consensus::{ConsensusEngine, ConsensusStatus, Decision, ExecutionRecord};
use hivemind_storage::{namespaces, KeyValueStore, KeyValueStoreExt};
use hivemind_topology::{TopologyError, TopologyManager};
use metrics::{counter, gauge};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A rating for work done by an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    /// Agent the rating is about
    pub source: AgentId,
    /// 0 to 5
    pub rating: f64,
    /// Optional free text
    pub comment: Option<String>,
}

impl Feedback {
    pub fn new(source: AgentId, rating: f64) -> Self {
        Self {
            source,
            rating,
            comment: None,
        }
    }
}

/// Lifecycle of an objective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectiveStatus {
    /// Stored, not started
    Planned,
    /// Waves are running
    Executing,
    /// Every task completed
    Completed,
    /// At least one task did not complete
    Failed,
    /// Stopped by `cancel_objective`
    Cancelled,
}

impl ObjectiveStatus {
    fn is_active(&self) -> bool {
        matches!(self, ObjectiveStatus::Planned | ObjectiveStatus::Executing)
    }
}

/// Final state of one task within an objective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// The task succeeded
    Completed,
    /// An agent ran the task and it failed
    Failed,
    /// The assignment deadline passed
    TimedOut,
    /// No agent could take the task
    NoSuitableAgent,
    /// Never dispatched or aborted
    Cancelled,
}

/// What happened to one task of an objective
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskExecutionRecord {
    /// Task this record is about
    pub task_id: TaskId,
    /// Pool the task was delegated through
    pub pool: Option<String>,
    /// Final state
    pub status: TaskStatus,
    /// Assignment, if an agent took the task
    pub assignment: Option<Assignment>,
    /// Executor result, if the task ran
    pub result: Option<TaskResult>,
    /// Failure description
    pub error: Option<String>,
}

impl TaskExecutionRecord {
    fn cancelled(task: &Task) -> Self {
        Self {
            task_id: task.id,
            pool: None,
            status: TaskStatus::Cancelled,
            assignment: None,
            result: None,
            error: Some("objective cancelled before dispatch".into()),
        }
    }
}

/// Summary numbers for an objective run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMetrics {
    /// Completed tasks over all tasks
    pub success_rate: f64,
    /// Mean duration of executed tasks
    pub average_execution_ms: f64,
    /// Tasks dispatched through each pool relative to its capacity
    pub pool_utilization: BTreeMap<String, f64>,
}

/// Outcome of `execute_objective`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Objective that ran
    pub objective_id: ObjectiveId,
    /// Every task completed
    pub success: bool,
    /// Assignments made, in completion order
    pub assignments: Vec<Assignment>,
    /// Results of executed tasks
    pub results: Vec<TaskResult>,
    /// One record per task, including undispatched ones
    pub records: Vec<TaskExecutionRecord>,
    /// Summary metrics
    pub metrics: ExecutionMetrics,
    /// Completion time
    pub finished_at: DateTime<Utc>,
}

/// Snapshot of the hive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HiveStatus {
    /// Worker pools in configuration order
    pub pools: Vec<WorkerPool>,
    /// Objectives planned or executing
    pub active_objectives: usize,
    /// Assignments made since the hive started
    pub total_assignments: u64,
    /// Mean average quality over all pools
    pub mean_quality: f64,
}

struct ObjectiveState {
    objective: Objective,
    strategy: Option<Strategy>,
    status: ObjectiveStatus,
    cancelled: Arc<AtomicBool>,
}

/// Group tasks into dependency waves.
///
/// A task lands in the wave after the latest wave holding one of its
/// dependencies. Tasks on a dependency cycle go into the first wave.
/// Dependencies outside `tasks` are ignored.
pub fn dependency_waves(tasks: &[Task]) -> Vec<Vec<Task>> {
    let index: HashMap<TaskId, usize> = tasks.iter().enumerate().map(|(i, t)| (t.id, i)).collect();
    let deps: Vec<Vec<usize>> = tasks
        .iter()
        .map(|t| t.dependencies.iter().filter_map(|d| index.get(d).copied()).collect())
        .collect();
    let cyclic: Vec<bool> = (0..tasks.len()).map(|i| reaches(&deps, i, i)).collect();

    let mut levels: Vec<Option<usize>> = vec![None; tasks.len()];
    for i in 0..tasks.len() {
        wave_of(i, &deps, &cyclic, &mut levels);
    }

    let mut waves: Vec<Vec<Task>> = Vec::new();
    for (task, level) in tasks.iter().zip(levels) {
        let level = level.unwrap_or(0);
        if waves.len() <= level {
            waves.resize_with(level + 1, Vec::new);
        }
        waves[level].push(task.clone());
    }
    waves
}

fn reaches(deps: &[Vec<usize>], from: usize, target: usize) -> bool {
    let mut seen = vec![false; deps.len()];
    let mut stack = deps[from].clone();
    while let Some(next) = stack.pop() {
        if next == target {
            return true;
        }
        if !std::mem::replace(&mut seen[next], true) {
            stack.extend(&deps[next]);
        }
    }
    false
}

fn wave_of(i: usize, deps: &[Vec<usize>], cyclic: &[bool], levels: &mut [Option<usize>]) -> usize {
    if let Some(level) = levels[i] {
        return level;
    }
    let level = if cyclic[i] {
        0
    } else {
        deps[i]
            .iter()
            .map(|&d| wave_of(d, deps, cyclic, levels) + 1)
            .max()
            .unwrap_or(0)
    };
    levels[i] = Some(level);
    level
}

/// A claimed unit of pool utilization. Dropping it unsettled gives the
/// unit back without recording an outcome.
struct PoolSlot<'a> {
    hive: &'a Hive,
    name: String,
    settled: bool,
}

impl PoolSlot<'_> {
    /// Give the unit back and record whether the task succeeded
    fn settle(mut self, succeeded: Option<bool>) {
        self.settled = true;
        self.hive.release_pool(&self.name, succeeded);
    }
}

impl Drop for PoolSlot<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.hive.release_pool(&self.name, None);
        }
    }
}

/// Queen coordinator owning the worker pools
pub struct Hive {
    id: Uuid,
    registry: Arc<AgentRegistry>,
    consensus: Option<Arc<ConsensusEngine>>,
    topology: Option<Arc<TopologyManager>>,
    storage: Arc<dyn KeyValueStore>,
    config: HiveConfig,
    pools: RwLock<Vec<WorkerPool>>,
    objectives: DashMap<ObjectiveId, ObjectiveState>,
    total_assignments: AtomicU64,
    staffing: Mutex<()>,
}

impl Hive {
    /// Create a hive with one pool per configured specialization
    pub fn new(registry: Arc<AgentRegistry>, storage: Arc<dyn KeyValueStore>, config: HiveConfig) -> Self {
        let pools = config
            .specializations
            .iter()
            .map(|name| WorkerPool::new(name.clone(), config.pool_capacity))
            .collect();
        Self {
            id: Uuid::new_v4(),
            registry,
            consensus: None,
            topology: None,
            storage,
            config,
            pools: RwLock::new(pools),
            objectives: DashMap::new(),
            total_assignments: AtomicU64::new(0),
            staffing: Mutex::new(()),
        }
    }

    /// Gate objective execution on this engine when `require_consensus` is set
    pub fn with_consensus(mut self, engine: Arc<ConsensusEngine>) -> Self {
        self.consensus = Some(engine);
        self
    }

    /// Register agents spawned into pools with this topology
    pub fn with_topology(mut self, topology: Arc<TopologyManager>) -> Self {
        self.topology = Some(topology);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Store an objective and, with strategic planning on, derive its strategy
    pub async fn set_objective(&self, objective: Objective) -> SwarmResult<ObjectiveId> {
        let id = objective.id;
        let strategy = self.config.strategic_planning.then(|| plan(&objective));

        self.storage
            .store_json(&format!("objective:{id}"), &objective, namespaces::HIVE_MIND)
            .await?;
        if let Some(strategy) = &strategy {
            self.persist_strategy(id, strategy).await?;
            info!(
                "Objective {} planned: {:?} complexity, {} phases, {:?} risk",
                id,
                strategy.complexity,
                strategy.phases.len(),
                strategy.risk.level
            );
        } else {
            info!("Objective {} stored without a strategy", id);
        }

        self.objectives.insert(
            id,
            ObjectiveState {
                objective,
                strategy,
                status: ObjectiveStatus::Planned,
                cancelled: Arc::new(AtomicBool::new(false)),
            },
        );
        counter!("hivemind_hive_objectives_total").increment(1);
        Ok(id)
    }

    /// Attach a caller-built strategy to an objective
    pub async fn set_strategy(&self, id: ObjectiveId, strategy: Strategy) -> SwarmResult<()> {
        if !self.objectives.contains_key(&id) {
            return Err(SwarmError::ObjectiveNotFound(id));
        }
        self.persist_strategy(id, &strategy).await?;
        if let Some(mut state) = self.objectives.get_mut(&id) {
            state.strategy = Some(strategy);
        }
        Ok(())
    }

    pub fn objective(&self, id: ObjectiveId) -> Option<Objective> {
        self.objectives.get(&id).map(|s| s.objective.clone())
    }

    pub fn strategy(&self, id: ObjectiveId) -> Option<Strategy> {
        self.objectives.get(&id).and_then(|s| s.strategy.clone())
    }

    pub fn objective_status(&self, id: ObjectiveId) -> Option<ObjectiveStatus> {
        self.objectives.get(&id).map(|s| s.status)
    }

    /// Run every task of the objective's strategy, wave by wave
    pub async fn execute_objective(&self, id: ObjectiveId) -> SwarmResult<ExecutionReport> {
        let (objective, strategy, cancelled) = {
            let state = self
                .objectives
                .get(&id)
                .ok_or(SwarmError::ObjectiveNotFound(id))?;
            if state.cancelled.load(Ordering::SeqCst) {
                return Err(SwarmError::ObjectiveCancelled(id));
            }
            let strategy = state.strategy.clone().ok_or(SwarmError::StrategyMissing(id))?;
            (state.objective.clone(), strategy, state.cancelled.clone())
        };

        if self.config.require_consensus {
            self.seek_approval(&objective, &strategy).await?;
        }

        self.set_status(id, ObjectiveStatus::Executing);
        let records = match self.run_waves(id, &strategy, &cancelled).await {
            Ok(records) => records,
            Err(e) => {
                self.set_status(id, ObjectiveStatus::Failed);
                return Err(e);
            }
        };

        let report = self.report(id, records);
        let status = if cancelled.load(Ordering::SeqCst) {
            ObjectiveStatus::Cancelled
        } else if report.success {
            ObjectiveStatus::Completed
        } else {
            ObjectiveStatus::Failed
        };
        self.set_status(id, status);

        if let Err(e) = self
            .storage
            .store_json(&format!("execution:{id}"), &report, namespaces::HIVE_MIND)
            .await
        {
            warn!("Failed to persist execution report for {}: {}", id, e);
        }
        counter!(
            "hivemind_hive_objectives_finished_total",
            "status" => if report.success { "succeeded" } else { "failed" }
        )
        .increment(1);
        info!(
            "Objective {} finished: success={} ({} tasks, success rate {:.2})",
            id,
            report.success,
            report.records.len(),
            report.metrics.success_rate
        );
        Ok(report)
    }

    /// Stop dispatching further tasks for an objective
    pub fn cancel_objective(&self, id: ObjectiveId) -> SwarmResult<()> {
        let mut state = self
            .objectives
            .get_mut(&id)
            .ok_or(SwarmError::ObjectiveNotFound(id))?;
        state.cancelled.store(true, Ordering::SeqCst);
        if state.status.is_active() {
            state.status = ObjectiveStatus::Cancelled;
        }
        info!("Objective {} cancelled", id);
        Ok(())
    }

    /// Blend pool quality toward the feedback its agents received.
    /// Returns the names of the adapted pools.
    pub async fn adapt(&self, feedback: &[Feedback]) -> SwarmResult<Vec<String>> {
        let rate = self.config.adaptation_rate;
        for item in feedback {
            match self.registry.apply_feedback(item.source, item.rating, rate).await {
                Ok(_) | Err(SwarmError::AgentNotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }

        let (adapted, snapshot) = {
            let mut pools = self.pools.write();
            let mut adapted = Vec::new();
            for pool in pools.iter_mut() {
                let ratings: Vec<f64> = feedback
                    .iter()
                    .filter(|f| pool.agents.contains(&f.source))
                    .map(|f| f.rating.clamp(0.0, 5.0))
                    .collect();
                if ratings.is_empty() {
                    continue;
                }
                let mean = ratings.iter().sum::<f64>() / ratings.len() as f64;
                pool.adapt_quality(mean / 5.0, rate);
                debug!(
                    "Pool {} quality now {:.3}",
                    pool.name, pool.stats.average_quality
                );
                adapted.push(pool.name.clone());
            }
            (adapted, pools.clone())
        };

        self.persist_pools(&snapshot).await;
        Ok(adapted)
    }

    /// Change a pool's capacity
    pub async fn scale_pool(&self, name: &str, capacity: usize) -> SwarmResult<WorkerPool> {
        if capacity == 0 {
            return Err(SwarmError::InvalidConfiguration(format!(
                "pool {name} capacity must be at least 1"
            )));
        }
        let (pool, snapshot) = {
            let mut pools = self.pools.write();
            let pool = pools
                .iter_mut()
                .find(|p| p.name == name)
                .ok_or_else(|| SwarmError::PoolNotFound(name.to_string()))?;
            pool.capacity = capacity;
            let pool = pool.clone();
            (pool, pools.clone())
        };
        info!("Pool {} scaled to {}", name, capacity);
        self.persist_pools(&snapshot).await;
        Ok(pool)
    }

    pub fn pools(&self) -> Vec<WorkerPool> {
        self.pools.read().clone()
    }

    pub fn get_status(&self) -> HiveStatus {
        let pools = self.pools();
        let mean_quality = if pools.is_empty() {
            0.0
        } else {
            pools.iter().map(|p| p.stats.average_quality).sum::<f64>() / pools.len() as f64
        };
        HiveStatus {
            active_objectives: self
                .objectives
                .iter()
                .filter(|s| s.status.is_active())
                .count(),
            total_assignments: self.total_assignments.load(Ordering::SeqCst),
            mean_quality,
            pools,
        }
    }

    async fn run_waves(
        &self,
        id: ObjectiveId,
        strategy: &Strategy,
        cancelled: &AtomicBool,
    ) -> SwarmResult<Vec<TaskExecutionRecord>> {
        let waves = dependency_waves(&strategy.tasks());
        let mut records = Vec::new();
        for (n, wave) in waves.iter().enumerate() {
            if cancelled.load(Ordering::SeqCst) {
                records.extend(wave.iter().map(TaskExecutionRecord::cancelled));
                continue;
            }
            debug!("Objective {} wave {}: {} tasks", id, n, wave.len());
            let outcomes = join_all(wave.iter().map(|task| self.delegate(task, cancelled))).await;
            for outcome in outcomes {
                records.push(outcome?);
            }
        }
        Ok(records)
    }

    async fn delegate(&self, task: &Task, cancelled: &AtomicBool) -> SwarmResult<TaskExecutionRecord> {
        if cancelled.load(Ordering::SeqCst) {
            return Ok(TaskExecutionRecord::cancelled(task));
        }
        let (slot, candidates) = self.claim_pool(task).await?;
        let pool = slot.name.clone();

        let options = CoordinationOptions {
            candidates: Some(candidates),
            ..CoordinationOptions::default()
        };
        let outcome = self.registry.coordinate_with(task, options).await;
        slot.settle(outcome.as_ref().ok().map(TaskResult::is_success));

        match outcome {
            Ok(result) => {
                self.total_assignments.fetch_add(1, Ordering::SeqCst);
                let status = match result.outcome {
                    TaskOutcome::Succeeded => TaskStatus::Completed,
                    TaskOutcome::Failed => TaskStatus::Failed,
                    TaskOutcome::TimedOut => TaskStatus::TimedOut,
                    TaskOutcome::Cancelled => TaskStatus::Cancelled,
                };
                Ok(TaskExecutionRecord {
                    task_id: task.id,
                    pool: Some(pool),
                    status,
                    assignment: Some(result.assignment.clone()),
                    error: result.error.clone(),
                    result: Some(result),
                })
            }
            Err(e @ SwarmError::NoSuitableAgent { .. }) => {
                warn!("Task {} unassigned in pool {}: {}", task.id, pool, e);
                Ok(TaskExecutionRecord {
                    task_id: task.id,
                    pool: Some(pool),
                    status: TaskStatus::NoSuitableAgent,
                    assignment: None,
                    result: None,
                    error: Some(e.to_string()),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Pick a pool for `task`, reserve a slot and make sure it has an agent
    /// able to take the task. Returns the slot and the pool's agents.
    async fn claim_pool(&self, task: &Task) -> SwarmResult<(PoolSlot<'_>, Vec<AgentId>)> {
        let _staffing = self.staffing.lock().await;

        let (name, members, capacity) = {
            let mut pools = self.pools.write();
            let choice = select_pool(&pools, task)
                .ok_or_else(|| SwarmError::PoolNotFound("no worker pools configured".into()))?;
            let pool = &mut pools[choice.index];
            pool.agents.retain(|id| self.registry.contains(*id));
            pool.utilization += 1;
            if choice.overcommit {
                pool.overcommits += 1;
                warn!("Pool {} overcommitted ({}/{})", pool.name, pool.utilization, pool.capacity);
            }
            if choice.fallback {
                debug!("No pool specializes in {:?}; using {}", task.required_capabilities, pool.name);
            }
            gauge!("hivemind_hive_pool_utilization", "pool" => pool.name.clone())
                .set(pool.utilization_ratio());
            (pool.name.clone(), pool.agents.clone(), pool.capacity)
        };
        let slot = PoolSlot {
            hive: self,
            name,
            settled: false,
        };

        let mut ready = false;
        for id in &members {
            if let Ok(agent) = self.registry.get_agent(*id).await {
                if agent.status.is_available()
                    && agent.active_tasks < agent.max_concurrency
                    && satisfies(&agent.capabilities, &task.required_capabilities)
                {
                    ready = true;
                    break;
                }
            }
        }
        if ready || members.len() >= capacity {
            return Ok((slot, members));
        }

        let agent = self.staff(&slot.name, task).await?;
        let mut pools = self.pools.write();
        let members = match pools.iter_mut().find(|p| p.name == slot.name) {
            Some(pool) => {
                pool.agents.push(agent.id);
                pool.agents.clone()
            }
            None => vec![agent.id],
        };
        drop(pools);
        Ok((slot, members))
    }

    /// Spawn an agent for a pool, able to take `task`
    async fn staff(&self, pool: &str, task: &Task) -> SwarmResult<Agent> {
        let agent_type = AgentType::for_specialization(pool);
        let mut capabilities: Vec<String> = Vec::new();
        let offered = agent_type
            .default_capabilities()
            .iter()
            .map(|c| c.to_string())
            .chain(std::iter::once(pool.to_string()))
            .chain(task.required_capabilities.iter().cloned());
        for capability in offered {
            if !capabilities.iter().any(|c| c.eq_ignore_ascii_case(&capability)) {
                capabilities.push(capability);
            }
        }

        let agent = self
            .registry
            .spawn(agent_type, AgentConfig::with_capabilities(capabilities))
            .await?;
        if let Some(topology) = &self.topology {
            match topology.add_agent(agent.id).await {
                Ok(_) | Err(TopologyError::TopologyNotConfigured) => {}
                Err(e) => return Err(e.into()),
            }
        }
        info!("Pool {} staffed with {} agent {}", pool, agent_type, agent.id);
        Ok(agent)
    }

    fn release_pool(&self, name: &str, succeeded: Option<bool>) {
        let mut pools = self.pools.write();
        if let Some(pool) = pools.iter_mut().find(|p| p.name == name) {
            pool.utilization = pool.utilization.saturating_sub(1);
            if let Some(succeeded) = succeeded {
                pool.record(succeeded);
            }
            gauge!("hivemind_hive_pool_utilization", "pool" => pool.name.clone())
                .set(pool.utilization_ratio());
        }
    }

    async fn seek_approval(&self, objective: &Objective, strategy: &Strategy) -> SwarmResult<()> {
        let engine = self.consensus.as_ref().ok_or_else(|| {
            SwarmError::InvalidConfiguration(
                "require_consensus is set but no consensus engine is attached".into(),
            )
        })?;

        let decision = Decision::new(
            self.id,
            json!({
                "objective": objective.id,
                "description": objective.description,
                "complexity": strategy.complexity,
                "risk": strategy.risk.level,
                "phases": strategy.phases.len(),
            }),
        );
        let decision_id = engine.propose(decision).await?;
        let status = engine.get_status(decision_id).await?;

        let reason = match (&status.status, &status.execution) {
            (ConsensusStatus::Reached, Some(ExecutionRecord::Executed(_))) => {
                debug!("Objective {} approved by decision {}", objective.id, decision_id);
                return Ok(());
            }
            (ConsensusStatus::Reached, Some(ExecutionRecord::Refused { reason })) => {
                format!("approved but not executed: {reason}")
            }
            (status, _) => format!("consensus {status:?}"),
        };
        warn!("Objective {} rejected: {}", objective.id, reason);
        Err(SwarmError::ObjectiveRejected {
            objective: objective.id,
            reason,
        })
    }

    fn report(&self, id: ObjectiveId, records: Vec<TaskExecutionRecord>) -> ExecutionReport {
        let results: Vec<TaskResult> = records.iter().filter_map(|r| r.result.clone()).collect();
        let assignments = results.iter().map(|r| r.assignment.clone()).collect();
        let completed = records
            .iter()
            .filter(|r| r.status == TaskStatus::Completed)
            .count();

        let success_rate = if records.is_empty() {
            1.0
        } else {
            completed as f64 / records.len() as f64
        };
        let average_execution_ms = if results.is_empty() {
            0.0
        } else {
            results.iter().map(|r| r.duration_ms as f64).sum::<f64>() / results.len() as f64
        };

        let mut dispatched: BTreeMap<String, usize> = BTreeMap::new();
        for pool in records.iter().filter(|r| r.assignment.is_some()).filter_map(|r| r.pool.as_ref()) {
            *dispatched.entry(pool.clone()).or_default() += 1;
        }
        let pool_utilization = self
            .pools
            .read()
            .iter()
            .map(|p| {
                let used = dispatched.get(&p.name).copied().unwrap_or(0);
                let ratio = if p.capacity == 0 { 0.0 } else { used as f64 / p.capacity as f64 };
                (p.name.clone(), ratio)
            })
            .collect();

        ExecutionReport {
            objective_id: id,
            success: completed == records.len(),
            assignments,
            results,
            records,
            metrics: ExecutionMetrics {
                success_rate,
                average_execution_ms,
                pool_utilization,
            },
            finished_at: Utc::now(),
        }
    }

    fn set_status(&self, id: ObjectiveId, status: ObjectiveStatus) {
        if let Some(mut state) = self.objectives.get_mut(&id) {
            if state.status == ObjectiveStatus::Cancelled && status == ObjectiveStatus::Executing {
                return;
            }
            state.status = status;
        }
    }

    async fn persist_strategy(&self, id: ObjectiveId, strategy: &Strategy) -> SwarmResult<()> {
        self.storage
            .store_json(&format!("strategy:{id}"), strategy, namespaces::HIVE_MIND)
            .await?;
        Ok(())
    }

    async fn persist_pools(&self, pools: &[WorkerPool]) {
        if let Err(e) = self
            .storage
            .store_json("pools", &pools, namespaces::HIVE_MIND)
            .await
        {
            warn!("Failed to persist pool state: {}", e);
        }
    }
}
