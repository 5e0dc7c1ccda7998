//! Worker pools: named specializations owning a set of agents

use crate::matching::overlaps;
use crate::types::{AgentId, Task};
use serde::{Deserialize, Serialize};

/// Rolling pool performance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Tasks that succeeded
    pub tasks_completed: u64,
    /// Tasks that did not succeed
    pub tasks_failed: u64,
    /// Mean feedback quality in [0, 1]
    pub average_quality: f64,
    /// Completed over finished tasks
    pub success_rate: f64,
}

impl Default for PoolStats {
    fn default() -> Self {
        Self {
            tasks_completed: 0,
            tasks_failed: 0,
            average_quality: 0.5,
            success_rate: 1.0,
        }
    }
}

/// A named specialization owning a set of agents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerPool {
    /// Specialization, e.g. "testing"
    pub name: String,
    /// Concurrent tasks before the pool counts as full
    pub capacity: usize,
    /// Tasks currently dispatched through this pool
    pub utilization: usize,
    /// Member agents
    pub agents: Vec<AgentId>,
    /// Rolling performance
    pub stats: PoolStats,
    /// Dispatches accepted while already at capacity
    pub overcommits: u64,
}

impl WorkerPool {
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            name: name.into(),
            capacity,
            utilization: 0,
            agents: Vec::new(),
            stats: PoolStats::default(),
            overcommits: 0,
        }
    }

    /// Unused share of capacity
    pub fn idle_fraction(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.capacity.saturating_sub(self.utilization) as f64 / self.capacity as f64
    }

    /// `40 * success_rate + 30 * average_quality + 30 * idle_fraction`
    pub fn score(&self) -> f64 {
        40.0 * self.stats.success_rate + 30.0 * self.stats.average_quality + 30.0 * self.idle_fraction()
    }

    /// Whether the specialization overlaps the task's capabilities
    pub fn serves(&self, task: &Task) -> bool {
        overlaps(&[self.name.as_str()], &task.required_capabilities)
    }

    pub fn has_room(&self) -> bool {
        self.utilization < self.capacity
    }

    pub fn utilization_ratio(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.utilization as f64 / self.capacity as f64
        }
    }

    /// Fold a finished task into the pool stats
    pub fn record(&mut self, succeeded: bool) {
        if succeeded {
            self.stats.tasks_completed += 1;
        } else {
            self.stats.tasks_failed += 1;
        }
        let total = self.stats.tasks_completed + self.stats.tasks_failed;
        self.stats.success_rate = self.stats.tasks_completed as f64 / total as f64;
    }

    /// Blend average quality toward `target` in [0, 1]
    pub fn adapt_quality(&mut self, target: f64, rate: f64) {
        let q = &mut self.stats.average_quality;
        *q = (1.0 - rate) * *q + rate * target.clamp(0.0, 1.0);
    }
}

/// Where a task goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolChoice {
    /// Position of the pool in the hive
    pub index: usize,
    /// The pool was already full
    pub overcommit: bool,
    /// No pool's specialization overlapped the task
    pub fallback: bool,
}

fn best(pools: &[WorkerPool], accept: impl Fn(&WorkerPool) -> bool) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, pool) in pools.iter().enumerate().filter(|(_, p)| accept(p)) {
        let score = pool.score();
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((i, score));
        }
    }
    best.map(|(i, _)| i)
}

/// Choose a pool for `task`.
///
/// Pools whose specialization overlaps the task win over the rest; within a
/// group, pools with spare capacity win over full ones, then the highest
/// score wins.
pub fn select_pool(pools: &[WorkerPool], task: &Task) -> Option<PoolChoice> {
    let fallback = !pools.iter().any(|p| p.serves(task));
    let eligible = |p: &WorkerPool| fallback || p.serves(task);

    if let Some(index) = best(pools, |p| eligible(p) && p.has_room()) {
        return Some(PoolChoice {
            index,
            overcommit: false,
            fallback,
        });
    }
    best(pools, eligible).map(|index| PoolChoice {
        index,
        overcommit: true,
        fallback,
    })
}
