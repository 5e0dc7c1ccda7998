//! Logging and metric descriptions

use crate::error::{SwarmError, SwarmResult};
use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};
use tracing_subscriber::{fmt, EnvFilter};

/// Install a global `fmt` subscriber.
///
/// `RUST_LOG` wins over `default_filter` when set. Fails if a global
/// subscriber is already installed.
pub fn init_tracing(default_filter: &str) -> SwarmResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| SwarmError::InvalidConfiguration(format!("log filter: {e}")))?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| SwarmError::Other(anyhow::anyhow!("tracing already initialised: {e}")))
}

/// Register descriptions for every metric the workspace emits with
/// whichever recorder is installed
pub fn describe_metrics() {
    describe_counter!("hivemind_consensus_proposals_total", "Decisions proposed");
    describe_counter!(
        "hivemind_consensus_outcomes_total",
        "Decisions tallied, by algorithm and outcome"
    );
    describe_counter!("hivemind_consensus_executions_total", "Approved decisions executed");
    describe_counter!(
        "hivemind_consensus_execution_failures_total",
        "Approved decisions a protocol refused to execute"
    );
    describe_histogram!("hivemind_consensus_confidence", "Aggregate confidence per decision");
    describe_gauge!("hivemind_consensus_average_confidence", "Running mean confidence");

    describe_gauge!("hivemind_topology_agents", Unit::Count, "Agents in the topology");
    describe_gauge!("hivemind_topology_connections", Unit::Count, "Links in the topology");
    describe_gauge!("hivemind_topology_latency_ms", Unit::Milliseconds, "Mean link latency");
    describe_gauge!("hivemind_topology_reliability", "Mean link reliability");
    describe_counter!("hivemind_topology_rebuilds_total", "Topology rebuilds");

    describe_gauge!("hivemind_registry_agents", Unit::Count, "Registered agents");
    describe_counter!("hivemind_registry_agents_spawned_total", "Agents spawned");
    describe_counter!("hivemind_registry_tasks_total", "Assignments finished, by outcome");
    describe_counter!(
        "hivemind_registry_unassignable_total",
        "Tasks no agent could take"
    );
    describe_histogram!(
        "hivemind_registry_task_duration_ms",
        Unit::Milliseconds,
        "Assignment wall time"
    );
    describe_gauge!("hivemind_registry_mean_cpu", Unit::Percent, "Mean agent CPU usage");
    describe_gauge!("hivemind_registry_mean_memory", Unit::Percent, "Mean agent memory usage");
    describe_gauge!("hivemind_registry_connections", Unit::Count, "Open agent connections");
    describe_gauge!(
        "hivemind_registry_throughput_per_minute",
        "Completed tasks per minute since start"
    );
    describe_gauge!("hivemind_registry_error_rate", "Failed share of finished tasks");
    describe_gauge!("hivemind_registry_bottlenecks", Unit::Count, "Bottlenecks in the last report");

    describe_counter!("hivemind_hive_objectives_total", "Objectives set");
    describe_counter!(
        "hivemind_hive_objectives_finished_total",
        "Objectives executed, by status"
    );
    describe_gauge!("hivemind_hive_pool_utilization", "In-flight tasks over pool capacity");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_filter_is_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let err = init_tracing("hivemind=notalevel").unwrap_err();
        assert!(matches!(err, SwarmError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_describe_without_recorder() {
        describe_metrics();
    }
}
