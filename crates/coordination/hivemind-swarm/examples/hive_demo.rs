//! Walk through the main flows: spawn agents, assign a task, reach a
//! decision, and run an objective through the worker pools.
//!
//! ```bash
//! RUST_LOG=hivemind=debug cargo run -p hivemind-swarm --example hive_demo
//! ```

use hivemind_swarm::prelude::*;
use hivemind_swarm::{describe_metrics, init_tracing};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info")?;
    describe_metrics();

    let mut config = HiveMindConfig::default();
    config.topology.kind = TopologyKind::Hierarchical;
    config.consensus.algorithm = AlgorithmKind::ByzantineTolerant;
    config.consensus.seed = Some(7);
    let hivemind = HiveMind::new(config).await?;

    for agent_type in [AgentType::Coordinator, AgentType::Coder, AgentType::Tester] {
        let agent = hivemind.spawn_agent(agent_type, AgentConfig::default()).await?;
        println!("spawned {} ({})", agent.name, agent.id);
    }

    let task = Task::new("implement rate limiter", ["programming"]).with_priority(Priority::High);
    let result = hivemind.coordinate(&task).await?;
    println!("task finished as {:?} in {}ms", result.outcome, result.duration_ms);

    let coordinator = hivemind.registry().list_agents().await.remove(0);
    let decision = hivemind
        .propose(Decision::new(coordinator.id, json!({"action": "scale", "replicas": 3})))
        .await?;
    let status = hivemind.decision_status(decision).await?;
    println!("decision {} is {:?}", decision, status.status);

    let objective = Objective::new("launch billing dashboard")
        .with_subgoals(["usage charts", "invoices", "exports"])
        .with_constraints(["read-only database access"]);
    let id = hivemind.set_objective(objective).await?;
    let report = hivemind.execute_objective(id).await?;
    for record in &report.records {
        println!(
            "  task {} via {:<12} {:?}",
            record.task_id,
            record.pool.as_deref().unwrap_or("-"),
            record.status
        );
    }
    println!(
        "objective success={} rate={:.2} avg={:.1}ms",
        report.success, report.metrics.success_rate, report.metrics.average_execution_ms
    );

    let feedback: Vec<Feedback> = report
        .results
        .iter()
        .map(|r| Feedback::new(r.agent_id(), 4.5))
        .collect();
    let adapted = hivemind.adapt(&feedback).await?;
    println!("adapted pools: {}", adapted.join(", "));

    let monitor = hivemind.monitor().await;
    println!(
        "{} agents, {} bottlenecks, error rate {:.2}",
        monitor.system.agent_count,
        monitor.bottlenecks.len(),
        monitor.performance.error_rate
    );
    Ok(())
}
