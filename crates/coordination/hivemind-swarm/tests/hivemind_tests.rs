//! Integration tests for the assembled system

use async_trait::async_trait;
use hivemind_consensus::{ConsensusResult, ConsensusStatus, Vote, VoteSource, Voter};
use hivemind_storage::{namespaces, FileStore, KeyValueStore};
use hivemind_swarm::prelude::*;
use hivemind_swarm::{AgentId, SimulatedExecutor};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn quick() -> Arc<dyn TaskExecutor> {
    Arc::new(SimulatedExecutor::new(Duration::from_millis(1), 1.0, Some(21)))
}

/// Approves everything and remembers who was asked
#[derive(Default)]
struct RecordingVotes {
    asked: Mutex<Vec<AgentId>>,
}

#[async_trait]
impl VoteSource for RecordingVotes {
    async fn collect_votes(&self, _decision: &Decision, voters: &[Voter]) -> ConsensusResult<Vec<Vote>> {
        *self.asked.lock() = voters.iter().map(|v| v.agent_id).collect();
        Ok(voters
            .iter()
            .map(|v| Vote::new(v.agent_id, true, 0.9, "recorded"))
            .collect())
    }
}

#[tokio::test]
async fn test_spawned_agents_join_topology() {
    let hivemind = HiveMind::builder(HiveMindConfig::default())
        .executor(quick())
        .build()
        .await
        .unwrap();

    let coder = hivemind
        .spawn_agent(AgentType::Coder, AgentConfig::default())
        .await
        .unwrap();
    let tester = hivemind
        .spawn_agent(AgentType::Tester, AgentConfig::default())
        .await
        .unwrap();

    let topology = hivemind.topology();
    assert_eq!(topology.kind().await, Some(TopologyKind::Mesh));
    assert!(topology.are_connected(coder.id, tester.id).await.unwrap());

    let result = hivemind
        .coordinate(&Task::new("write parser", ["programming"]))
        .await
        .unwrap();
    assert_eq!(result.agent_id(), coder.id);

    assert_eq!(hivemind.shutdown_agent(tester.id).await.unwrap(), 0);
    assert!(!topology.contains(tester.id).await.unwrap());

    let status = hivemind.status().await;
    assert_eq!(status.agents, 1);
    assert_eq!(status.topology.unwrap().agents, vec![coder.id]);
    assert_eq!(status.algorithm, Some(AlgorithmKind::LeaderBased));
}

#[tokio::test]
async fn test_only_topology_members_vote() {
    let votes = Arc::new(RecordingVotes::default());
    let hivemind = HiveMind::builder(HiveMindConfig::default())
        .vote_source(votes.clone())
        .build()
        .await
        .unwrap();

    let member = hivemind
        .spawn_agent(AgentType::Coordinator, AgentConfig::default())
        .await
        .unwrap();
    // registered directly, so never joins the network
    let loner = hivemind
        .registry()
        .spawn(AgentType::Analyst, AgentConfig::default())
        .await
        .unwrap();

    let id = hivemind
        .propose(Decision::new(member.id, json!({"action": "rebalance"})))
        .await
        .unwrap();

    assert_eq!(*votes.asked.lock(), vec![member.id]);
    assert!(!votes.asked.lock().contains(&loner.id));
    let status = hivemind.decision_status(id).await.unwrap();
    assert_eq!(status.status, ConsensusStatus::Reached);
}

#[tokio::test]
async fn test_objective_through_facade() {
    let hivemind = HiveMind::builder(HiveMindConfig::default())
        .executor(quick())
        .build()
        .await
        .unwrap();

    let id = hivemind
        .set_objective(Objective::new("add search").with_subgoals(["index", "query"]))
        .await
        .unwrap();
    let report = hivemind.execute_objective(id).await.unwrap();
    assert!(report.success);

    // pool agents are part of the network
    let info = hivemind.topology().get_topology_info().await.unwrap();
    assert_eq!(info.agents.len(), 4);

    let tester = report.results.last().unwrap().agent_id();
    let adapted = hivemind.adapt(&[Feedback::new(tester, 4.0)]).await.unwrap();
    assert_eq!(adapted, vec!["testing".to_string()]);

    let monitor = hivemind.monitor().await;
    assert_eq!(monitor.system.agent_count, 4);
    assert!(monitor.bottlenecks.is_empty());
}

#[tokio::test]
async fn test_config_file_drives_wiring() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    let config_path = dir.path().join("hivemind.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
            [storage]
            backend = "file"
            path = '{}'

            [topology]
            kind = "star"
            seed = 4

            [consensus]
            algorithm = "gossip"

            [hive]
            specializations = ["research", "testing"]
            pool_capacity = 2
            "#,
            data.display()
        ),
    )
    .unwrap();

    let hivemind = HiveMind::from_config_file(&config_path).await.unwrap();
    let agent = hivemind
        .spawn_agent(AgentType::Researcher, AgentConfig::default())
        .await
        .unwrap();

    let status = hivemind.status().await;
    assert_eq!(status.algorithm, Some(AlgorithmKind::Gossip));
    assert_eq!(status.topology.unwrap().kind, TopologyKind::Star);
    let pools: Vec<String> = status.hive.pools.iter().map(|p| p.name.clone()).collect();
    assert_eq!(pools, vec!["research", "testing"]);

    // records outlive the instance
    drop(hivemind);
    let reopened = FileStore::open(&data).await.unwrap();
    let keys = reopened.list(namespaces::AGENTS).await.unwrap();
    assert_eq!(keys, vec![format!("agent:{}", agent.id)]);
    let selected = reopened
        .retrieve("active-algorithm", namespaces::CONSENSUS)
        .await
        .unwrap();
    assert_eq!(selected, Some(json!("gossip")));
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_wiring() {
    let mut config = HiveMindConfig::default();
    config.hive.pool_capacity = 0;
    assert!(matches!(
        HiveMind::new(config).await,
        Err(SwarmError::InvalidConfiguration(_))
    ));
}

#[tokio::test]
async fn test_unknown_agent_shutdown() {
    let hivemind = HiveMind::new(HiveMindConfig::default()).await.unwrap();
    assert!(matches!(
        hivemind.shutdown_agent(Uuid::new_v4()).await,
        Err(SwarmError::AgentNotFound(_))
    ));
}
