//! Background discovery tasks: lifecycle, cancellation and concurrency cap

use seven_degrees::{
    Algorithm, DiscoveryCoordinator, DiscoveryRequest, EdgeInput, Engine, EngineConfig, ErrorKind,
    NodeInput, NodeType, SearchStatus, TaskStatus,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

const CONFIG: &str = r#"
search:
  search_timeout_ms: 60000
  max_expansions: 10000000000
tasks:
  max_concurrent_tasks: 1
"#;

/// A 24-clique plus a leaf hanging off `k0`. Every clique node is two hops
/// from the leaf, but only through `k0`, so enumerating paths from `k0` walks
/// every simple path of the clique and finds nothing past the direct edge.
fn coordinator() -> DiscoveryCoordinator {
    let config = EngineConfig::from_yaml_str(CONFIG).unwrap();
    let engine = Engine::new(config).unwrap();

    let ids: Vec<String> = (0..24).map(|i| format!("k{}", i)).collect();
    for id in &ids {
        engine.upsert_node(NodeInput::new(id.clone(), NodeType::Person)).unwrap();
    }
    engine.upsert_node(NodeInput::new("leaf", NodeType::Grant)).unwrap();
    for i in 0..ids.len() {
        for j in i + 1..ids.len() {
            engine
                .upsert_edge(EdgeInput::new(ids[i].clone(), ids[j].clone(), "collaboration", 0.5))
                .unwrap();
        }
    }
    engine
        .upsert_edge(EdgeInput::new("k0", "leaf", "grant", 0.7))
        .unwrap();
    DiscoveryCoordinator::new(Arc::new(engine))
}

fn slow_request() -> DiscoveryRequest {
    DiscoveryRequest::new("k0", "leaf").with_algorithm(Algorithm::AllPaths)
}

async fn poll_until<F>(coordinator: &DiscoveryCoordinator, task_id: seven_degrees::TaskId, done: F)
where
    F: Fn(&seven_degrees::TaskSnapshot) -> bool,
{
    let started = Instant::now();
    loop {
        let snapshot = coordinator.status(task_id).unwrap();
        if done(&snapshot) {
            return;
        }
        assert!(started.elapsed() < Duration::from_secs(20), "task {} never settled", task_id);
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_stops_running_search() {
    let coordinator = coordinator();
    let task_id = coordinator.submit(slow_request()).unwrap();

    poll_until(&coordinator, task_id, |s| s.status == TaskStatus::Running).await;
    assert_eq!(coordinator.cancel(task_id).unwrap(), TaskStatus::Cancelled);

    // the worker notices the flag and hands back its partial response
    poll_until(&coordinator, task_id, |s| s.result.is_some()).await;
    let snapshot = coordinator.status(task_id).unwrap();
    assert_eq!(snapshot.status, TaskStatus::Cancelled);
    assert!(snapshot.finished_at.is_some());
    let result = snapshot.result.unwrap();
    assert_eq!(result.status, SearchStatus::Cancelled);
    assert!(result.paths.len() <= 1);

    // cancelling again is a no-op
    assert_eq!(coordinator.cancel(task_id).unwrap(), TaskStatus::Cancelled);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrency_cap_queues_second_task() {
    let coordinator = coordinator();
    let slow = coordinator.submit(slow_request()).unwrap();
    poll_until(&coordinator, slow, |s| s.status == TaskStatus::Running).await;

    let quick = coordinator.submit(DiscoveryRequest::new("k0", "k1")).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(coordinator.status(quick).unwrap().status, TaskStatus::Queued);

    coordinator.cancel(slow).unwrap();
    let done = tokio::time::timeout(Duration::from_secs(20), coordinator.wait(quick))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(done.status, TaskStatus::Completed);
    let result = done.result.unwrap();
    assert_eq!(result.paths[0].nodes, vec!["k0", "k1"]);
}

#[tokio::test]
async fn test_cancel_while_queued_never_runs() {
    let coordinator = coordinator();
    let task_id = coordinator.submit(slow_request()).unwrap();

    // nothing has yielded to the runtime yet, so the task is still queued
    assert_eq!(coordinator.status(task_id).unwrap().status, TaskStatus::Queued);
    assert_eq!(coordinator.cancel(task_id).unwrap(), TaskStatus::Cancelled);

    tokio::time::sleep(Duration::from_millis(20)).await;
    let snapshot = coordinator.status(task_id).unwrap();
    assert_eq!(snapshot.status, TaskStatus::Cancelled);
    assert!(snapshot.result.is_none());
}

#[tokio::test]
async fn test_submit_rejects_invalid_requests() {
    let coordinator = coordinator();

    let err = coordinator.submit(DiscoveryRequest::new("k0", "k0")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    let err = coordinator
        .submit(DiscoveryRequest::new("k0", "k1").with_max_degrees(9))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(coordinator.list().is_empty());

    // unknown ids need the graph, so they surface as a failed task
    let task_id = coordinator.submit(DiscoveryRequest::new("k0", "ghost")).unwrap();
    let snapshot = coordinator.wait(task_id).await.unwrap();
    assert_eq!(snapshot.status, TaskStatus::Failed);
    assert_eq!(snapshot.error.unwrap().kind, ErrorKind::InvalidInput);
}

#[tokio::test]
async fn test_unknown_task_and_purge() {
    let coordinator = coordinator();
    let missing = uuid::Uuid::new_v4();
    assert_eq!(coordinator.status(missing).unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(coordinator.cancel(missing).unwrap_err().kind(), ErrorKind::NotFound);

    let task_id = coordinator.submit(DiscoveryRequest::new("k3", "k9")).unwrap();
    let snapshot = coordinator.wait(task_id).await.unwrap();
    assert_eq!(snapshot.status, TaskStatus::Completed);
    assert_eq!(coordinator.list().len(), 1);
    assert!(coordinator.list()[0].result.is_none());

    assert_eq!(coordinator.purge_finished(Duration::from_secs(3600)), 0);
    assert_eq!(coordinator.purge_finished(Duration::ZERO), 1);
    assert_eq!(coordinator.status(task_id).unwrap_err().kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_run_returns_response_inline() {
    let coordinator = coordinator();
    let response = coordinator.run(DiscoveryRequest::new("k2", "k5")).await.unwrap();
    assert_eq!(response.paths[0].nodes, vec!["k2", "k5"]);
    assert_eq!(response.paths.len(), 1);
}
