//! Ctrl+C coordination

use std::sync::Arc;
use std::time::Duration;

use gameday_ingest::config::IngestConfig;
use gameday_ingest::pipeline::{IngestPipeline, Sink, StageState};
use gameday_ingest::shutdown::ShutdownCoordinator;
use gameday_ingest::store::MemoryStore;
use gameday_ingest::transfer::http;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn shutdown_notifies_waiters() {
    let shutdown = ShutdownCoordinator::shared();
    let waiter = {
        let handle = shutdown.clone();
        tokio::spawn(async move {
            handle.wait_for_shutdown().await;
            true
        })
    };

    // Give the task time to start waiting
    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.request_shutdown();

    let result = tokio::time::timeout(Duration::from_secs(1), waiter).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn linked_token_is_cancelled_on_request() {
    let shutdown = ShutdownCoordinator::shared();
    let token = CancellationToken::new();
    shutdown.link(token.clone());

    shutdown.request_shutdown();
    let result = tokio::time::timeout(Duration::from_secs(1), token.cancelled()).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn shutdown_aborts_a_running_ingest() {
    let shutdown = ShutdownCoordinator::shared();
    let store = Arc::new(MemoryStore::new());
    let config = IngestConfig::default().with_remote_root("http://127.0.0.1:9/components/game/mlb");
    let client = http::build_client(Duration::from_secs(5)).unwrap();

    let pipeline = IngestPipeline::start(&config, client, vec![Sink::Database(store.clone())]).unwrap();
    shutdown.link(pipeline.abort_token());
    shutdown.request_shutdown();
    pipeline.abort_token().cancelled().await;

    let states = tokio::time::timeout(Duration::from_secs(5), pipeline.shutdown())
        .await
        .expect("aborted pipeline should shut down promptly");
    assert!(states.iter().all(|(_, state)| *state == StageState::Aborted), "{states:?}");
    assert!(store.is_empty().await);
}
