//! Transfer queue against a local fixture server

use std::time::{Duration, Instant};

use gameday_ingest::resolver::{GameId, ResourceResolver};
use gameday_ingest::transfer::{http, TransferQueue, TransferRequest};
use tempfile::TempDir;

use crate::support::{fixtures_dir, FixtureServer, FIXTURE_GAME};

#[tokio::test]
async fn queue_mirrors_files_and_counts_failures() {
    let server = FixtureServer::start().await;
    let mirror = TempDir::new().unwrap();
    let resolver = ResourceResolver::new(&server.remote_root(), mirror.path()).unwrap();

    let queue = TransferQueue::with_interval(Duration::ZERO);
    queue.use_client(http::build_client(Duration::from_secs(5)).unwrap()).unwrap();

    let game = GameId::parse(FIXTURE_GAME).unwrap();
    let files = resolver.locate_game(&game).unwrap();
    for location in files.iter().cloned() {
        queue.transfer(TransferRequest::from(location)).await.unwrap();
    }
    let missing = GameId::parse("gid_2017_05_29_bosmlb_balmlb_1").unwrap();
    let missing = resolver.locate_game(&missing).unwrap();
    queue.transfer(TransferRequest::from(missing[0].clone())).await.unwrap();

    let summary = queue.done().await;
    assert_eq!(summary.requested, 5);
    assert_eq!(summary.succeeded, 4);
    assert_eq!(summary.failed, 1);
    assert!(summary.bytes > 0);

    let expected = std::fs::read(
        fixtures_dir().join("components/game/mlb/year_2017/month_05/day_29/gid_2017_05_29_anamlb_tormlb_1/game.xml"),
    )
    .unwrap();
    assert_eq!(std::fs::read(&files[0].local).unwrap(), expected);
    assert!(files[3].local.ends_with("inning/inning_hit.xml"));
    assert!(files[3].local.exists());
    assert!(!missing[0].local.exists());
}

#[tokio::test]
async fn queue_spaces_requests_by_interval() {
    let server = FixtureServer::start().await;
    let mirror = TempDir::new().unwrap();
    let resolver = ResourceResolver::new(&server.remote_root(), mirror.path()).unwrap();

    let interval = Duration::from_millis(100);
    let queue = TransferQueue::with_interval(interval);
    queue.use_client(http::build_client(Duration::from_secs(5)).unwrap()).unwrap();

    let started = Instant::now();
    let game = GameId::parse(FIXTURE_GAME).unwrap();
    for location in resolver.locate_game(&game).unwrap().into_iter().take(3) {
        queue.transfer(TransferRequest::from(location)).await.unwrap();
    }
    let summary = queue.done().await;

    assert_eq!(summary.succeeded, 3);
    assert!(started.elapsed() >= interval * 2);
}

#[tokio::test]
async fn queue_rejects_requests_after_done() {
    let queue = TransferQueue::with_interval(Duration::ZERO);
    queue.use_client(reqwest::Client::new()).unwrap();
    queue.done().await;

    let result = queue
        .transfer(TransferRequest::new("http://127.0.0.1:9/game.xml", "/tmp/game.xml"))
        .await;
    assert!(result.is_err());
}
