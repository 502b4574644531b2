//! Ingest pipeline end to end against the fixture server

use std::sync::Arc;
use std::time::Duration;

use gameday_ingest::config::IngestConfig;
use gameday_ingest::pipeline::{IngestPipeline, Sink, StageState};
use gameday_ingest::stages::DateRequest;
use gameday_ingest::store::MemoryStore;
use gameday_ingest::transfer::http;
use gameday_ingest::{NaturalKey, PipelineRecord, RecordKind};
use tempfile::TempDir;

use crate::support::{may_29, FixtureServer};

fn line_count(path: &std::path::Path) -> usize {
    std::fs::read_to_string(path).unwrap().lines().count()
}

async fn ingest_day(config: &IngestConfig, sinks: Vec<Sink>) -> Vec<(&'static str, StageState)> {
    let client = http::build_client(Duration::from_secs(5)).unwrap();
    let pipeline = IngestPipeline::start_at(config, client, sinks, Some(may_29())).unwrap();
    pipeline.submit(DateRequest::new("today", None)).await.unwrap();
    pipeline.shutdown().await
}

#[tokio::test]
async fn ingest_day_into_store_and_files() {
    let server = FixtureServer::start().await;
    let out = TempDir::new().unwrap();
    let config = IngestConfig::default()
        .with_remote_root(server.remote_root())
        .with_output_dir(out.path());
    let store = Arc::new(MemoryStore::new());

    let states = ingest_day(
        &config,
        vec![Sink::Database(store.clone()), Sink::File(out.path().to_path_buf())],
    )
    .await;
    assert!(states.iter().all(|(_, state)| *state == StageState::Stopped), "{states:?}");

    // scoreboard and game.xml both describe the venue and the two teams
    assert_eq!(store.count(RecordKind::Venue).await, 1);
    assert_eq!(store.count(RecordKind::League).await, 1);
    assert_eq!(store.count(RecordKind::Division).await, 2);
    assert_eq!(store.count(RecordKind::Team).await, 2);
    assert_eq!(store.count(RecordKind::Standing).await, 2);
    assert_eq!(store.count(RecordKind::Game).await, 1);
    assert_eq!(store.count(RecordKind::GameStatus).await, 1);
    assert_eq!(store.count(RecordKind::InningScore).await, 9);

    let Some(PipelineRecord::GameStatus(status)) =
        store.get(RecordKind::GameStatus, &NaturalKey::Id(491105)).await
    else {
        panic!("missing game status");
    };
    assert_eq!(status.status, "Final");
    assert_eq!((status.away_team_runs, status.home_team_runs), (3, 5));

    assert_eq!(line_count(&out.path().join("Venue.dat")), 2);
    assert_eq!(line_count(&out.path().join("Team.dat")), 4);
    assert_eq!(line_count(&out.path().join("InningScore.dat")), 9);
    assert_eq!(line_count(&out.path().join("Game.dat")), 1);
}

#[tokio::test]
async fn reingesting_a_day_is_idempotent() {
    let server = FixtureServer::start().await;
    let config = IngestConfig::default().with_remote_root(server.remote_root());
    let store = Arc::new(MemoryStore::new());

    ingest_day(&config, vec![Sink::Database(store.clone())]).await;
    let first = store.len().await;
    let team = store.get(RecordKind::Team, &NaturalKey::Id(141)).await;

    ingest_day(&config, vec![Sink::Database(store.clone())]).await;
    assert_eq!(store.len().await, first);
    assert_eq!(store.get(RecordKind::Team, &NaturalKey::Id(141)).await, team);
}

#[tokio::test]
async fn day_without_data_produces_nothing() {
    let server = FixtureServer::start().await;
    let config = IngestConfig::default().with_remote_root(server.remote_root());
    let store = Arc::new(MemoryStore::new());

    let client = http::build_client(Duration::from_secs(5)).unwrap();
    let pipeline = IngestPipeline::start(&config, client, vec![Sink::Database(store.clone())]).unwrap();
    pipeline.submit(DateRequest::new("20170530", None)).await.unwrap();
    let states = pipeline.shutdown().await;

    assert!(states.iter().all(|(_, state)| *state == StageState::Stopped));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn pipeline_needs_a_sink() {
    let config = IngestConfig::default();
    let client = http::build_client(Duration::from_secs(5)).unwrap();
    assert!(IngestPipeline::start(&config, client, Vec::new()).is_err());
}

#[tokio::test]
async fn missing_scoreboard_day_is_skipped() {
    let server = FixtureServer::start().await;
    let config = IngestConfig::default().with_remote_root(server.remote_root());
    let store = Arc::new(MemoryStore::new());

    // the fixture tree has no day_30, so its scoreboard is a 404
    let client = http::build_client(Duration::from_secs(5)).unwrap();
    let pipeline = IngestPipeline::start(&config, client, vec![Sink::Database(store.clone())]).unwrap();
    pipeline.submit(DateRequest::new("20170529", Some("20170530"))).await.unwrap();
    let states = pipeline.shutdown().await;

    assert!(states.iter().all(|(_, state)| *state == StageState::Stopped), "{states:?}");
    assert_eq!(store.count(RecordKind::Venue).await, 1);
    assert_eq!(store.count(RecordKind::Team).await, 2);
    assert_eq!(store.count(RecordKind::Standing).await, 2);
    assert_eq!(store.count(RecordKind::Game).await, 1);
    assert_eq!(store.count(RecordKind::GameStatus).await, 1);
    assert_eq!(store.count(RecordKind::InningScore).await, 9);
}

#[tokio::test]
async fn unopenable_file_sink_fails_before_start() {
    let blocker = tempfile::NamedTempFile::new().unwrap();
    let config = IngestConfig::default();
    let client = http::build_client(Duration::from_secs(5)).unwrap();

    // a directory cannot be created beneath a regular file
    let result = IngestPipeline::start(&config, client, vec![Sink::File(blocker.path().join("records"))]);
    assert!(result.is_err());
}
