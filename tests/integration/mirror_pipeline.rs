//! Mirror pipeline end to end against the fixture server

use std::time::Duration;

use gameday_ingest::config::IngestConfig;
use gameday_ingest::pipeline::MirrorPipeline;
use gameday_ingest::stages::DateRequest;
use gameday_ingest::transfer::http;
use tempfile::TempDir;

use crate::support::{may_29, FixtureServer, FIXTURE_GAME};

#[tokio::test]
async fn mirror_fetches_listing_scoreboard_and_game_files() {
    let server = FixtureServer::start().await;
    let mirror = TempDir::new().unwrap();
    let config = IngestConfig::default()
        .with_remote_root(server.remote_root())
        .with_local_root(mirror.path())
        .with_politeness_interval(Duration::ZERO);

    let pipeline = MirrorPipeline::start(&config, http::build_client(Duration::from_secs(5)).unwrap()).unwrap();
    // the 30th has no directory on the server
    pipeline.submit(DateRequest::new("20170529", Some("20170530"))).await.unwrap();
    let summary = pipeline.shutdown().await;

    assert_eq!(summary.requested, 9);
    assert_eq!(summary.succeeded, 7);
    assert_eq!(summary.failed, 2);

    let day = mirror.path().join("year_2017/month_05/day_29");
    assert!(day.join("index.html").exists());
    assert!(day.join("master_scoreboard.xml").exists());
    for file in [
        "game.xml",
        "game_events.xml",
        "bis_boxscore.xml",
        "inning/inning_all.xml",
        "inning/inning_hit.xml",
    ] {
        assert!(day.join(FIXTURE_GAME).join(file).exists(), "missing {file}");
    }
    assert!(!mirror.path().join("year_2017/month_05/day_30").exists());
}

#[tokio::test]
async fn aborted_mirror_stops_early() {
    let server = FixtureServer::start().await;
    let mirror = TempDir::new().unwrap();
    let config = IngestConfig::default()
        .with_remote_root(server.remote_root())
        .with_local_root(mirror.path())
        .with_politeness_interval(Duration::from_secs(60));

    let pipeline = MirrorPipeline::start(&config, http::build_client(Duration::from_secs(5)).unwrap()).unwrap();
    pipeline.submit(DateRequest::day(may_29())).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    pipeline.abort();

    let summary = tokio::time::timeout(Duration::from_secs(5), pipeline.shutdown())
        .await
        .expect("abort should not wait out the politeness interval");
    assert!(summary.requested <= 1);
}
