//! Out-of-order and duplicate delivery through a record pipeline

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use gameday_ingest::pipeline::{RecordPipeline, Sink, StageState};
use gameday_ingest::store::MemoryStore;
use gameday_ingest::{GameStatusRecord, NaturalKey, PipelineRecord, RecordKind, VenueRecord};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2017, 5, day, hour, 0, 0).unwrap()
}

fn venue(effective_date: DateTime<Utc>, name: &str) -> PipelineRecord {
    PipelineRecord::Venue(VenueRecord {
        effective_date,
        id: 14,
        name: name.to_string(),
        location: "Toronto, ON".to_string(),
        channel: "CAXX0504".to_string(),
    })
}

fn status(effective_date: DateTime<Utc>, status: &str, inning: u32) -> PipelineRecord {
    PipelineRecord::GameStatus(GameStatusRecord {
        effective_date,
        id: 491105,
        status: status.to_string(),
        ind: "I".to_string(),
        reason: String::new(),
        current_inning: inning,
        top_of_inning: true,
        balls: 0,
        strikes: 0,
        outs: 0,
        inning_state: String::new(),
        note: String::new(),
        perfect_game: false,
        no_hitter: false,
        away_team_runs: 0,
        home_team_runs: 0,
        away_team_hits: 0,
        home_team_hits: 0,
        away_team_errors: 0,
        home_team_errors: 0,
        away_team_hr: 0,
        home_team_hr: 0,
        away_team_sb: 0,
        home_team_sb: 0,
        away_team_so: 0,
        home_team_so: 0,
    })
}

async fn deliver(store: &Arc<MemoryStore>, records: Vec<PipelineRecord>) {
    let (tx, rx) = mpsc::channel(4);
    let abort = CancellationToken::new();
    let mut pipeline = RecordPipeline::start(vec![rx], vec![Sink::Database(store.clone())], 4, &abort).unwrap();
    for record in records {
        tx.send(record).await.unwrap();
    }
    drop(tx);
    let states = pipeline.wait().await;
    assert!(states.iter().all(|(_, state)| *state == StageState::Stopped));
}

#[tokio::test]
async fn reference_kind_keeps_earliest_date_and_first_columns() {
    let store = Arc::new(MemoryStore::new());
    deliver(
        &store,
        vec![
            venue(at(29, 23), "Rogers Centre"),
            venue(at(30, 23), "Renamed Later"),
            venue(at(28, 23), "Renamed Earlier"),
        ],
    )
    .await;

    let Some(PipelineRecord::Venue(stored)) = store.get(RecordKind::Venue, &NaturalKey::Id(14)).await else {
        panic!("missing venue");
    };
    assert_eq!(stored.effective_date, at(28, 23));
    assert_eq!(stored.name, "Rogers Centre");
}

#[tokio::test]
async fn fact_kind_keeps_latest_snapshot() {
    let store = Arc::new(MemoryStore::new());
    deliver(
        &store,
        vec![
            status(at(29, 23), "In Progress", 3),
            status(at(30, 2), "Final", 9),
            status(at(30, 1), "In Progress", 8),
            status(at(30, 2), "Final", 9),
        ],
    )
    .await;

    let Some(PipelineRecord::GameStatus(stored)) =
        store.get(RecordKind::GameStatus, &NaturalKey::Id(491105)).await
    else {
        panic!("missing status");
    };
    assert_eq!(stored.status, "Final");
    assert_eq!(stored.current_inning, 9);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn invalid_records_are_dropped_not_fatal() {
    let store = Arc::new(MemoryStore::new());
    let mut bad = venue(at(29, 23), "Nowhere");
    if let PipelineRecord::Venue(v) = &mut bad {
        v.id = 0;
    }
    deliver(&store, vec![bad, venue(at(29, 23), "Rogers Centre")]).await;
    assert_eq!(store.len().await, 1);
}
