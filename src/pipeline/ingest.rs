//! Record ingestion driver
//!
//! ```text
//! DateRequest -> DateToPath -> ScoreboardFile --records--> FanOut -> sinks
//!                                   \--game ids--> GameFile --/
//! ```

use chrono::NaiveDate;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{RecordPipeline, Sink, StageError, StageHandle, StageRunner, StageState};
use crate::config::IngestConfig;
use crate::resolver::ResourceResolver;
use crate::stages::{DateRequest, DateToPath, GameFileStage, ScoreboardFile};

/// Running ingestion pipeline.
#[derive(Debug)]
pub struct IngestPipeline {
    requests: Option<mpsc::Sender<DateRequest>>,
    abort: CancellationToken,
    stages: Vec<StageHandle>,
    records: RecordPipeline,
}

impl IngestPipeline {
    /// Wire and start every stage. Keywords resolve against the current date.
    pub fn start(config: &IngestConfig, client: Client, sinks: Vec<Sink>) -> Result<Self, StageError> {
        Self::start_at(config, client, sinks, None)
    }

    /// Like [`start`](Self::start), resolving keywords against `today` when
    /// given.
    pub fn start_at(
        config: &IngestConfig,
        client: Client,
        sinks: Vec<Sink>,
        today: Option<NaiveDate>,
    ) -> Result<Self, StageError> {
        if sinks.is_empty() {
            return Err(StageError::NoSinks);
        }
        let resolver = Arc::new(ResourceResolver::new(&config.remote_root, &config.local_root)?);
        let capacity = config.channel_capacity;
        let abort = CancellationToken::new();

        let (requests, request_rx) = mpsc::channel(capacity);

        let mut date_to_path = DateToPath::new(Arc::clone(&resolver));
        if let Some(today) = today {
            date_to_path = date_to_path.with_today(today);
        }
        let mut head = StageRunner::new(date_to_path).with_abort(abort.child_token());
        let days = head.init(capacity)?;

        let scoreboard = ScoreboardFile::new(client.clone(), Arc::clone(&resolver));
        let mut scoreboard = StageRunner::new(scoreboard).with_abort(abort.child_token());
        let (scoreboard_records, game_ids) = scoreboard.init(capacity)?;

        let mut game_file = StageRunner::new(GameFileStage::new(client, resolver)).with_abort(abort.child_token());
        let game_records = game_file.init(capacity)?;

        // sinks open before any stage runs; a sink that cannot open leaves
        // nothing behind
        let records = RecordPipeline::start(vec![scoreboard_records, game_records], sinks, capacity, &abort)?;

        game_file.add_input(game_ids)?;
        let game_file = game_file.start()?;
        scoreboard.add_input(days)?;
        let scoreboard = scoreboard.start()?;
        head.add_input(request_rx)?;
        let head = head.start()?;

        info!("Ingest pipeline started: remote={}", config.remote_root);
        Ok(Self {
            requests: Some(requests),
            abort,
            stages: vec![head, scoreboard, game_file],
            records,
        })
    }

    /// Queue a date request.
    pub async fn submit(&self, request: DateRequest) -> Result<(), StageError> {
        let requests = self
            .requests
            .as_ref()
            .ok_or(StageError::DownstreamClosed("ingest"))?;
        requests
            .send(request)
            .await
            .map_err(|_| StageError::DownstreamClosed("ingest"))
    }

    /// Token that aborts every stage when cancelled
    pub fn abort_token(&self) -> CancellationToken {
        self.abort.clone()
    }

    /// Abort every stage without draining.
    pub fn abort(&self) {
        self.abort.cancel();
    }

    /// Stop head-first: no new requests are accepted, every submitted date is
    /// processed to the sinks, and all files are closed.
    pub async fn shutdown(mut self) -> Vec<(&'static str, StageState)> {
        self.requests.take();

        let mut states = Vec::new();
        let mut stages = self.stages.drain(..);
        if let Some(mut head) = stages.next() {
            states.push((head.name(), head.stop().await));
        }
        for mut stage in stages {
            states.push((stage.name(), stage.wait().await));
        }
        states.extend(self.records.wait().await);

        info!("Ingest pipeline finished");
        states
    }
}
