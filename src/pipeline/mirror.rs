//! Raw file mirroring driver
//!
//! ```text
//! DateRequest -> DateToPath -> FanOut --> TransferOutput (listing + scoreboard)
//!                                  \--> DayListing -> TransferOutput (game files)
//! ```
//!
//! Both transfer outputs share one [`TransferQueue`], so the whole run is
//! rate limited as a single stream of requests.

use reqwest::Client;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::sinks::start_stage;
use super::{StageError, StageHandle};
use crate::config::IngestConfig;
use crate::resolver::{GameId, ResourceResolver};
use crate::stages::{DateRequest, DateToPath, DayListing, DayLocation, FanOut, TransferOutput};
use crate::transfer::{TransferQueue, TransferSummary};

/// Running mirror pipeline.
pub struct MirrorPipeline {
    requests: Option<mpsc::Sender<DateRequest>>,
    abort: CancellationToken,
    stages: Vec<StageHandle>,
    queue: Arc<TransferQueue>,
}

impl MirrorPipeline {
    /// Wire and start every stage and the transfer queue.
    pub fn start(config: &IngestConfig, client: Client) -> Result<Self, StageError> {
        let resolver = Arc::new(ResourceResolver::new(&config.remote_root, &config.local_root)?);
        let capacity = config.channel_capacity;
        let abort = CancellationToken::new();

        let queue = Arc::new(
            TransferQueue::with_interval(config.politeness_interval).with_cancel(abort.child_token()),
        );
        queue.use_client(client.clone())?;

        let (requests, request_rx) = mpsc::channel(capacity);
        let (days, head) = start_stage(DateToPath::new(Arc::clone(&resolver)), vec![request_rx], capacity, &abort)?;

        let (mut copies, fan_out) = start_stage(FanOut::<DayLocation>::new(2), vec![days], capacity, &abort)?;
        let (for_listing, for_transfer) = match (copies.pop(), copies.pop()) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(StageError::DownstreamClosed("mirror")),
        };

        let day_files = TransferOutput::<DayLocation>::new(Arc::clone(&queue), Arc::clone(&resolver));
        let ((), day_files) = start_stage(day_files, vec![for_transfer], capacity, &abort)?;

        let (games, listing) = start_stage(DayListing::new(client), vec![for_listing], capacity, &abort)?;

        let game_files = TransferOutput::<GameId>::new(Arc::clone(&queue), resolver);
        let ((), game_files) = start_stage(game_files, vec![games], capacity, &abort)?;

        info!(
            "Mirror pipeline started: remote={}, local={}",
            config.remote_root,
            config.local_root.display()
        );
        Ok(Self {
            requests: Some(requests),
            abort,
            stages: vec![head, fan_out, day_files, listing, game_files],
            queue,
        })
    }

    /// Queue a date request.
    pub async fn submit(&self, request: DateRequest) -> Result<(), StageError> {
        let requests = self
            .requests
            .as_ref()
            .ok_or(StageError::DownstreamClosed("mirror"))?;
        requests
            .send(request)
            .await
            .map_err(|_| StageError::DownstreamClosed("mirror"))
    }

    /// Token that aborts every stage when cancelled
    pub fn abort_token(&self) -> CancellationToken {
        self.abort.clone()
    }

    /// Abort every stage and the transfer queue without draining.
    pub fn abort(&self) {
        self.abort.cancel();
    }

    /// Stop head-first, then wait for the transfer queue to drain.
    pub async fn shutdown(mut self) -> TransferSummary {
        self.requests.take();

        let mut stages = self.stages.drain(..);
        if let Some(mut head) = stages.next() {
            head.stop().await;
        }
        for mut stage in stages {
            stage.wait().await;
        }

        self.queue.done().await
    }
}
