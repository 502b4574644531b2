//! Bounded, rate-limited transfer queue
//!
//! One background worker drains the queue sequentially and sleeps a fixed
//! politeness interval between consecutive requests. The queue is a rate
//! limit, not a parallelism opportunity: run several queues if several hosts
//! must be mirrored at once.

use reqwest::Client;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

use super::{http, TransferError, TransferRequest, TransferSummary};
use crate::config::{POLITENESS_INTERVAL, TRANSFER_QUEUE_CAPACITY};

enum QueueState {
    Idle,
    Running {
        sender: mpsc::Sender<(TransferRequest, Url)>,
        worker: JoinHandle<TransferSummary>,
    },
    Done,
}

/// Single-worker downloader shared by reference (`Arc<TransferQueue>`).
///
/// ```no_run
/// # use gameday_ingest::transfer::{http, TransferQueue, TransferRequest};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let queue = TransferQueue::new();
/// queue.use_client(http::build_client(std::time::Duration::from_secs(30))?)?;
/// queue
///     .transfer(TransferRequest::new("http://gd2.mlb.com/components/game/mlb/", "./index.html"))
///     .await?;
/// let summary = queue.done().await;
/// println!("{} files", summary.succeeded);
/// # Ok(())
/// # }
/// ```
pub struct TransferQueue {
    interval: Duration,
    capacity: usize,
    cancel: CancellationToken,
    state: Mutex<QueueState>,
}

impl Default for TransferQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferQueue {
    /// Queue with the default politeness interval and capacity.
    pub fn new() -> Self {
        Self::with_interval(POLITENESS_INTERVAL)
    }

    /// Queue with a custom politeness interval.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            capacity: TRANSFER_QUEUE_CAPACITY,
            cancel: CancellationToken::new(),
            state: Mutex::new(QueueState::Idle),
        }
    }

    /// Stop the worker when `token` is cancelled. Queued requests are
    /// then discarded instead of downloaded.
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Politeness interval between requests
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Install the HTTP client and start the worker. Must be called exactly
    /// once, from within a Tokio runtime.
    pub fn use_client(&self, client: Client) -> Result<(), TransferError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match *state {
            QueueState::Idle => {}
            QueueState::Running { .. } => return Err(TransferError::AlreadyConfigured),
            QueueState::Done => return Err(TransferError::Closed),
        }

        let (sender, receiver) = mpsc::channel(self.capacity);
        let worker = tokio::spawn(run_worker(client, receiver, self.interval, self.cancel.clone()));
        *state = QueueState::Running { sender, worker };

        debug!(
            "Transfer queue started: capacity={}, interval={:?}",
            self.capacity, self.interval
        );
        Ok(())
    }

    /// Enqueue a request, waiting while the queue is full.
    ///
    /// Fails fast with [`TransferError::InvalidRequest`] on missing fields and
    /// with [`TransferError::NotConfigured`] before [`use_client`](Self::use_client).
    pub async fn transfer(&self, request: TransferRequest) -> Result<(), TransferError> {
        let url = request.validate().map_err(TransferError::InvalidRequest)?;

        let sender = {
            let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            match &*state {
                QueueState::Idle => return Err(TransferError::NotConfigured),
                QueueState::Running { sender, .. } => sender.clone(),
                QueueState::Done => return Err(TransferError::Closed),
            }
        };

        sender
            .send((request, url))
            .await
            .map_err(|_| TransferError::Closed)
    }

    /// Signal that no more requests will be submitted and wait for the queue
    /// to drain.
    pub async fn done(&self) -> TransferSummary {
        let previous = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::replace(&mut *state, QueueState::Done)
        };

        let QueueState::Running { sender, worker } = previous else {
            return TransferSummary::default();
        };
        drop(sender);

        match worker.await {
            Ok(summary) => {
                info!(
                    "Transfer queue drained: {} requested, {} succeeded, {} failed, {} bytes",
                    summary.requested, summary.succeeded, summary.failed, summary.bytes
                );
                summary
            }
            Err(e) => {
                error!("Transfer worker terminated abnormally: {}", e);
                TransferSummary::default()
            }
        }
    }
}

async fn run_worker(
    client: Client,
    mut receiver: mpsc::Receiver<(TransferRequest, Url)>,
    interval: Duration,
    cancel: CancellationToken,
) -> TransferSummary {
    let mut summary = TransferSummary::default();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            next = receiver.recv() => next,
        };
        let Some((request, url)) = next else { break };

        if summary.requested > 0 && !interval.is_zero() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }
        summary.requested += 1;

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = http::download(&client, &url, &request.target) => result,
        };
        match result {
            Ok(bytes) => {
                summary.succeeded += 1;
                summary.bytes += bytes;
                debug!("Transferred {} -> {} ({} bytes)", url, request.target.display(), bytes);
            }
            Err(e) => {
                summary.failed += 1;
                warn!("Transfer failed, continuing: {}", e);
            }
        }
    }

    if cancel.is_cancelled() {
        warn!("Transfer queue cancelled after {} request(s)", summary.requested);
    }
    summary
}
