//! HTTP transfer helpers and the rate-limited transfer queue
//!
//! - [`http`] - client construction, status-checked GETs and streaming bodies
//! - [`queue`] - [`TransferQueue`], a bounded single-worker downloader that
//!   waits a politeness interval between requests
//!
//! A failed transfer never stops a batch: the queue logs it, counts it in the
//! [`TransferSummary`] and moves on.

pub mod http;
pub mod queue;

pub use queue::TransferQueue;

use std::path::PathBuf;
use url::Url;

/// Transfer errors
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Request rejected before enqueue
    #[error("invalid transfer request: {0}")]
    InvalidRequest(String),

    /// `transfer` called before `use_client`
    #[error("transfer queue has no HTTP client")]
    NotConfigured,

    /// `use_client` called twice
    #[error("transfer queue already has an HTTP client")]
    AlreadyConfigured,

    /// `transfer` called after `done`
    #[error("transfer queue is closed")]
    Closed,

    /// Network failure
    #[error("network error fetching {url}: {source}")]
    Network {
        /// Requested URL
        url: String,
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP status
    #[error("HTTP {status} fetching {url}")]
    Status {
        /// Requested URL
        url: String,
        /// Response status
        status: reqwest::StatusCode,
    },

    /// Local write failure
    #[error("IO error writing {path}: {source}")]
    Io {
        /// Target path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },
}

/// One remote file to mirror locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Remote URL
    pub source: String,
    /// Local file path
    pub target: PathBuf,
}

impl TransferRequest {
    /// Create a request
    pub fn new(source: impl Into<String>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Validate request fields: a non-empty absolute http(s) source and a
    /// non-empty target.
    pub fn validate(&self) -> Result<Url, String> {
        if self.source.trim().is_empty() {
            return Err("source is empty".to_string());
        }
        if self.target.as_os_str().is_empty() {
            return Err(format!("target is empty for {}", self.source));
        }

        let url = Url::parse(&self.source).map_err(|e| format!("source {:?}: {}", self.source, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!("source {:?} is not http(s)", self.source));
        }
        Ok(url)
    }
}

impl From<crate::resolver::Location> for TransferRequest {
    fn from(location: crate::resolver::Location) -> Self {
        Self {
            source: location.remote.into(),
            target: location.local,
        }
    }
}

/// Outcome counts of one queue run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferSummary {
    /// Requests taken off the queue
    pub requested: u64,
    /// Files written
    pub succeeded: u64,
    /// Transfers that failed and were skipped
    pub failed: u64,
    /// Bytes written across all files
    pub bytes: u64,
}
