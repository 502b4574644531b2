//! Configuration constants and run configuration

use std::path::PathBuf;
use std::time::Duration;

/// Root of the public gameday tree.
pub const DEFAULT_REMOTE_ROOT: &str = "http://gd2.mlb.com/components/game/mlb";

/// Default local mirror root.
pub const DEFAULT_LOCAL_ROOT: &str = "./gameday";

/// Minimum delay between consecutive transfer queue requests.
/// Three seconds keeps a full-season mirror well under any reasonable
/// per-host request budget.
pub const POLITENESS_INTERVAL: Duration = Duration::from_secs(3);

/// Transfer queue buffer; callers block once this many requests are pending.
pub const TRANSFER_QUEUE_CAPACITY: usize = 15;

/// Buffer of every channel between pipeline stages.
pub const STAGE_CHANNEL_CAPACITY: usize = 5;

/// HTTP connect timeout (seconds) - time to establish TCP connection
pub const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

/// HTTP request timeout (seconds) - overall time for the entire request
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Upper bound on the number of days a single range may expand to.
pub const MAX_RANGE_DAYS: i64 = 3660;

/// Flush interval for flat-file writers (flush every N lines)
pub const FLUSH_INTERVAL: u64 = 1_000;

/// Settings shared by the mirror and ingest drivers.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestConfig {
    /// Remote gameday root URL
    pub remote_root: String,
    /// Local mirror root
    pub local_root: PathBuf,
    /// Directory for `<Kind>.dat` files
    pub output_dir: PathBuf,
    /// Per-request HTTP timeout
    pub http_timeout: Duration,
    /// Delay between transfer queue requests
    pub politeness_interval: Duration,
    /// Capacity of every inter-stage channel
    pub channel_capacity: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            remote_root: DEFAULT_REMOTE_ROOT.to_string(),
            local_root: PathBuf::from(DEFAULT_LOCAL_ROOT),
            output_dir: PathBuf::from("."),
            http_timeout: Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS),
            politeness_interval: POLITENESS_INTERVAL,
            channel_capacity: STAGE_CHANNEL_CAPACITY,
        }
    }
}

impl IngestConfig {
    /// Set the remote root URL
    pub fn with_remote_root(mut self, remote_root: impl Into<String>) -> Self {
        self.remote_root = remote_root.into();
        self
    }

    /// Set the local mirror root
    pub fn with_local_root(mut self, local_root: impl Into<PathBuf>) -> Self {
        self.local_root = local_root.into();
        self
    }

    /// Set the flat-file output directory
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Set the per-request HTTP timeout
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Set the transfer queue politeness interval
    pub fn with_politeness_interval(mut self, interval: Duration) -> Self {
        self.politeness_interval = interval;
        self
    }

    /// Set the inter-stage channel capacity (minimum 1)
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }
}
