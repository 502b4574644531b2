//! CLI command implementations

pub mod error;
pub mod ingest;
pub mod locate;
pub mod mirror;

use clap::builder::TypedValueParser;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{self, IngestConfig};

pub use error::CliError;
pub use ingest::{IngestArgs, ReplayArgs, SinkArgs};
pub use locate::LocateArgs;
pub use mirror::MirrorArgs;

/// Parse a non-negative number of seconds
fn parse_seconds(s: &str) -> Result<Duration, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number of seconds"))?;
    Duration::try_from_secs_f64(value).map_err(|e| format!("'{s}' is not a usable number of seconds: {e}"))
}

/// Gameday ingest CLI
#[derive(Parser, Debug)]
#[command(name = "gameday-ingest")]
#[command(about = "Mirror and ingest baseball gameday directory trees", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Remote gameday root URL
    #[arg(long, global = true, env = "GAMEDAY_REMOTE_ROOT", default_value = config::DEFAULT_REMOTE_ROOT)]
    pub remote_root: String,

    /// Local mirror root
    #[arg(long, global = true, default_value = config::DEFAULT_LOCAL_ROOT)]
    pub local_root: PathBuf,

    /// Per-request HTTP timeout in seconds
    #[arg(long, global = true, default_value = "30", value_parser = parse_seconds)]
    pub http_timeout: Duration,

    /// Delay between mirrored downloads in seconds
    #[arg(long, global = true, default_value = "3", value_parser = parse_seconds)]
    pub interval: Duration,

    /// Capacity of every channel between pipeline stages
    #[arg(long, global = true, default_value_t = config::STAGE_CHANNEL_CAPACITY,
          value_parser = clap::value_parser!(u16).range(1..=1024).map(usize::from))]
    pub channel_capacity: usize,
}

impl Cli {
    /// Run configuration from the global options
    pub fn config(&self) -> IngestConfig {
        IngestConfig::default()
            .with_remote_root(self.remote_root.clone())
            .with_local_root(self.local_root.clone())
            .with_http_timeout(self.http_timeout)
            .with_politeness_interval(self.interval)
            .with_channel_capacity(self.channel_capacity)
    }
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print remote and local locations for a date range
    Locate(LocateArgs),

    /// Download raw gameday files into the local mirror
    Mirror(MirrorArgs),

    /// Extract records from the remote tree into the chosen outputs
    Ingest(IngestArgs),

    /// Feed JSON-lines records into the chosen outputs
    Replay(ReplayArgs),
}

/// Date range shared by the range-driven commands
#[derive(clap::Args, Debug, Clone)]
pub struct RangeArgs {
    /// First date (YYYYMMDD) or a keyword such as `yesterday` or `lastweek`
    pub begin: String,

    /// Last date (YYYYMMDD), inclusive
    pub end: Option<String>,
}

impl RangeArgs {
    /// Pipeline request for this range
    pub fn request(&self) -> crate::stages::DateRequest {
        crate::stages::DateRequest::new(self.begin.clone(), self.end.as_deref())
    }
}
