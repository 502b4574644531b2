//! `mirror`: download raw files into the local tree

use clap::Parser;
use tracing::{info, warn};

use super::{CliError, RangeArgs};
use crate::config::IngestConfig;
use crate::pipeline::MirrorPipeline;
use crate::shutdown::SharedShutdown;
use crate::transfer::{http, TransferSummary};

/// Arguments for `mirror`
#[derive(Parser, Debug)]
pub struct MirrorArgs {
    #[command(flatten)]
    pub range: RangeArgs,
}

impl MirrorArgs {
    /// Mirror every day of the range. Fails if Ctrl+C cut the run short.
    pub async fn execute(&self, config: &IngestConfig, shutdown: SharedShutdown) -> Result<TransferSummary, CliError> {
        let client = http::build_client(config.http_timeout)?;
        let pipeline = MirrorPipeline::start(config, client)?;
        shutdown.link(pipeline.abort_token());

        pipeline.submit(self.range.request()).await?;
        let summary = pipeline.shutdown().await;

        info!(
            "Mirror finished: {} requested, {} succeeded, {} failed",
            summary.requested, summary.succeeded, summary.failed
        );
        if shutdown.is_shutdown_requested() {
            warn!("Mirror interrupted, local tree may be incomplete");
            return Err(CliError::Interrupted("mirror".to_string()));
        }
        Ok(summary)
    }
}
