//! `ingest` and `replay`: run records into screen, file or database outputs

use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{CliError, RangeArgs};
use crate::config::IngestConfig;
use crate::pipeline::{IngestPipeline, RecordPipeline, Sink, StageState};
use crate::shutdown::SharedShutdown;
use crate::store::postgres::DEFAULT_MAX_CONNECTIONS;
use crate::store::PgStore;
use crate::transfer::http;
use crate::PipelineRecord;

/// Output selection shared by `ingest` and `replay`. Screen output is used
/// when nothing is selected.
#[derive(clap::Args, Debug, Clone)]
pub struct SinkArgs {
    /// Print `<Kind>|<fields>` lines to stdout
    #[arg(long, default_value_t = false)]
    pub screen: bool,

    /// Append to one `<Kind>.dat` file per record kind
    #[arg(long, default_value_t = false)]
    pub file: bool,

    /// Directory for `--file` output
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Reconcile records into Postgres
    #[arg(long, default_value_t = false, requires = "database_url")]
    pub database: bool,

    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Maximum pooled database connections
    #[arg(long, default_value_t = DEFAULT_MAX_CONNECTIONS,
          value_parser = clap::value_parser!(u32).range(1..=64))]
    pub max_connections: u32,
}

impl SinkArgs {
    /// Whether no output was chosen explicitly
    pub fn is_default(&self) -> bool {
        !self.screen && !self.file && !self.database
    }

    /// `config` with the flat-file directory taken from `--output-dir`
    pub fn apply(&self, config: &IngestConfig) -> IngestConfig {
        config.clone().with_output_dir(&self.output_dir)
    }

    /// Open every selected sink. Flat files go to `config.output_dir`;
    /// database tables are created when missing.
    pub async fn open(&self, config: &IngestConfig) -> Result<Vec<Sink>, CliError> {
        let mut sinks = Vec::new();
        if self.screen || self.is_default() {
            sinks.push(Sink::Screen(Box::new(std::io::stdout())));
        }
        if self.file {
            sinks.push(Sink::File(config.output_dir.clone()));
        }
        if self.database {
            let url = self
                .database_url
                .as_deref()
                .ok_or_else(|| CliError::InvalidArgument("--database needs --database-url or DATABASE_URL".to_string()))?;
            let store = PgStore::connect(url, self.max_connections).await?;
            store.ensure_tables().await?;
            sinks.push(Sink::Database(Arc::new(store)));
        }
        Ok(sinks)
    }
}

/// Arguments for `ingest`
#[derive(Parser, Debug)]
pub struct IngestArgs {
    #[command(flatten)]
    pub range: RangeArgs,

    #[command(flatten)]
    pub sinks: SinkArgs,
}

impl IngestArgs {
    /// Extract every day of the range into the selected outputs.
    pub async fn execute(&self, config: &IngestConfig, shutdown: SharedShutdown) -> Result<(), CliError> {
        let config = self.sinks.apply(config);
        let client = http::build_client(config.http_timeout)?;
        let sinks = self.sinks.open(&config).await?;

        let pipeline = IngestPipeline::start(&config, client, sinks)?;
        shutdown.link(pipeline.abort_token());

        pipeline.submit(self.range.request()).await?;
        let states = pipeline.shutdown().await;
        check_states("ingest", &states, &shutdown)
    }
}

/// Arguments for `replay`
#[derive(Parser, Debug)]
pub struct ReplayArgs {
    /// JSON-lines file of records, or `-` for stdin
    pub input: PathBuf,

    #[command(flatten)]
    pub sinks: SinkArgs,
}

impl ReplayArgs {
    /// Feed every record of the input through the selected outputs.
    /// Returns the number of records accepted.
    pub async fn execute(&self, config: &IngestConfig, shutdown: SharedShutdown) -> Result<u64, CliError> {
        let config = self.sinks.apply(config);
        let sinks = self.sinks.open(&config).await?;
        let abort = CancellationToken::new();
        shutdown.link(abort.clone());

        let accepted = if self.input == Path::new("-") {
            replay(BufReader::new(tokio::io::stdin()), sinks, config.channel_capacity, &abort).await?
        } else {
            let file = tokio::fs::File::open(&self.input).await?;
            replay(BufReader::new(file), sinks, config.channel_capacity, &abort).await?
        };

        if shutdown.is_shutdown_requested() {
            return Err(CliError::Interrupted("replay".to_string()));
        }
        info!("Replayed {} record(s) from {}", accepted, self.input.display());
        Ok(accepted)
    }
}

/// Decode JSON lines from `input` into a [`RecordPipeline`] over `sinks`.
/// Undecodable or invalid lines are logged and skipped.
pub async fn replay<R>(
    input: R,
    sinks: Vec<Sink>,
    capacity: usize,
    abort: &CancellationToken,
) -> Result<u64, CliError>
where
    R: AsyncBufRead + Unpin,
{
    let (tx, rx) = mpsc::channel(capacity);
    let mut records = RecordPipeline::start(vec![rx], sinks, capacity, abort)?;

    let mut lines = input.lines();
    let mut line_no = 0u64;
    let mut accepted = 0u64;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if abort.is_cancelled() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let record = match PipelineRecord::from_json(line) {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping line {}: {}", line_no, e);
                continue;
            }
        };
        if let Err(reason) = record.validate() {
            warn!("Skipping line {}: invalid {}: {}", line_no, record.kind(), reason);
            continue;
        }
        if tx.send(record).await.is_err() {
            warn!("Record pipeline closed at line {}", line_no);
            break;
        }
        accepted += 1;
    }
    drop(tx);

    let states = records.wait().await;
    for (stage, state) in &states {
        debug!("Stage {} finished: {}", stage, state);
    }
    Ok(accepted)
}

fn check_states(
    run: &str,
    states: &[(&'static str, StageState)],
    shutdown: &SharedShutdown,
) -> Result<(), CliError> {
    for (stage, state) in states {
        debug!("Stage {} finished: {}", stage, state);
    }
    let aborted: Vec<&str> = states
        .iter()
        .filter(|(_, state)| *state == StageState::Aborted)
        .map(|(stage, _)| *stage)
        .collect();

    if shutdown.is_shutdown_requested() {
        return Err(CliError::Interrupted(run.to_string()));
    }
    if !aborted.is_empty() {
        return Err(CliError::Interrupted(format!("{run}: aborted stages {}", aborted.join(", "))));
    }
    info!("{} finished", run);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::store::MemoryStore;
    use crate::{NaturalKey, RecordKind};

    const TEAM: &str = r#"{"kind":"Team","effective_date":"2017-05-29T23:07:00Z","id":141,"name":"Toronto Blue Jays","code":"tor","city":"Toronto","league_id":103,"division":"E"}"#;

    #[test]
    fn test_default_sink_is_screen() {
        let cli = Cli::try_parse_from(["gameday-ingest", "ingest", "yesterday"]).unwrap();
        match cli.command {
            Commands::Ingest(args) => {
                assert!(args.sinks.is_default());
                assert_eq!(args.range.begin, "yesterday");
                assert_eq!(args.range.end, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_database_requires_url() {
        std::env::remove_var("DATABASE_URL");
        let result = Cli::try_parse_from(["gameday-ingest", "ingest", "--database", "20170529"]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_file_sink_follows_config() {
        let cli = Cli::try_parse_from(["gameday-ingest", "replay", "--file", "--output-dir", "/tmp/records", "-"]).unwrap();
        let base = cli.config();
        let Commands::Replay(args) = cli.command else {
            panic!("expected replay");
        };

        let config = args.sinks.apply(&base);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/records"));
        assert_eq!(config.remote_root, base.remote_root);

        // the sink directory comes from the config, not the raw argument
        let other = config.clone().with_output_dir("/srv/records");
        let sinks = args.sinks.open(&other).await.unwrap();
        assert_eq!(sinks.len(), 1);
        assert!(matches!(&sinks[0], Sink::File(dir) if dir == Path::new("/srv/records")));
    }

    #[tokio::test]
    async fn test_replay_skips_bad_lines() {
        let store = Arc::new(MemoryStore::new());
        let input = format!("{TEAM}\n\nnot json\n{}\n", TEAM.replace("\"id\":141", "\"id\":0"));
        let abort = CancellationToken::new();

        let accepted = replay(
            input.as_bytes(),
            vec![Sink::Database(store.clone())],
            4,
            &abort,
        )
        .await
        .unwrap();

        assert_eq!(accepted, 1);
        assert_eq!(store.len().await, 1);
        assert!(store.get(RecordKind::Team, &NaturalKey::Id(141)).await.is_some());
    }
}
