//! Main entry point for the gameday-ingest CLI

use clap::Parser;
use gameday_ingest::cli::{Cli, Commands};
use gameday_ingest::shutdown::ShutdownCoordinator;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber with optional JSON formatting
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gameday_ingest=info"));

    // stdout carries screen output, so logs go to stderr
    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    let config = cli.config();

    let shutdown = ShutdownCoordinator::shared();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Ctrl+C received - aborting");
                shutdown.request_shutdown();
            }
        }
    });

    let result = match cli.command {
        Commands::Locate(ref args) => args.execute(&config).map_err(|e| anyhow::anyhow!(e)),
        Commands::Mirror(ref args) => args
            .execute(&config, shutdown.clone())
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!(e)),
        Commands::Ingest(ref args) => args
            .execute(&config, shutdown.clone())
            .await
            .map_err(|e| anyhow::anyhow!(e)),
        Commands::Replay(ref args) => args
            .execute(&config, shutdown.clone())
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!(e)),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }
}
