//! Command-line parsing

use clap::Parser;
use gameday_ingest::cli::{Cli, Commands};
use gameday_ingest::config::{DEFAULT_LOCAL_ROOT, POLITENESS_INTERVAL};
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn test_mirror_defaults() {
    let cli = Cli::try_parse_from(["gameday-ingest", "mirror", "20170529", "20170531"]).unwrap();
    let config = cli.config();
    assert_eq!(config.local_root, PathBuf::from(DEFAULT_LOCAL_ROOT));
    assert_eq!(config.politeness_interval, POLITENESS_INTERVAL);
    assert_eq!(config.http_timeout, Duration::from_secs(30));

    let Commands::Mirror(args) = cli.command else {
        panic!("expected mirror");
    };
    assert_eq!(args.range.begin, "20170529");
    assert_eq!(args.range.end.as_deref(), Some("20170531"));
}

#[test]
fn test_global_options_after_subcommand() {
    let cli = Cli::try_parse_from([
        "gameday-ingest",
        "ingest",
        "lastweek",
        "--local-root",
        "/srv/mirror",
        "--http-timeout",
        "5",
        "--file",
        "--output-dir",
        "/tmp/out",
    ])
    .unwrap();
    let config = cli.config();
    assert_eq!(config.local_root, PathBuf::from("/srv/mirror"));
    assert_eq!(config.http_timeout, Duration::from_secs(5));

    let Commands::Ingest(args) = cli.command else {
        panic!("expected ingest");
    };
    assert!(args.sinks.file);
    assert!(!args.sinks.screen);
    assert!(!args.sinks.is_default());
    assert_eq!(args.sinks.output_dir, PathBuf::from("/tmp/out"));
}

#[test]
fn test_database_url_flag() {
    let cli = Cli::try_parse_from([
        "gameday-ingest",
        "replay",
        "records.jsonl",
        "--database",
        "--database-url",
        "postgres://localhost/gameday",
        "--max-connections",
        "2",
    ])
    .unwrap();
    let Commands::Replay(args) = cli.command else {
        panic!("expected replay");
    };
    assert_eq!(args.input, PathBuf::from("records.jsonl"));
    assert!(args.sinks.database);
    assert_eq!(args.sinks.database_url.as_deref(), Some("postgres://localhost/gameday"));
    assert_eq!(args.sinks.max_connections, 2);
}

#[test]
fn test_rejects_bad_input() {
    assert!(Cli::try_parse_from(["gameday-ingest"]).is_err());
    assert!(Cli::try_parse_from(["gameday-ingest", "locate"]).is_err());
    assert!(Cli::try_parse_from(["gameday-ingest", "--channel-capacity", "0", "locate", "today"]).is_err());
    assert!(Cli::try_parse_from(["gameday-ingest", "--http-timeout", "soon", "locate", "today"]).is_err());
    assert!(Cli::try_parse_from(["gameday-ingest", "replay", "-", "--max-connections", "0"]).is_err());
}
