//! CLI error types and conversions

use crate::daterange::DateRangeError;
use crate::output::OutputError;
use crate::pipeline::StageError;
use crate::resolver::ResolveError;
use crate::store::ReconcileError;
use crate::transfer::TransferError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Bad date or keyword
    #[error("date range error: {0}")]
    DateRangeError(#[from] DateRangeError),

    /// Resolver misconfiguration
    #[error("resolve error: {0}")]
    ResolveError(#[from] ResolveError),

    /// Pipeline wiring or run failure
    #[error("pipeline error: {0}")]
    StageError(#[from] StageError),

    /// Transfer queue failure
    #[error("transfer error: {0}")]
    TransferError(#[from] TransferError),

    /// Store connection or schema failure
    #[error("store error: {0}")]
    ReconcileError(#[from] ReconcileError),

    /// Output file failure
    #[error("output error: {0}")]
    OutputError(#[from] OutputError),

    /// HTTP client construction failure
    #[error("http client error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Reading replay input
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The run was interrupted before it finished
    #[error("interrupted: {0}")]
    Interrupted(String),
}
