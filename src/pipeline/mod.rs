//! Stage framework and pipeline drivers
//!
//! A stage is a unit of work with typed input channels and typed output
//! channels. Every stage follows the same lifecycle:
//!
//! ```text
//! Created --init--> Initialized --start--> Running --stop--> Draining --> Stopped
//!                                              \--abort--> Aborted
//! ```
//!
//! - [`Stage::init`] creates the stage's bounded output channels and hands
//!   their receivers to the caller, which wires them into downstream stages.
//! - [`StageRunner::start`] spawns the run loop; each input item goes to
//!   [`Stage::process`], which may hand long-running work to
//!   [`StageScope::spawn`].
//! - [`StageHandle::stop`] closes the inputs, lets every buffered and in-flight
//!   item finish, calls [`Stage::finish`] and returns once the stage's outputs
//!   are closed.
//! - [`StageHandle::abort`] cancels everything without draining.
//!
//! Stopping the head of a pipeline closes its outputs, which ends the next
//! stage's inputs, and so on down the line.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::daterange::DateRangeError;
use crate::extract::DecodeError;
use crate::output::OutputError;
use crate::resolver::ResolveError;
use crate::store::ReconcileError;
use crate::transfer::TransferError;

pub mod ingest;
pub mod mirror;
pub mod runner;
pub mod sinks;

pub use ingest::IngestPipeline;
pub use mirror::MirrorPipeline;
pub use runner::{StageHandle, StageRunner, StageScope};
pub use sinks::{RecordPipeline, Sink};

/// Errors raised while processing one stage input.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// Malformed date request
    #[error(transparent)]
    DateRange(#[from] DateRangeError),

    /// Location mapping failure
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Fetch or download failure
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// Document extraction failure
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Store write failure
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// Output write failure
    #[error(transparent)]
    Output(#[from] OutputError),

    /// Every consumer of an output went away
    #[error("downstream of stage {0} is closed")]
    DownstreamClosed(&'static str),

    /// A record pipeline was wired without any sink
    #[error("record pipeline needs at least one sink")]
    NoSinks,

    /// A lifecycle method was called out of order
    #[error("stage {stage} cannot {action} while {state}")]
    Lifecycle {
        /// Stage name
        stage: &'static str,
        /// Attempted transition
        action: &'static str,
        /// Current state
        state: StageState,
    },
}

impl StageError {
    /// Whether the stage must abort rather than log and continue.
    ///
    /// Missing configuration, unwritable outputs and vanished consumers
    /// cannot get better by processing the next input.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            StageError::Resolve(ResolveError::NotConfigured)
                | StageError::Transfer(TransferError::NotConfigured)
                | StageError::Transfer(TransferError::Closed)
                | StageError::Output(_)
                | StageError::DownstreamClosed(_)
                | StageError::Lifecycle { .. }
        )
    }
}

/// Lifecycle state of a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StageState {
    /// Constructed, outputs not yet created
    Created = 0,
    /// Outputs created, inputs may be attached
    Initialized = 1,
    /// Run loop active
    Running = 2,
    /// Inputs closed, finishing buffered and in-flight work
    Draining = 3,
    /// Finished, outputs closed
    Stopped = 4,
    /// Cancelled without draining
    Aborted = 5,
}

impl StageState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => StageState::Created,
            1 => StageState::Initialized,
            2 => StageState::Running,
            3 => StageState::Draining,
            4 => StageState::Stopped,
            _ => StageState::Aborted,
        }
    }
}

impl std::fmt::Display for StageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StageState::Created => "created",
            StageState::Initialized => "initialized",
            StageState::Running => "running",
            StageState::Draining => "draining",
            StageState::Stopped => "stopped",
            StageState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Atomic cell shared by a runner, its run loop and its handle.
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new(state: StageState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub(crate) fn get(&self) -> StageState {
        StageState::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub(crate) fn set(&self, state: StageState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }
}

/// One pipeline stage.
///
/// Implementations keep their output senders as fields, created in
/// [`init`](Stage::init). The runner drops the stage after
/// [`finish`](Stage::finish), which closes those outputs.
#[async_trait]
pub trait Stage: Send + 'static {
    /// Item type of every input channel
    type Input: Send + 'static;

    /// Receivers handed out by [`init`](Stage::init)
    type Outputs: Send + 'static;

    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Create the output channels with the given capacity.
    fn init(&mut self, capacity: usize) -> Self::Outputs;

    /// Handle one input item.
    async fn process(&mut self, input: Self::Input, scope: &StageScope) -> Result<(), StageError>;

    /// Called once after every input has been processed and all in-flight
    /// work has completed.
    async fn finish(&mut self) -> Result<(), StageError> {
        Ok(())
    }
}

/// Send `item` downstream, mapping a closed channel to
/// [`StageError::DownstreamClosed`].
pub async fn send_downstream<T>(
    stage: &'static str,
    sender: &tokio::sync::mpsc::Sender<T>,
    item: T,
) -> Result<(), StageError> {
    sender
        .send(item)
        .await
        .map_err(|_| StageError::DownstreamClosed(stage))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_cell_round_trip() {
        let cell = StateCell::new(StageState::Created);
        for state in [
            StageState::Initialized,
            StageState::Running,
            StageState::Draining,
            StageState::Stopped,
            StageState::Aborted,
        ] {
            cell.set(state);
            assert_eq!(cell.get(), state);
        }
    }

    #[test]
    fn test_error_classification() {
        assert!(StageError::Resolve(ResolveError::NotConfigured).is_fatal());
        assert!(StageError::DownstreamClosed("fan-out").is_fatal());
        assert!(!StageError::Resolve(ResolveError::InvalidGameId("gid_x".to_string())).is_fatal());
        assert!(!StageError::Decode(DecodeError::Missing("game")).is_fatal());
        assert!(!StageError::DateRange(DateRangeError::Parse("bogus".to_string())).is_fatal());
    }
}
