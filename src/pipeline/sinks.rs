//! Record sinks behind a fan-out

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{Stage, StageError, StageHandle, StageRunner, StageState};
use crate::stages::{DatabaseOutput, FanOut, FileOutput, ScreenOutput};
use crate::store::RecordStore;
use crate::PipelineRecord;

/// Where records end up.
pub enum Sink {
    /// `<Kind>|<fields>` lines on a writer
    Screen(Box<dyn Write + Send>),
    /// `<Kind>.dat` files in a directory
    File(PathBuf),
    /// Reconciled into a store
    Database(Arc<dyn RecordStore>),
}

impl std::fmt::Debug for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sink::Screen(_) => f.write_str("Screen"),
            Sink::File(dir) => f.debug_tuple("File").field(dir).finish(),
            Sink::Database(_) => f.write_str("Database"),
        }
    }
}

/// Init, wire and start a stage whose abort signal is a child of `abort`.
pub(crate) fn start_stage<S: Stage>(
    stage: S,
    inputs: Vec<mpsc::Receiver<S::Input>>,
    capacity: usize,
    abort: &CancellationToken,
) -> Result<(S::Outputs, StageHandle), StageError> {
    let mut runner = StageRunner::new(stage).with_abort(abort.child_token());
    let outputs = runner.init(capacity)?;
    for input in inputs {
        runner.add_input(input)?;
    }
    Ok((outputs, runner.start()?))
}

/// A [`FanOut`] of records feeding one stage per [`Sink`].
///
/// The fan-out ends when all of its inputs close; each sink then drains and
/// closes its files.
#[derive(Debug)]
pub struct RecordPipeline {
    fan_out: StageHandle,
    sinks: Vec<StageHandle>,
}

impl RecordPipeline {
    /// Wire `inputs` through a fan-out into `sinks`.
    pub fn start(
        inputs: Vec<mpsc::Receiver<PipelineRecord>>,
        sinks: Vec<Sink>,
        capacity: usize,
        abort: &CancellationToken,
    ) -> Result<Self, StageError> {
        if sinks.is_empty() {
            return Err(StageError::NoSinks);
        }

        // open files and connections before anything runs
        let mut prepared = Vec::with_capacity(sinks.len());
        for sink in sinks {
            prepared.push(match sink {
                Sink::Screen(out) => Prepared::Screen(ScreenOutput::new(out)),
                Sink::File(dir) => Prepared::File(FileOutput::create(dir)?),
                Sink::Database(store) => Prepared::Database(DatabaseOutput::new(store)),
            });
        }

        let (outputs, fan_out) = start_stage(FanOut::new(prepared.len()), inputs, capacity, abort)?;

        let mut handles = Vec::with_capacity(prepared.len());
        for (sink, output) in prepared.into_iter().zip(outputs) {
            let handle = match sink {
                Prepared::Screen(stage) => start_stage(stage, vec![output], capacity, abort)?.1,
                Prepared::File(stage) => start_stage(stage, vec![output], capacity, abort)?.1,
                Prepared::Database(stage) => start_stage(stage, vec![output], capacity, abort)?.1,
            };
            handles.push(handle);
        }

        Ok(Self {
            fan_out,
            sinks: handles,
        })
    }

    /// Wait for the fan-out and then every sink to finish.
    pub async fn wait(&mut self) -> Vec<(&'static str, StageState)> {
        let mut states = vec![(self.fan_out.name(), self.fan_out.wait().await)];
        for sink in &mut self.sinks {
            states.push((sink.name(), sink.wait().await));
        }
        states
    }
}

enum Prepared {
    Screen(ScreenOutput),
    File(FileOutput),
    Database(DatabaseOutput),
}
