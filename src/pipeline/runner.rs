//! Stage run loop, scope and handle

use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use super::{Stage, StageError, StageState, StateCell};
use crate::config::STAGE_CHANNEL_CAPACITY;

/// Report a processing error: fatal errors abort the stage, everything else
/// is logged and skipped.
fn report(stage: &'static str, error: &StageError, abort: &CancellationToken) {
    if error.is_fatal() {
        error!("Stage {} failed, aborting: {}", stage, error);
        abort.cancel();
    } else {
        warn!("Stage {} skipped input: {}", stage, error);
    }
}

/// Work scope handed to [`Stage::process`].
///
/// Work spawned here is tracked until it completes; the stage does not
/// finish while any of it is outstanding.
#[derive(Debug, Clone)]
pub struct StageScope {
    stage: &'static str,
    work: TaskTracker,
    abort: CancellationToken,
}

impl StageScope {
    /// Run `work` concurrently with the run loop. The task is dropped if
    /// the stage is aborted first.
    pub fn spawn<F>(&self, work: F)
    where
        F: Future<Output = Result<(), StageError>> + Send + 'static,
    {
        let stage = self.stage;
        let abort = self.abort.clone();
        self.work.spawn(async move {
            tokio::select! {
                biased;
                _ = abort.cancelled() => debug!("Stage {} dropped in-flight work on abort", stage),
                result = work => {
                    if let Err(e) = result {
                        report(stage, &e, &abort);
                    }
                }
            }
        });
    }
}

/// Builder that owns a stage until it is started.
pub struct StageRunner<S: Stage> {
    stage: S,
    inputs: Vec<mpsc::Receiver<S::Input>>,
    state: Arc<StateCell>,
    abort: CancellationToken,
}

impl<S: Stage> StageRunner<S> {
    /// Wrap a stage
    pub fn new(stage: S) -> Self {
        Self {
            stage,
            inputs: Vec::new(),
            state: Arc::new(StateCell::new(StageState::Created)),
            abort: CancellationToken::new(),
        }
    }

    /// Use `token` (typically a child of a pipeline-wide token) as the abort
    /// signal.
    pub fn with_abort(mut self, token: CancellationToken) -> Self {
        self.abort = token;
        self
    }

    /// Stage name
    pub fn name(&self) -> &'static str {
        self.stage.name()
    }

    /// Current state
    pub fn state(&self) -> StageState {
        self.state.get()
    }

    /// Create the stage's outputs.
    pub fn init(&mut self, capacity: usize) -> Result<S::Outputs, StageError> {
        self.expect(StageState::Created, "init")?;
        let outputs = self.stage.init(capacity.max(1));
        self.state.set(StageState::Initialized);
        Ok(outputs)
    }

    /// Create the stage's outputs with the default capacity.
    pub fn init_default(&mut self) -> Result<S::Outputs, StageError> {
        self.init(STAGE_CHANNEL_CAPACITY)
    }

    /// Attach an input channel, typically an upstream stage's output.
    pub fn add_input(&mut self, input: mpsc::Receiver<S::Input>) -> Result<(), StageError> {
        self.expect(StageState::Initialized, "add an input")?;
        self.inputs.push(input);
        Ok(())
    }

    /// Spawn the run loop.
    ///
    /// The loop ends when every input has closed and been drained, when
    /// [`StageHandle::stop`] is called, or on abort.
    pub fn start(self) -> Result<StageHandle, StageError> {
        self.expect(StageState::Initialized, "start")?;

        let name = self.stage.name();
        let closing = CancellationToken::new();
        let scope = StageScope {
            stage: name,
            work: TaskTracker::new(),
            abort: self.abort.clone(),
        };

        self.state.set(StageState::Running);
        info!("Stage {} started with {} input(s)", name, self.inputs.len());

        let join = tokio::spawn(run_loop(
            self.stage,
            self.inputs,
            scope.clone(),
            closing.clone(),
            Arc::clone(&self.state),
        ));

        Ok(StageHandle {
            name,
            state: self.state,
            closing,
            abort: self.abort,
            work: scope.work,
            join: Some(join),
        })
    }

    fn expect(&self, expected: StageState, action: &'static str) -> Result<(), StageError> {
        let state = self.state.get();
        if state != expected {
            return Err(StageError::Lifecycle {
                stage: self.stage.name(),
                action,
                state,
            });
        }
        Ok(())
    }
}

async fn run_loop<S: Stage>(
    mut stage: S,
    inputs: Vec<mpsc::Receiver<S::Input>>,
    scope: StageScope,
    closing: CancellationToken,
    state: Arc<StateCell>,
) {
    let name = stage.name();
    let abort = scope.abort.clone();

    // each input stays in the set until its own channel is closed and empty
    let mut merged = stream::select_all(inputs.into_iter().map(ReceiverStream::new));
    let mut draining = false;
    let mut processed = 0u64;

    loop {
        tokio::select! {
            biased;
            _ = abort.cancelled() => break,
            _ = closing.cancelled(), if !draining => {
                draining = true;
                state.set(StageState::Draining);
                for input in merged.iter_mut() {
                    input.close();
                }
                debug!("Stage {} draining", name);
            }
            next = merged.next() => {
                let Some(input) = next else { break };
                processed += 1;
                let result = tokio::select! {
                    biased;
                    _ = abort.cancelled() => break,
                    result = stage.process(input, &scope) => result,
                };
                if let Err(e) = result {
                    report(name, &e, &abort);
                }
            }
        }
    }

    if !draining && !abort.is_cancelled() {
        state.set(StageState::Draining);
    }

    scope.work.close();
    scope.work.wait().await;

    if let Err(e) = stage.finish().await {
        error!("Stage {} failed to finish: {}", name, e);
    }
    drop(stage);

    if abort.is_cancelled() {
        state.set(StageState::Aborted);
        warn!("Stage {} aborted after {} input(s)", name, processed);
    } else {
        state.set(StageState::Stopped);
        info!("Stage {} stopped after {} input(s)", name, processed);
    }
}

/// Control handle of a running stage.
#[derive(Debug)]
pub struct StageHandle {
    name: &'static str,
    state: Arc<StateCell>,
    closing: CancellationToken,
    abort: CancellationToken,
    work: TaskTracker,
    join: Option<JoinHandle<()>>,
}

impl StageHandle {
    /// Stage name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Current state
    pub fn state(&self) -> StageState {
        self.state.get()
    }

    /// Number of in-flight work items
    pub fn in_flight(&self) -> usize {
        self.work.len()
    }

    /// Close the inputs, process what is buffered, wait for in-flight work
    /// and close the outputs. Returns once the stage is stopped.
    pub async fn stop(&mut self) -> StageState {
        self.closing.cancel();
        self.wait().await
    }

    /// Wait for the stage to end on its own (all inputs closed upstream).
    pub async fn wait(&mut self) -> StageState {
        if let Some(join) = self.join.take() {
            if let Err(e) = join.await {
                error!("Stage {} run loop terminated abnormally: {}", self.name, e);
                self.state.set(StageState::Aborted);
            }
        }
        self.state.get()
    }

    /// Cancel the stage without draining. Use [`wait`](Self::wait) to
    /// observe completion.
    pub fn abort(&self) {
        self.abort.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Doubles every input after a short delay, concurrently.
    struct Doubler {
        output: Option<mpsc::Sender<u64>>,
    }

    #[async_trait]
    impl Stage for Doubler {
        type Input = u64;
        type Outputs = mpsc::Receiver<u64>;

        fn name(&self) -> &'static str {
            "doubler"
        }

        fn init(&mut self, capacity: usize) -> Self::Outputs {
            let (tx, rx) = mpsc::channel(capacity);
            self.output = Some(tx);
            rx
        }

        async fn process(&mut self, input: u64, scope: &StageScope) -> Result<(), StageError> {
            let output = self.output.clone().ok_or(StageError::DownstreamClosed("doubler"))?;
            scope.spawn(async move {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                crate::pipeline::send_downstream("doubler", &output, input * 2).await
            });
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_lifecycle_order_enforced() {
        let mut runner = StageRunner::new(Doubler { output: None });
        let (_tx, rx) = mpsc::channel(1);
        assert!(matches!(runner.add_input(rx), Err(StageError::Lifecycle { .. })));

        let _out = runner.init(1).unwrap();
        assert!(matches!(runner.init(1), Err(StageError::Lifecycle { .. })));
        assert_eq!(runner.state(), StageState::Initialized);
    }

    #[tokio::test]
    async fn test_stop_drains_in_flight_work() {
        let mut runner = StageRunner::new(Doubler { output: None });
        let mut output = runner.init(64).unwrap();
        let (tx, rx) = mpsc::channel(64);
        runner.add_input(rx).unwrap();
        let mut handle = runner.start().unwrap();

        for i in 0..20 {
            tx.send(i).await.unwrap();
        }

        assert_eq!(handle.stop().await, StageState::Stopped);
        assert_eq!(handle.in_flight(), 0);

        let mut seen = Vec::new();
        while let Some(v) = output.recv().await {
            seen.push(v);
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..20).map(|i| i * 2).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_ends_when_inputs_close() {
        let mut runner = StageRunner::new(Doubler { output: None });
        let mut output = runner.init(4).unwrap();
        let (tx, rx) = mpsc::channel(4);
        runner.add_input(rx).unwrap();
        let mut handle = runner.start().unwrap();

        tx.send(21).await.unwrap();
        drop(tx);

        assert_eq!(output.recv().await, Some(42));
        assert_eq!(output.recv().await, None);
        assert_eq!(handle.wait().await, StageState::Stopped);
    }

    #[tokio::test]
    async fn test_abort_skips_draining() {
        let mut runner = StageRunner::new(Doubler { output: None });
        let mut output = runner.init(4).unwrap();
        let (tx, rx) = mpsc::channel(4);
        runner.add_input(rx).unwrap();
        let mut handle = runner.start().unwrap();

        handle.abort();
        assert_eq!(handle.wait().await, StageState::Aborted);
        assert_eq!(output.recv().await, None);
        assert!(tx.send(1).await.is_err());
    }
}
