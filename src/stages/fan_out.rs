//! FanOut: copy every input to N outputs

use async_trait::async_trait;
use std::marker::PhantomData;
use tokio::sync::mpsc;
use tracing::warn;

use crate::pipeline::{Stage, StageError, StageScope};

const NAME: &str = "fan-out";

/// Broadcasts each input to every output, in order. A slow consumer delays
/// the others only through channel backpressure; a consumer that goes away
/// is dropped from the set and the rest keep receiving.
pub struct FanOut<T> {
    width: usize,
    outputs: Vec<mpsc::Sender<T>>,
    _item: PhantomData<fn(T)>,
}

impl<T> FanOut<T> {
    /// Fan out to `width` outputs
    pub fn new(width: usize) -> Self {
        Self {
            width,
            outputs: Vec::new(),
            _item: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Clone + Send + 'static> Stage for FanOut<T> {
    type Input = T;
    type Outputs = Vec<mpsc::Receiver<T>>;

    fn name(&self) -> &'static str {
        NAME
    }

    fn init(&mut self, capacity: usize) -> Self::Outputs {
        let (senders, receivers) = (0..self.width).map(|_| mpsc::channel(capacity)).unzip();
        self.outputs = senders;
        receivers
    }

    async fn process(&mut self, item: T, _scope: &StageScope) -> Result<(), StageError> {
        if self.outputs.is_empty() {
            return Err(StageError::DownstreamClosed(NAME));
        }

        let mut closed = Vec::new();
        for (i, output) in self.outputs.iter().enumerate() {
            if output.send(item.clone()).await.is_err() {
                closed.push(i);
            }
        }

        for i in closed.into_iter().rev() {
            warn!("Fan-out output {} closed, dropping it", i);
            self.outputs.remove(i);
        }
        Ok(())
    }
}
