//! DatabaseOutput: records reconciled into a store

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::pipeline::{Stage, StageError, StageScope};
use crate::store::{ReconcileStats, RecordStore};
use crate::PipelineRecord;

const NAME: &str = "database-output";

/// Reconciles records one at a time, in arrival order. A failed record is
/// logged and dropped; there is no retry.
pub struct DatabaseOutput {
    store: Arc<dyn RecordStore>,
    stats: ReconcileStats,
}

impl DatabaseOutput {
    /// Stage writing into `store`
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            stats: ReconcileStats::default(),
        }
    }
}

#[async_trait]
impl Stage for DatabaseOutput {
    type Input = PipelineRecord;
    type Outputs = ();

    fn name(&self) -> &'static str {
        NAME
    }

    fn init(&mut self, _capacity: usize) -> Self::Outputs {}

    async fn process(&mut self, record: PipelineRecord, _scope: &StageScope) -> Result<(), StageError> {
        let result = self.store.reconcile(&record).await;
        self.stats.record(&result);

        match result {
            Ok(outcome) => {
                debug!("{} {:?}: {:?}", record.kind(), record.natural_key(), outcome);
                Ok(())
            }
            Err(e) => {
                warn!("Dropping {} {:?}: {}", record.kind(), record.natural_key(), e);
                Ok(())
            }
        }
    }

    async fn finish(&mut self) -> Result<(), StageError> {
        let s = self.stats;
        info!(
            "Reconciled records: {} inserted, {} updated, {} kept, {} failed",
            s.inserted, s.updated, s.kept, s.failed
        );
        Ok(())
    }
}
